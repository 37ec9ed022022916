use crate::utils::error::AppError;
use mongodb::{Client, Collection, Database};

pub const USERS_COLLECTION: &str = "users";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        let db_name = database_name_from_uri(uri);
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<mongodb::bson::Document>(USERS_COLLECTION);

        // users(email) único - signup e lookup por email
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // users(role, developerStack.technologies) - busca de matches
        let match_index = IndexModel::builder()
            .keys(doc! { "role": 1, "developerStack.technologies": 1 })
            .build();

        match users.create_index(match_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(role, developerStack.technologies)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn health_check(&self) -> bool {
        self.db.list_collection_names().await.is_ok()
    }
}

/// Nome do banco vem do path da URI (`mongodb://host/<db>?opts`)
fn database_name_from_uri(uri: &str) -> String {
    let after_scheme = uri.split("://").nth(1).unwrap_or(uri);
    after_scheme
        .split_once('/')
        .map(|(_, rest)| rest.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("creators_meet")
        .to_string()
}
