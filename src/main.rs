mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use services::analyzer_service::ProjectAnalyzer;
use services::classifier_service::{Classifier, HuggingFaceClassifier};
use services::user_repository::{MongoUserRepository, UserRepository};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    log::error!("❌ {}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    log::info!("🚀 Starting Creators Meet...");
    log::info!("🤖 Classifier: {} (on failure: {:?})", config.classifier.endpoint(), config.classifier.on_failure);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to MongoDB", e))?;

    log::info!("✅ MongoDB connected successfully");

    let catalog = models::Catalog::load(config.catalog_path.as_deref())
        .map_err(|e| startup_error("Failed to load catalog", e))?;
    log::info!(
        "📚 Catalog: {} technologies, {} complexity levels, {} expertise areas",
        catalog.all_technologies().len(),
        catalog.complexity_levels.len(),
        catalog.expertise_areas.len()
    );

    let classifier: Arc<dyn Classifier> = Arc::new(
        HuggingFaceClassifier::new(&config.classifier).map_err(|e| startup_error("Failed to build classifier", e))?,
    );
    let analyzer = web::Data::new(ProjectAnalyzer::new(
        classifier,
        Arc::new(catalog),
        config.classifier.on_failure,
    ));

    let users: Arc<dyn UserRepository> = Arc::new(MongoUserRepository::new(db.clone()));
    let users_data: web::Data<dyn UserRepository> = web::Data::from(users);
    let db_data = web::Data::new(db);

    let bind_addr = (config.host.clone(), config.port);
    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", config.host, config.port);

    let config_data = web::Data::new(config);

    // Start HTTP server
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &config_data.cors_origins {
            cors = cors.allowed_origin(origin);
        }
        let cors = cors
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(users_data.clone())
            .app_data(analyzer.clone())
            .app_data(config_data.clone())
            .app_data(api::json_config())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
