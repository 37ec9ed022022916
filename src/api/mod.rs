pub mod auth;
pub mod catalog;
pub mod health;
pub mod matches;
pub mod project;
pub mod swagger;
pub mod user;

use crate::middleware::auth::AuthMiddleware;
use crate::utils::error::AppError;
use actix_web::web;

/// Body JSON inválido vira 400 com `message`, igual às outras validações
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::Validation(format!("Invalid JSON body: {}", err)).into())
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Auth endpoints
        .service(
            web::scope("/api/auth")
                .route("/signup", web::post().to(auth::signup))
                .route("/login", web::post().to(auth::login))
                .route("/logout", web::post().to(auth::logout))
                .service(
                    web::resource("/me")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(auth::get_me)),
                ),
        )
        // Análise do projeto do usuário logado
        .service(
            web::scope("/api/project")
                .wrap(AuthMiddleware)
                .route("/analyze", web::post().to(project::analyze)),
        )
        // Análise + persistência por email (sem sessão)
        .service(
            web::scope("/api/project-requirements")
                .route("/update", web::post().to(project::update_by_email)),
        )
        // Requisitos informados pelo próprio usuário (sem reclassificar)
        .service(
            web::scope("/api/user")
                .wrap(AuthMiddleware)
                .route("/update-requirements", web::post().to(user::update_requirements)),
        )
        .service(
            web::scope("/api/matches")
                .wrap(AuthMiddleware)
                .route("", web::get().to(matches::get_matches)),
        )
        // Catálogo de labels (público)
        .route("/api/catalog", web::get().to(catalog::get_catalog));
}
