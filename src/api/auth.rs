use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::services::analyzer_service::ProjectAnalyzer;
use crate::services::auth_service::{self, AuthResponse, LoginRequest, SignupRequest, SESSION_COOKIE};
use crate::services::user_repository::UserRepository;
use crate::models::UserInfo;
use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{web, HttpResponse, ResponseError};

fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(config.jwt.ttl_hours))
        .finish()
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created, session cookie set", body = AuthResponse),
        (status = 400, description = "Missing fields or invalid role"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    users: web::Data<dyn UserRepository>,
    analyzer: web::Data<ProjectAnalyzer>,
    config: web::Data<AppConfig>,
    request: web::Json<SignupRequest>,
) -> HttpResponse {
    let email_str = request.email.as_deref().unwrap_or("N/A");
    let role = request.role.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /auth/signup - email: {}, role: {}", email_str, role);

    match auth_service::signup(users.get_ref(), &analyzer, &config.write_retry, &config.jwt, &request).await {
        Ok(response) => {
            log::info!("✅ Signup successful: {}", email_str);
            HttpResponse::Created()
                .cookie(session_cookie(&config, response.token.clone()))
                .json(response)
        }
        Err(e) => {
            log::warn!("❌ Signup failed: {} - {}", email_str, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    users: web::Data<dyn UserRepository>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    let email_str = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /auth/login - email: {}", email_str);

    match auth_service::login(users.get_ref(), &config.jwt, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", email_str);
            HttpResponse::Ok()
                .cookie(session_cookie(&config, response.token.clone()))
                .json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", email_str, e);
            e.error_response()
        }
    }
}

pub async fn logout() -> HttpResponse {
    log::info!("👋 POST /auth/logout");

    let expired = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(time::Duration::ZERO)
        .finish();

    HttpResponse::Ok().cookie(expired).json(serde_json::json!({
        "success": true,
        "message": "Logged out"
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(users: web::Data<dyn UserRepository>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("👤 GET /auth/me");

    match auth_service::get_current_user(users.get_ref(), &user.sub).await {
        Ok(info) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": info
        })),
        Err(e) => {
            log::warn!("❌ Failed to get user {}: {}", user.sub, e);
            e.error_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{test_app, TestContext};
    use crate::models::Role;
    use actix_web::{http::StatusCode, test};

    #[actix_rt::test]
    async fn test_signup_sets_session_cookie() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(serde_json::json!({
                "name": "Grace",
                "email": "grace@example.com",
                "password": "hopper-1906",
                "role": "coder",
                "country": "USA",
                "developerStack": { "name": "Backend", "technologies": ["Go", "PostgreSQL"] }
            }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        assert!(res.response().cookies().any(|c| c.name() == "token" && !c.value().is_empty()));
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["user"]["role"], "coder");
        assert!(body["user"].get("password").is_none());
    }

    #[actix_rt::test]
    async fn test_signup_duplicate_email_is_409() {
        let ctx = TestContext::new();
        ctx.users.seed("Grace", "grace@example.com", Role::Coder, &["Go"]).await;
        let app = test::init_service(test_app(&ctx)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(serde_json::json!({
                "name": "Grace",
                "email": "grace@example.com",
                "password": "hopper-1906",
                "role": "coder"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_rt::test]
    async fn test_me_with_bearer_token() {
        let ctx = TestContext::new();
        let user = ctx.users.seed("Ana", "ana@example.com", Role::Innovator, &[]).await;
        let token = ctx.token_for(&user);
        let app = test::init_service(test_app(&ctx)).await;

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["user"]["email"], "ana@example.com");
    }

    #[actix_rt::test]
    async fn test_login_with_wrong_password_is_401() {
        let ctx = TestContext::new();
        ctx.users.seed("Ana", "ana@example.com", Role::Innovator, &[]).await;
        let app = test::init_service(test_app(&ctx)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({ "email": "ana@example.com", "password": "wrong" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
