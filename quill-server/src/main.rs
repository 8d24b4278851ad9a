use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};

use quill_server::application::directory::DirectoryService;
use quill_server::application::post_service::PostService;
use quill_server::data::post_repository::{PostRepository, PostgresPostRepository};
use quill_server::data::user_repository::{PostgresUserRepository, UserRepository};
use quill_server::infrastructure::config::AppConfig;
use quill_server::infrastructure::database::{create_pool, run_migrations};
use quill_server::infrastructure::identity::IdentityVerifier;
use quill_server::infrastructure::logging::init_logging;
use quill_server::infrastructure::sanitize::HtmlSanitizer;
use quill_server::infrastructure::storage::{HttpObjectStorage, ObjectStorage};
use quill_server::presentation::handlers;
use quill_server::presentation::telemetry::RequestTrace;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let config = AppConfig::from_env().expect("invalid configuration");
    let pool = create_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let user_repo: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let post_repo: Arc<dyn PostRepository> = Arc::new(PostgresPostRepository::new(pool.clone()));
    let storage: Arc<dyn ObjectStorage> = Arc::new(HttpObjectStorage::new(
        &config.storage_url,
        &config.storage_public_url,
        config.storage_token.clone(),
    ));

    let verifier = IdentityVerifier::new(config.jwt_secret.clone());
    let directory = DirectoryService::new(user_repo);
    let post_service = PostService::new(post_repo, directory, HtmlSanitizer::new());

    let config_data = config.clone();

    HttpServer::new(move || {
        let cors = build_cors(&config_data);
        App::new()
            .wrap(RequestTrace)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .app_data(web::Data::new(post_service.clone()))
            .app_data(web::Data::new(verifier.clone()))
            .app_data(web::Data::new(Arc::clone(&storage)))
            .service(handlers::api_scope())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
