mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Compress, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, StoreBackend};
use crate::database::{InMemoryUserStore, MongoDB, MongoUserStore, UserStore};
use crate::services::UserService;

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        return Cors::permissive();
    }

    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600)
}

async fn build_store(config: &AppConfig) -> io::Result<Arc<dyn UserStore>> {
    match config.store {
        StoreBackend::MongoDb => {
            log::info!("📊 Database: {}", config.database_url);
            let db = MongoDB::new(&config.database_url)
                .await
                .map_err(|e| io::Error::other(format!("Failed to connect to MongoDB: {}", e)))?;
            log::info!("✅ MongoDB connected successfully");
            Ok(Arc::new(MongoUserStore::new(db).await))
        }
        StoreBackend::Memory => {
            log::warn!("⚠️  Using in-memory user store; records are lost on restart");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    log::info!("🚀 Starting User CRUD Service...");

    let store = build_store(&config).await?;
    let service = web::Data::new(UserService::new(store, config.password_hash_cost));

    let (host, port) = config.bind_address();
    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    let origins = config.cors_allowed_origins.clone();

    HttpServer::new(move || {
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(service.clone())
            .wrap(build_cors(&origins))
            .wrap(Compress::default())
            .wrap(middleware::RequestMetrics)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi),
            )
            .route("/health", web::get().to(api::health::health_check))
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            .configure(api::users::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
