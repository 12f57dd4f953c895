use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::services::UserService;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
    /// Which store backs the service (`mongodb` or `memory`)
    pub store_kind: String,
    /// `up` when the store answered a ping
    pub store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(service: web::Data<UserService>) -> impl Responder {
    let store = service.store();
    let store_up = match store.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("⚠️  Store ping failed: {}", e);
            false
        }
    };

    let body = HealthResponse {
        status: if store_up { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        store_kind: store.kind().to_string(),
        store: if store_up { "up" } else { "down" }.to_string(),
    };

    if store_up {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_HASH_COST;
    use crate::database::InMemoryUserStore;
    use actix_web::{test, App};
    use std::sync::Arc;

    #[actix_web::test]
    async fn reports_store_status() {
        let service = UserService::new(Arc::new(InMemoryUserStore::new()), MIN_HASH_COST);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .route("/health", web::get().to(health_check)),
        )
        .await;

        let response = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(response.status().is_success());

        let body: HealthResponse = test::read_body_json(response).await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.store_kind, "memory");
        assert_eq!(body.store, "up");
    }
}
