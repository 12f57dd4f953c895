use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::UserService;
use crate::utils::AppError;

/// Registers the user routes plus a JSON extractor config that reports
/// malformed bodies in the same `{success, message}` shape as other errors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/", web::get().to(list_users))
        .route("/create", web::post().to(create_user))
        .route("/update/{id}", web::put().to(update_user))
        .route("/delete/{id}", web::delete().to(delete_user));
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("❌ Rejected request body: {}", err);
    let response = HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "message": err.to_string()
    }));
    actix_web::error::InternalError::from_response(err, response).into()
}

fn log_failure(operation: &str, err: &AppError) {
    match err {
        AppError::Internal(_) => log::error!("❌ {} failed: {}", operation, err),
        _ => log::warn!("❌ {} failed: {}", operation, err),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    responses(
        (status = 200, description = "All user records", body = [UserResponse]),
        (status = 500, description = "Store error")
    )
)]
pub async fn list_users(service: web::Data<UserService>) -> Result<HttpResponse, AppError> {
    log::info!("📋 GET / - Listing users");

    let users = service.list_users().await.inspect_err(|e| log_failure("List", e))?;

    log::info!("✅ Listed {} users", users.len());
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": users
    })))
}

#[utoipa::path(
    post,
    path = "/create",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User saved", body = UserResponse),
        (status = 400, description = "A field constraint failed"),
        (status = 409, description = "A user with the same name, age and dateOfBirth exists"),
        (status = 500, description = "Store error")
    )
)]
pub async fn create_user(
    service: web::Data<UserService>,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let name = request.name.as_str().unwrap_or("N/A");
    log::info!("📝 POST /create - name: {}", name);

    let user = service
        .create_user(&request)
        .await
        .inspect_err(|e| log_failure("Create", e))?;

    log::info!("✅ User created: {}", user.id);
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "User saved successfully",
        "data": user
    })))
}

#[utoipa::path(
    put,
    path = "/update/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id (24-char hex ObjectId)")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "A supplied field failed validation"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Update would duplicate another user's identity"),
        (status = 500, description = "Store error")
    )
)]
pub async fn update_user(
    service: web::Data<UserService>,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("✏️  PUT /update/{}", id);

    let user = service
        .update_user(&id, &request)
        .await
        .inspect_err(|e| log_failure("Update", e))?;

    log::info!("✅ User updated: {}", user.id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User updated successfully",
        "user": user
    })))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id (24-char hex ObjectId)")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Store error")
    )
)]
pub async fn delete_user(
    service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /delete/{} - Attempting to delete user", id);

    service
        .delete_user(&id)
        .await
        .inspect_err(|e| log_failure("Delete", e))?;

    log::info!("✅ User deleted: {}", id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_HASH_COST;
    use crate::database::InMemoryUserStore;
    use actix_web::{http::StatusCode, test, App};
    use mongodb::bson::oid::ObjectId;
    use rstest::rstest;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn alice() -> Value {
        json!({
            "name": "Alice",
            "age": 30,
            "dateOfBirth": "1994-01-01",
            "gender": "Female",
            "password": "abc1234567",
            "about": ""
        })
    }

    macro_rules! init_app {
        () => {{
            let service = UserService::new(Arc::new(InMemoryUserStore::new()), MIN_HASH_COST);
            test::init_service(
                App::new()
                    .app_data(web::Data::new(service))
                    .configure(configure),
            )
            .await
        }};
    }

    macro_rules! send {
        ($app:expr, $req:expr) => {{
            let response = test::call_service(&$app, $req.to_request()).await;
            let status = response.status();
            let body: Value = test::read_body_json(response).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn create_list_then_duplicate_conflicts() {
        let app = init_app!();

        let (status, body) = send!(app, test::TestRequest::post().uri("/create").set_json(alice()));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User saved successfully");
        let id = body["data"]["_id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 24);
        assert!(body["data"].get("password").is_none());

        let (status, body) = send!(app, test::TestRequest::get().uri("/"));
        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["_id"], id.as_str());
        assert_eq!(data[0]["name"], "Alice");

        let (status, body) = send!(app, test::TestRequest::post().uri("/create").set_json(alice()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "success": false, "message": "User already exists" }));

        let (_, body) = send!(app, test::TestRequest::get().uri("/"));
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn create_with_missing_field_is_bad_request() {
        let app = init_app!();
        let mut payload = alice();
        payload.as_object_mut().unwrap().remove("gender");

        let (status, body) = send!(app, test::TestRequest::post().uri("/create").set_json(payload));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["field"], "gender");
    }

    #[rstest]
    #[case::age_word("age", json!("abc"))]
    #[case::fractional_age("age", json!(30.5))]
    #[case::numeric_gender("gender", json!(1))]
    #[case::list_name("name", json!(["Alice"]))]
    #[actix_web::test]
    async fn create_with_wrong_type_names_the_field(#[case] field: &str, #[case] value: Value) {
        let app = init_app!();
        let mut payload = alice();
        payload[field] = value;

        let (status, body) = send!(app, test::TestRequest::post().uri("/create").set_json(payload));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["field"], field);
    }

    #[actix_web::test]
    async fn create_casts_numeric_strings() {
        let app = init_app!();
        let mut payload = alice();
        payload["age"] = json!("30");
        payload["name"] = json!(12345);

        let (status, body) = send!(app, test::TestRequest::post().uri("/create").set_json(payload));

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["age"], 30);
        assert_eq!(body["data"]["name"], "12345");
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let app = init_app!();

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/create")
                .insert_header(("content-type", "application/json"))
                .set_payload("{\"name\": ")
        );

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn update_changes_name_and_ignores_user_id() {
        let app = init_app!();
        let (_, created) = send!(app, test::TestRequest::post().uri("/create").set_json(alice()));
        let id = created["data"]["_id"].as_str().unwrap();

        let (status, body) = send!(
            app,
            test::TestRequest::put()
                .uri(&format!("/update/{}", id))
                .set_json(json!({ "name": "Alicia", "user_id": "u-1" }))
        );

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User updated successfully");
        assert_eq!(body["user"]["name"], "Alicia");
        assert_eq!(body["user"]["age"], 30);
        assert!(body["user"].get("user_id").is_none());
    }

    #[actix_web::test]
    async fn update_unknown_id_is_not_found() {
        let app = init_app!();
        let uri = format!("/update/{}", ObjectId::new().to_hex());

        let (status, body) = send!(
            app,
            test::TestRequest::put().uri(&uri).set_json(json!({ "name": "Nobody" }))
        );

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "User not found" }));
    }

    #[actix_web::test]
    async fn delete_removes_user_then_reports_not_found() {
        let app = init_app!();
        let (_, created) = send!(app, test::TestRequest::post().uri("/create").set_json(alice()));
        let uri = format!("/delete/{}", created["data"]["_id"].as_str().unwrap());

        let (status, body) = send!(app, test::TestRequest::delete().uri(&uri));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "User deleted successfully" }));

        let (_, listed) = send!(app, test::TestRequest::get().uri("/"));
        assert!(listed["data"].as_array().unwrap().is_empty());

        let (status, _) = send!(app, test::TestRequest::delete().uri(&uri));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn delete_with_malformed_id_is_not_found() {
        let app = init_app!();

        let (status, _) = send!(app, test::TestRequest::delete().uri("/delete/not-an-id"));

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
