use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User CRUD Service API",
        version = "1.0.0",
        description = "Create, list, update and delete user records stored in MongoDB.\n\nEvery response body carries a `success` boolean; failures add a `message`."
    ),
    paths(
        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            crate::models::UserResponse,
            crate::models::Gender,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Users", description = "User record management."),
        (name = "Health", description = "Health check and request metrics."),
    )
)]
pub struct ApiDoc;
