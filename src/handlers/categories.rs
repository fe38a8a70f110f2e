use super::common::{
    authorized_business, created_response, map_service_error, paginated_response,
    success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    services::categories::{CreateCategoryInput, UpdateCategoryInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/businesses/:business_id/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/businesses/:business_id/categories/:category_id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Json(payload): Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let category = state
        .services
        .categories
        .create_category(business_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(category))
}

async fn list_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;
    let window = params.resolve(&state.config);

    let page = state
        .services
        .categories
        .list_categories(business_id, window.limit(), window.offset())
        .await
        .map_err(map_service_error)?;

    Ok(paginated_response(page, window))
}

async fn get_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let category = state
        .services
        .categories
        .get_category(business_id, category_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(category))
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, category_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    authorized_business(&state, &user, business_id).await?;

    let category = state
        .services
        .categories
        .update_category(business_id, category_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(category))
}

/// Products in the category are detached, not deleted
async fn delete_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((business_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    authorized_business(&state, &user, business_id).await?;

    let detached = state
        .services
        .categories
        .delete_category(business_id, category_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "id": category_id,
        "deleted": true,
        "detached_products": detached,
    })))
}
