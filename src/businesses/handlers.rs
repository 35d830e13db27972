use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::{AuthUser, MaybeUser},
    auth::repo::Role,
    businesses::{
        dto::{
            BusinessListResponse, BusinessPayload, BusinessQuery, BusinessResponse,
            CategoriesResponse, MaybeBusinessResponse, Pagination,
        },
        repo::Business,
    },
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_businesses).post(create_business))
        .route("/my/business", get(my_business))
        .route("/meta/categories", get(categories))
        .route("/:id", put(update_business).delete(delete_business).get(get_business))
}

#[instrument(skip(state, _viewer))]
pub async fn list_businesses(
    State(state): State<AppState>,
    MaybeUser(_viewer): MaybeUser,
    Query(q): Query<BusinessQuery>,
) -> Result<Json<BusinessListResponse>, ApiError> {
    let limit = q.limit();
    let offset = q.offset();
    let search = q.search.as_deref().filter(|s| !s.is_empty());
    let category = q.category.as_deref().filter(|s| !s.is_empty());
    let city = q.city.as_deref().filter(|s| !s.is_empty());

    let businesses = Business::list(&state.db, search, category, city, limit, offset).await?;
    let total = Business::count(&state.db, search, category, city).await?;

    Ok(Json(BusinessListResponse {
        businesses,
        pagination: Pagination::new(q.page.max(1), limit, total),
    }))
}

#[instrument(skip(state))]
pub async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BusinessResponse>, ApiError> {
    let business = Business::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Business not found"))?;
    Ok(Json(BusinessResponse { business }))
}

#[instrument(skip(state, identity))]
pub async fn my_business(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<MaybeBusinessResponse>, ApiError> {
    let business = Business::find_by_owner(&state.db, identity.id).await?;
    Ok(Json(MaybeBusinessResponse { business }))
}

#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = Business::categories(&state.db).await?;
    Ok(Json(CategoriesResponse { categories }))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_business(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<BusinessPayload>,
) -> Result<(StatusCode, Json<BusinessResponse>), ApiError> {
    identity.require_role(Role::BusinessOwner)?;
    let fields = payload.into_fields()?;

    if Business::find_by_owner(&state.db, identity.id).await?.is_some() {
        return Err(ApiError::bad_request("You already have a business"));
    }

    let business = Business::create(&state.db, identity.id, &fields).await?;
    info!(business_id = %business.id, owner_id = %identity.id, "business created");
    Ok((StatusCode::CREATED, Json(BusinessResponse { business })))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_business(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BusinessPayload>,
) -> Result<Json<BusinessResponse>, ApiError> {
    let existing = Business::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Business not found"))?;
    if !identity.owns_or_admin(existing.owner_id) {
        return Err(ApiError::forbidden("Not allowed"));
    }

    let fields = payload.into_fields()?;
    let business = Business::update(&state.db, id, &fields).await?;
    info!(business_id = %id, "business updated");
    Ok(Json(BusinessResponse { business }))
}

#[instrument(skip(state, identity))]
pub async fn delete_business(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing = Business::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Business not found"))?;
    if !identity.owns_or_admin(existing.owner_id) {
        return Err(ApiError::forbidden("Not allowed"));
    }

    Business::delete(&state.db, id).await?;
    info!(business_id = %id, "business deleted");
    Ok(Json(serde_json::json!({ "message": "Deleted successfully" })))
}
