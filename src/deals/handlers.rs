use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    auth::repo::Role,
    businesses::repo::Business,
    deals::{
        dto::{
            parse_date_range, BusinessDealsQuery, CreateDealRequest, DealListResponse,
            DealResponse, PlainDealListResponse, UpdateDealRequest,
        },
        repo::Deal,
    },
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_deals).post(create_deal))
        .route("/business/:business_id", get(business_deals))
        .route("/my/deals", get(my_deals))
        .route("/:id", get(get_deal).put(update_deal).delete(delete_deal))
}

#[instrument(skip(state))]
pub async fn list_deals(
    State(state): State<AppState>,
) -> Result<Json<DealListResponse>, ApiError> {
    let deals = Deal::list_active(&state.db).await?;
    Ok(Json(DealListResponse { deals }))
}

#[instrument(skip(state))]
pub async fn business_deals(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
    Query(q): Query<BusinessDealsQuery>,
) -> Result<Json<PlainDealListResponse>, ApiError> {
    let deals = Deal::list_for_business(&state.db, business_id, q.include_inactive).await?;
    Ok(Json(PlainDealListResponse { deals }))
}

#[instrument(skip(state, identity))]
pub async fn my_deals(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<DealListResponse>, ApiError> {
    identity.require_role(Role::BusinessOwner)?;
    let deals = Deal::list_for_owner(&state.db, identity.id).await?;
    Ok(Json(DealListResponse { deals }))
}

#[instrument(skip(state))]
pub async fn get_deal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DealResponse>, ApiError> {
    let deal = Deal::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Deal not found"))?;
    Ok(Json(DealResponse { deal }))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_deal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    identity.require_role(Role::BusinessOwner)?;

    let (business_id, title, description, start, end) = match (
        payload.business_id,
        payload.title.as_deref().filter(|s| !s.trim().is_empty()),
        payload
            .description
            .as_deref()
            .filter(|s| !s.trim().is_empty()),
        payload.start_date.as_deref(),
        payload.end_date.as_deref(),
    ) {
        (Some(b), Some(t), Some(d), Some(s), Some(e)) => (b, t, d, s, e),
        _ => return Err(ApiError::bad_request("Missing required fields")),
    };

    let business = Business::find(&state.db, business_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Business not found"))?;
    if !identity.owns_or_admin(business.owner_id) {
        return Err(ApiError::forbidden(
            "Not authorized to create deals for this business",
        ));
    }

    let (start_date, end_date) = parse_date_range(start, end)?;
    let deal = Deal::create(
        &state.db,
        business_id,
        title,
        description,
        payload.discount_amount,
        start_date,
        end_date,
    )
    .await?;

    info!(deal_id = %deal.id, %business_id, "deal created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "dealId": deal.id,
            "message": "Deal created successfully"
        })),
    ))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_deal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDealRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    identity.require_role(Role::BusinessOwner)?;

    let deal = Deal::find_with_owner(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Deal not found"))?;
    if !identity.owns_or_admin(deal.owner_id) {
        return Err(ApiError::forbidden("Not authorized to update this deal"));
    }

    let (title, description, start, end) = match (
        payload.title.as_deref().filter(|s| !s.trim().is_empty()),
        payload
            .description
            .as_deref()
            .filter(|s| !s.trim().is_empty()),
        payload.start_date.as_deref(),
        payload.end_date.as_deref(),
    ) {
        (Some(t), Some(d), Some(s), Some(e)) => (t, d, s, e),
        _ => return Err(ApiError::bad_request("Missing required fields")),
    };
    let (start_date, end_date) = parse_date_range(start, end)?;

    // Absent `active` preserves the current flag.
    let active = payload.active.unwrap_or(deal.active);

    Deal::update(
        &state.db,
        id,
        title,
        description,
        payload.discount_amount,
        start_date,
        end_date,
        active,
    )
    .await?;

    info!(deal_id = %id, "deal updated");
    Ok(Json(serde_json::json!({ "message": "Deal updated successfully" })))
}

#[instrument(skip(state, identity))]
pub async fn delete_deal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    identity.require_role(Role::BusinessOwner)?;

    let deal = Deal::find_with_owner(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Deal not found"))?;
    if !identity.owns_or_admin(deal.owner_id) {
        return Err(ApiError::forbidden("Not authorized to delete this deal"));
    }

    Deal::delete(&state.db, id).await?;
    info!(deal_id = %id, "deal deleted");
    Ok(Json(serde_json::json!({ "message": "Deal deleted successfully" })))
}
