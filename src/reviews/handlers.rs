use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    auth::repo::Role,
    businesses::{dto::Pagination, repo::Business},
    captcha,
    error::ApiError,
    reviews::{
        dto::{
            validate_rating, validate_review_text, CreateReviewRequest, UserReviewsResponse,
            ReviewListResponse, ReviewPageQuery, UpdateReviewRequest,
        },
        repo::Review,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_review))
        .route("/captcha/generate", get(generate_captcha))
        .route("/business/:business_id", get(business_reviews))
        .route("/user/:user_id", get(user_reviews))
        .route("/my/reviews", get(my_reviews))
        .route("/:id", put(update_review).delete(delete_review))
}

#[instrument(skip(state, _identity))]
pub async fn generate_captcha(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
) -> Json<captcha::ChallengeDto> {
    let dto = captcha::generate(state.captcha.as_ref(), state.config.captcha.ttl_secs).await;
    Json(dto)
}

#[instrument(skip(state))]
pub async fn business_reviews(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
    Query(q): Query<ReviewPageQuery>,
) -> Result<Json<ReviewListResponse>, ApiError> {
    let reviews =
        Review::list_for_business(&state.db, business_id, q.limit(), q.offset()).await?;
    let total = Review::count_for_business(&state.db, business_id).await?;
    Ok(Json(ReviewListResponse {
        reviews,
        pagination: Pagination::new(q.page.max(1), q.limit(), total),
    }))
}

/// Public review history for a profile page, each row carrying the
/// business name it was written against.
#[instrument(skip(state))]
pub async fn user_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let reviews = Review::list_for_user(&state.db, user_id).await?;
    Ok(Json(UserReviewsResponse { reviews }))
}

#[instrument(skip(state, identity))]
pub async fn my_reviews(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let reviews = Review::list_for_user(&state.db, identity.id).await?;
    Ok(Json(UserReviewsResponse { reviews }))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    // Captcha first: the challenge is consumed and checked before any write.
    let (captcha_id, captcha_answer) = match (payload.captcha_id, payload.captcha_answer.as_deref())
    {
        (Some(id), Some(answer)) => (id, answer),
        _ => return Err(ApiError::bad_request("Captcha is required")),
    };
    if let Err(e) = captcha::validate(state.captcha.as_ref(), captcha_id, captcha_answer).await {
        warn!(%captcha_id, error = %e, "captcha validation failed");
        return Err(ApiError::bad_request(e.to_string()));
    }

    let rating = validate_rating(payload.rating)?;
    let review_text = validate_review_text(payload.review_text.as_deref())?;
    let title = payload
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    let business_id = payload
        .business_id
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;

    if Business::find(&state.db, business_id).await?.is_none() {
        return Err(ApiError::not_found("Business not found"));
    }
    if Review::exists_for(&state.db, business_id, identity.id).await? {
        return Err(ApiError::bad_request(
            "You have already reviewed this business",
        ));
    }

    let review =
        Review::create(&state.db, business_id, identity.id, rating, title, review_text).await?;
    info!(review_id = %review.id, %business_id, user_id = %identity.id, "review created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "reviewId": review.id,
            "message": "Review submitted successfully"
        })),
    ))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let review = Review::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    if review.user_id != identity.id {
        return Err(ApiError::forbidden("Not authorized to update this review"));
    }

    let rating = validate_rating(payload.rating)?;
    let review_text = validate_review_text(payload.review_text.as_deref())?;
    let title = payload
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;

    Review::update(&state.db, id, review.business_id, rating, title, review_text).await?;
    info!(review_id = %id, "review updated");
    Ok(Json(serde_json::json!({ "message": "Review updated successfully" })))
}

#[instrument(skip(state, identity))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let review = Review::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    if review.user_id != identity.id && identity.role != Role::Admin {
        return Err(ApiError::forbidden("Not authorized to delete this review"));
    }

    Review::delete(&state.db, id, review.business_id).await?;
    info!(review_id = %id, "review deleted");
    Ok(Json(serde_json::json!({ "message": "Review deleted successfully" })))
}
