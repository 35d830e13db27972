use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::reviews::repo::{ReviewWithAuthor, ReviewWithBusiness};

#[derive(Debug, Deserialize)]
pub struct ReviewPageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl ReviewPageQuery {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub business_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub review_text: Option<String>,
    pub captcha_id: Option<Uuid>,
    pub captcha_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub review_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewWithAuthor>,
    pub pagination: crate::businesses::dto::Pagination,
}

#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub reviews: Vec<ReviewWithBusiness>,
}

pub fn validate_rating(rating: Option<i32>) -> Result<i32, ApiError> {
    match rating {
        Some(r) if (1..=5).contains(&r) => Ok(r),
        _ => Err(ApiError::bad_request("Rating must be between 1 and 5")),
    }
}

pub fn validate_review_text(text: Option<&str>) -> Result<&str, ApiError> {
    let text = text.ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    if text.len() < 20 {
        return Err(ApiError::bad_request(
            "Review must be at least 20 characters",
        ));
    }
    if text.len() > 1000 {
        return Err(ApiError::bad_request(
            "Review must be less than 1000 characters",
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(Some(1)).is_ok());
        assert!(validate_rating(Some(5)).is_ok());
        assert!(validate_rating(Some(0)).is_err());
        assert!(validate_rating(Some(6)).is_err());
        assert!(validate_rating(None).is_err());
    }

    #[test]
    fn review_text_bounds() {
        let text = |n: usize| "a".repeat(n);
        assert!(validate_review_text(Some("too short")).is_err());
        assert!(validate_review_text(Some(text(20).as_str())).is_ok());
        assert!(validate_review_text(Some(text(1000).as_str())).is_ok());
        assert!(validate_review_text(Some(text(1001).as_str())).is_err());
        assert!(validate_review_text(None).is_err());
    }
}
