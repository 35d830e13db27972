use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};
use uuid::Uuid;

use crate::deals::repo::{Deal, DealWithBusiness};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealRequest {
    pub business_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub discount_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub discount_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDealsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct DealListResponse {
    pub deals: Vec<DealWithBusiness>,
}

#[derive(Debug, Serialize)]
pub struct PlainDealListResponse {
    pub deals: Vec<Deal>,
}

#[derive(Debug, Serialize)]
pub struct DealResponse {
    pub deal: DealWithBusiness,
}

pub fn parse_date(value: &str) -> Result<Date, ApiError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value, &format).map_err(|_| ApiError::bad_request("Invalid date format"))
}

/// Parses and orders a deal's date range: end must not precede start.
pub fn parse_date_range(start: &str, end: &str) -> Result<(Date, Date), ApiError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        return Err(ApiError::bad_request("End date must be after start date"));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert!(parse_date("2026-08-26").is_ok());
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("26/08/2026").is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(parse_date_range("2026-01-01", "2026-06-30").is_ok());
        assert!(parse_date_range("2026-01-01", "2026-01-01").is_ok());
        assert!(parse_date_range("2026-06-30", "2026-01-01").is_err());
    }
}
