use serde::{Deserialize, Serialize};

use crate::businesses::repo::Business;

#[derive(Debug, Deserialize)]
pub struct BusinessQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    12
}

impl BusinessQuery {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit.max(1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BusinessListResponse {
    pub businesses: Vec<Business>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct BusinessResponse {
    pub business: Business,
}

#[derive(Debug, Serialize)]
pub struct MaybeBusinessResponse {
    pub business: Option<Business>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BusinessPayload {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// The required subset of a business payload, after presence checks.
pub struct BusinessFields {
    pub name: String,
    pub category: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

impl BusinessPayload {
    pub fn into_fields(self) -> Result<BusinessFields, crate::error::ApiError> {
        let required = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (
            required(self.name),
            required(self.category),
            required(self.description),
            required(self.address),
            required(self.city),
            required(self.state),
            required(self.zip_code),
        ) {
            (
                Some(name),
                Some(category),
                Some(description),
                Some(address),
                Some(city),
                Some(state),
                Some(zip_code),
            ) => Ok(BusinessFields {
                name,
                category,
                description,
                address,
                city,
                state,
                zip_code,
                phone: self.phone,
                email: self.email,
                website: self.website,
            }),
            _ => Err(crate::error::ApiError::bad_request(
                "Missing required fields",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(1, 12, 25);
        assert_eq!(p.pages, 3);
        assert_eq!(Pagination::new(1, 12, 24).pages, 2);
        assert_eq!(Pagination::new(1, 12, 0).pages, 0);
    }

    #[test]
    fn query_offset_is_zero_based() {
        let q = BusinessQuery {
            search: None,
            category: None,
            city: None,
            page: 3,
            limit: 10,
        };
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn payload_missing_required_field_is_rejected() {
        let payload = BusinessPayload {
            name: Some("Cafe".into()),
            category: None,
            description: Some("Coffee".into()),
            address: Some("1 Main St".into()),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            zip_code: Some("62701".into()),
            phone: None,
            email: None,
            website: None,
        };
        assert!(payload.into_fields().is_err());
    }
}
