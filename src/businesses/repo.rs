use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::businesses::dto::BusinessFields;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
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
    pub average_rating: f64,
    pub review_count: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const BUSINESS_COLUMNS: &str = r#"
    id, owner_id, name, category, description, address, city, state, zip_code,
    phone, email, website, average_rating, review_count, created_at, updated_at
"#;

impl Business {
    pub async fn list(
        db: &PgPool,
        search: Option<&str>,
        category: Option<&str>,
        city: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Business>> {
        let rows = sqlx::query_as::<_, Business>(&format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%'
                   OR description ILIKE '%' || $1 || '%'
                   OR category ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR category = $2)
              AND ($3::text IS NULL OR city = $3)
            ORDER BY average_rating DESC, review_count DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(search)
        .bind(category)
        .bind(city)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count(
        db: &PgPool,
        search: Option<&str>,
        category: Option<&str>,
        city: Option<&str>,
    ) -> anyhow::Result<i64> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM businesses
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%'
                   OR description ILIKE '%' || $1 || '%'
                   OR category ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR category = $2)
              AND ($3::text IS NULL OR city = $3)
            "#,
        )
        .bind(search)
        .bind(category)
        .bind(city)
        .fetch_one(db)
        .await?;
        Ok(total.0)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Business>> {
        let row = sqlx::query_as::<_, Business>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Option<Business>> {
        let row = sqlx::query_as::<_, Business>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(
        db: &PgPool,
        owner_id: Uuid,
        f: &BusinessFields,
    ) -> anyhow::Result<Business> {
        let row = sqlx::query_as::<_, Business>(&format!(
            r#"
            INSERT INTO businesses
                (owner_id, name, category, description, address, city, state,
                 zip_code, phone, email, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {BUSINESS_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&f.name)
        .bind(&f.category)
        .bind(&f.description)
        .bind(&f.address)
        .bind(&f.city)
        .bind(&f.state)
        .bind(&f.zip_code)
        .bind(&f.phone)
        .bind(&f.email)
        .bind(&f.website)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(db: &PgPool, id: Uuid, f: &BusinessFields) -> anyhow::Result<Business> {
        let row = sqlx::query_as::<_, Business>(&format!(
            r#"
            UPDATE businesses SET
                name = $2, category = $3, description = $4, address = $5,
                city = $6, state = $7, zip_code = $8, phone = $9, email = $10,
                website = $11, updated_at = now()
            WHERE id = $1
            RETURNING {BUSINESS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&f.name)
        .bind(&f.category)
        .bind(&f.description)
        .bind(&f.address)
        .bind(&f.city)
        .bind(&f.state)
        .bind(&f.zip_code)
        .bind(&f.phone)
        .bind(&f.email)
        .bind(&f.website)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn categories(db: &PgPool) -> anyhow::Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT category FROM businesses ORDER BY category ASC")
                .fetch_all(db)
                .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }
}
