use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Deal {
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub description: String,
    pub discount_amount: Option<f64>,
    pub start_date: Date,
    pub end_date: Date,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DealWithBusiness {
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub description: String,
    pub discount_amount: Option<f64>,
    pub start_date: Date,
    pub end_date: Date,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub business_name: String,
}

/// Deal row plus the owning business's owner id, for authorization checks.
#[derive(Debug, Clone, FromRow)]
pub struct DealWithOwner {
    pub id: Uuid,
    pub business_id: Uuid,
    pub owner_id: Uuid,
    pub active: bool,
}

const DEAL_JOIN_COLUMNS: &str = r#"
    d.id, d.business_id, d.title, d.description, d.discount_amount,
    d.start_date, d.end_date, d.active, d.created_at, b.name AS business_name
"#;

impl Deal {
    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<DealWithBusiness>> {
        let rows = sqlx::query_as::<_, DealWithBusiness>(&format!(
            r#"
            SELECT {DEAL_JOIN_COLUMNS}
            FROM deals d
            JOIN businesses b ON b.id = d.business_id
            WHERE d.active AND d.end_date >= CURRENT_DATE
            ORDER BY d.created_at DESC
            "#
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_business(
        db: &PgPool,
        business_id: Uuid,
        include_inactive: bool,
    ) -> anyhow::Result<Vec<Deal>> {
        let rows = sqlx::query_as::<_, Deal>(
            r#"
            SELECT id, business_id, title, description, discount_amount,
                   start_date, end_date, active, created_at, updated_at
            FROM deals
            WHERE business_id = $1
              AND ($2 OR (active AND end_date >= CURRENT_DATE))
            ORDER BY created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(include_inactive)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_owner(
        db: &PgPool,
        owner_id: Uuid,
    ) -> anyhow::Result<Vec<DealWithBusiness>> {
        let rows = sqlx::query_as::<_, DealWithBusiness>(&format!(
            r#"
            SELECT {DEAL_JOIN_COLUMNS}
            FROM deals d
            JOIN businesses b ON b.id = d.business_id
            WHERE b.owner_id = $1
            ORDER BY d.created_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<DealWithBusiness>> {
        let row = sqlx::query_as::<_, DealWithBusiness>(&format!(
            r#"
            SELECT {DEAL_JOIN_COLUMNS}
            FROM deals d
            JOIN businesses b ON b.id = d.business_id
            WHERE d.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_with_owner(db: &PgPool, id: Uuid) -> anyhow::Result<Option<DealWithOwner>> {
        let row = sqlx::query_as::<_, DealWithOwner>(
            r#"
            SELECT d.id, d.business_id, b.owner_id, d.active
            FROM deals d
            JOIN businesses b ON b.id = d.business_id
            WHERE d.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        business_id: Uuid,
        title: &str,
        description: &str,
        discount_amount: Option<f64>,
        start_date: Date,
        end_date: Date,
    ) -> anyhow::Result<Deal> {
        let row = sqlx::query_as::<_, Deal>(
            r#"
            INSERT INTO deals
                (business_id, title, description, discount_amount, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, business_id, title, description, discount_amount,
                      start_date, end_date, active, created_at, updated_at
            "#,
        )
        .bind(business_id)
        .bind(title)
        .bind(description)
        .bind(discount_amount)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: &str,
        description: &str,
        discount_amount: Option<f64>,
        start_date: Date,
        end_date: Date,
        active: bool,
    ) -> anyhow::Result<Deal> {
        let row = sqlx::query_as::<_, Deal>(
            r#"
            UPDATE deals SET
                title = $2, description = $3, discount_amount = $4,
                start_date = $5, end_date = $6, active = $7, updated_at = now()
            WHERE id = $1
            RETURNING id, business_id, title, description, discount_amount,
                      start_date, end_date, active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(discount_amount)
        .bind(start_date)
        .bind(end_date)
        .bind(active)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM deals WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
