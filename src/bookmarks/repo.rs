use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A bookmarked business joined with its directory entry.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookmarkedBusiness {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub average_rating: f64,
    pub review_count: i64,
    pub bookmarked_at: OffsetDateTime,
}

pub struct Bookmark;

impl Bookmark {
    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<BookmarkedBusiness>> {
        let rows = sqlx::query_as::<_, BookmarkedBusiness>(
            r#"
            SELECT b.id, b.name, b.category, b.description, b.address, b.city,
                   b.state, b.zip_code, b.average_rating, b.review_count,
                   bm.created_at AS bookmarked_at
            FROM bookmarks bm
            JOIN businesses b ON b.id = bm.business_id
            WHERE bm.user_id = $1
            ORDER BY bm.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn exists(db: &PgPool, user_id: Uuid, business_id: Uuid) -> anyhow::Result<bool> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM bookmarks WHERE user_id = $1 AND business_id = $2")
                .bind(user_id)
                .bind(business_id)
                .fetch_optional(db)
                .await?;
        Ok(row.is_some())
    }

    pub async fn create(db: &PgPool, user_id: Uuid, business_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO bookmarks (user_id, business_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(business_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, business_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND business_id = $2")
            .bind(user_id)
            .bind(business_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
