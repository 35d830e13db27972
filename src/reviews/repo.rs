use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub review_text: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub review_text: String,
    pub created_at: OffsetDateTime,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithBusiness {
    pub id: Uuid,
    pub business_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub review_text: String,
    pub created_at: OffsetDateTime,
    pub business_name: String,
}

/// Recomputes the stored rating aggregate for one business. Must run inside
/// the same transaction as the review write so a reader never sees one
/// without the other.
async fn refresh_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    business_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE businesses SET
            average_rating = COALESCE(
                (SELECT AVG(rating)::float8 FROM reviews WHERE business_id = $1), 0),
            review_count = (SELECT COUNT(*) FROM reviews WHERE business_id = $1)
        WHERE id = $1
        "#,
    )
    .bind(business_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

impl Review {
    pub async fn list_for_business(
        db: &PgPool,
        business_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ReviewWithAuthor>> {
        let rows = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.id, r.business_id, r.user_id, r.rating, r.title,
                   r.review_text, r.created_at, u.username
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.business_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(business_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_business(db: &PgPool, business_id: Uuid) -> anyhow::Result<i64> {
        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE business_id = $1")
                .bind(business_id)
                .fetch_one(db)
                .await?;
        Ok(total.0)
    }

    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<ReviewWithBusiness>> {
        let rows = sqlx::query_as::<_, ReviewWithBusiness>(
            r#"
            SELECT r.id, r.business_id, r.rating, r.title, r.review_text,
                   r.created_at, b.name AS business_name
            FROM reviews r
            JOIN businesses b ON b.id = r.business_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Review>> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, business_id, user_id, rating, title, review_text,
                   created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn exists_for(
        db: &PgPool,
        business_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<bool> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM reviews WHERE business_id = $1 AND user_id = $2")
                .bind(business_id)
                .bind(user_id)
                .fetch_optional(db)
                .await?;
        Ok(row.is_some())
    }

    pub async fn create(
        db: &PgPool,
        business_id: Uuid,
        user_id: Uuid,
        rating: i32,
        title: &str,
        review_text: &str,
    ) -> anyhow::Result<Review> {
        let mut tx = db.begin().await?;
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (business_id, user_id, rating, title, review_text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, business_id, user_id, rating, title, review_text,
                      created_at, updated_at
            "#,
        )
        .bind(business_id)
        .bind(user_id)
        .bind(rating)
        .bind(title)
        .bind(review_text)
        .fetch_one(&mut *tx)
        .await?;
        refresh_aggregate(&mut tx, business_id).await?;
        tx.commit().await?;
        Ok(review)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        business_id: Uuid,
        rating: i32,
        title: &str,
        review_text: &str,
    ) -> anyhow::Result<Review> {
        let mut tx = db.begin().await?;
        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = $2, title = $3, review_text = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, business_id, user_id, rating, title, review_text,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(title)
        .bind(review_text)
        .fetch_one(&mut *tx)
        .await?;
        refresh_aggregate(&mut tx, business_id).await?;
        tx.commit().await?;
        Ok(review)
    }

    pub async fn delete(db: &PgPool, id: Uuid, business_id: Uuid) -> anyhow::Result<()> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        refresh_aggregate(&mut tx, business_id).await?;
        tx.commit().await?;
        Ok(())
    }
}
