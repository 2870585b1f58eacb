use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::post::{Post, PostInsert, PostUpdate},
    errors::AppError,
    repositories::sqlx_repo::SqlxPostRepo,
};

const POST_COLUMNS: &str = "id, title, content, image_url, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: &PostInsert) -> Result<Post, AppError>;
    async fn get_post_by_id(&self, id: &Uuid) -> Result<Option<Post>, AppError>;
    /// Newest first.
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, AppError>;
    async fn count_posts(&self) -> Result<u64, AppError>;
    async fn update_post(&self, id: &Uuid, post: &PostUpdate) -> Result<Option<Post>, AppError>;
    /// `false` when no row matched.
    async fn delete_post(&self, id: &Uuid) -> Result<bool, AppError>;
}

impl SqlxPostRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxPostRepo { pool }
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepo {
    async fn create_post(&self, post: &PostInsert) -> Result<Post, AppError> {
        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (title, content, image_url)
            VALUES ($1, $2, $3)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_post_by_id(&self, id: &Uuid) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn count_posts(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn update_post(&self, id: &Uuid, post: &PostUpdate) -> Result<Option<Post>, AppError> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts SET
                title = $1,
                content = $2,
                image_url = $3,
                updated_at = NOW()
            WHERE id = $4
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_post(&self, id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
