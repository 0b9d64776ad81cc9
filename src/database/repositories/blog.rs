use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{BlogPost, BlogPostInput},
    utils::sql,
};

const BLOG_COLUMNS: &str = r#"
    id,
    slug,
    title,
    excerpt,
    content,
    cover_image,
    author_id,
    published,
    published_at,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct BlogRepository {
    pool: PgPool,
}

impl BlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        include_drafts: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BlogPost>, i64)> {
        let total: i64 = sqlx::query_scalar(&sql(
            "SELECT COUNT(*) FROM blog_posts WHERE published OR ?",
        ))
        .bind(include_drafts)
        .fetch_one(&self.pool)
        .await?;

        let posts = sqlx::query_as::<_, BlogPost>(&sql(&format!(
            r#"
            SELECT {BLOG_COLUMNS}
            FROM blog_posts
            WHERE published OR ?
            ORDER BY COALESCE(published_at, created_at) DESC
            LIMIT ? OFFSET ?
            "#
        )))
        .bind(include_drafts)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((posts, total))
    }

    pub async fn find_published_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>(&sql(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_posts WHERE slug = ? AND published"
        )))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn create(&self, input: BlogPostInput) -> Result<BlogPost> {
        let now = Utc::now();
        let slug = input.resolved_slug();
        let published_at = input.published.then_some(now);

        let post = sqlx::query_as::<_, BlogPost>(&sql(&format!(
            r#"
            INSERT INTO
                blog_posts (
                    slug,
                    title,
                    excerpt,
                    content,
                    cover_image,
                    author_id,
                    published,
                    published_at,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {BLOG_COLUMNS}
            "#
        )))
        .bind(slug)
        .bind(input.title)
        .bind(input.excerpt)
        .bind(input.content)
        .bind(input.cover_image)
        .bind(input.author_id)
        .bind(input.published)
        .bind(published_at)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// First publication keeps its original `published_at`; unpublishing clears it.
    pub async fn update(&self, id: Uuid, input: BlogPostInput) -> Result<Option<BlogPost>> {
        let now = Utc::now();
        let slug = input.resolved_slug();

        let post = sqlx::query_as::<_, BlogPost>(&sql(&format!(
            r#"
            UPDATE
                blog_posts
            SET
                slug = ?,
                title = ?,
                excerpt = ?,
                content = ?,
                cover_image = ?,
                author_id = ?,
                published = ?,
                published_at = CASE WHEN ? THEN COALESCE(published_at, ?) ELSE NULL END,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {BLOG_COLUMNS}
            "#
        )))
        .bind(slug)
        .bind(input.title)
        .bind(input.excerpt)
        .bind(input.content)
        .bind(input.cover_image)
        .bind(input.author_id)
        .bind(input.published)
        .bind(input.published)
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&sql("DELETE FROM blog_posts WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
