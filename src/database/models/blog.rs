use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::slug::slugify;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub author_id: Option<Uuid>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostInput {
    pub title: String,
    /// Derived from the title when omitted.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub published: bool,
}

impl BlogPostInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.resolved_slug().is_empty() {
            return Err("Slug must contain at least one letter or digit".to_string());
        }
        Ok(())
    }

    pub fn resolved_slug(&self) -> String {
        match self.slug.as_deref() {
            Some(slug) if !slug.trim().is_empty() => slugify(slug),
            _ => slugify(&self.title),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogQuery {
    /// Drafts are listed only when explicitly requested.
    #[serde(default)]
    pub include_drafts: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, slug: Option<&str>) -> BlogPostInput {
        BlogPostInput {
            title: title.to_string(),
            slug: slug.map(str::to_string),
            excerpt: None,
            content: "…".to_string(),
            cover_image: None,
            author_id: None,
            published: false,
        }
    }

    #[test]
    fn test_slug_derived_from_title() {
        assert_eq!(
            input("Acheter à Tipaza : le guide", None).resolved_slug(),
            "acheter-a-tipaza-le-guide"
        );
        assert_eq!(input("Title", Some("  ")).resolved_slug(), "title");
        assert_eq!(input("Title", Some("Mon Slug")).resolved_slug(), "mon-slug");
    }

    #[test]
    fn test_validation_rejects_unsluggable_titles() {
        assert!(input("???", None).validate().is_err());
        assert!(input("  ", None).validate().is_err());
        assert!(input("Louer à Oran", None).validate().is_ok());
    }
}
