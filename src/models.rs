use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>, // Serialized rich content, see content::parse_sections
    pub image: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date: Option<String>,
    pub read_time: Option<String>,
}

impl Article {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn display_title(&self) -> &str {
        non_blank(&self.title).unwrap_or("Untitled")
    }

    pub fn display_author(&self) -> &str {
        non_blank(&self.author).unwrap_or("Unknown Author")
    }

    pub fn display_excerpt(&self) -> &str {
        non_blank(&self.excerpt).unwrap_or("No excerpt available")
    }

    pub fn display_read_time(&self) -> &str {
        non_blank(&self.read_time).unwrap_or("5 Min Read")
    }

    /// First letter of every word in the author's name, "U" when unknown.
    pub fn author_initials(&self) -> String {
        let name = non_blank(&self.author).unwrap_or("Unknown");
        name.split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn display_date(&self) -> String {
        let Some(raw) = non_blank(&self.date) else {
            return "No date".to_string();
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.format("%b %e, %Y").to_string();
        }
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return day.format("%b %e, %Y").to_string();
        }

        // Unknown format, show what the store sent
        raw.to_string()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Payload for creating or updating an article through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub read_time: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub industry: Option<String>,
}

impl ArticleDraft {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("title", &self.title),
            ("date", &self.date),
            ("author", &self.author),
            ("excerpt", &self.excerpt),
            ("category", &self.category),
            ("content", &self.content),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| non_blank(value).is_none())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContentError::Invalid(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Build the cached representation once the gateway has assigned an id.
    pub fn into_article(self, id: impl Into<String>) -> Article {
        Article {
            id: id.into(),
            title: self.title,
            excerpt: self.excerpt,
            author: self.author,
            content: self.content,
            image: self.image,
            category: self.category,
            resource_type: self.resource_type,
            industry: self.industry,
            tags: self.tags,
            date: self.date,
            read_time: self.read_time,
        }
    }
}

impl From<&Article> for ArticleDraft {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            date: article.date.clone(),
            author: article.author.clone(),
            tags: article.tags.clone(),
            excerpt: article.excerpt.clone(),
            image: article.image.clone(),
            category: article.category.clone(),
            content: article.content.clone(),
            read_time: article.read_time.clone(),
            resource_type: article.resource_type.clone(),
            industry: article.industry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> ArticleDraft {
        ArticleDraft {
            title: Some("AI Basics".into()),
            date: Some("2024-05-01".into()),
            author: Some("Ada Lovelace".into()),
            excerpt: Some("Where to start".into()),
            category: Some("Technology".into()),
            content: Some("[]".into()),
            ..Default::default()
        }
    }

    #[test]
    fn display_helpers_fall_back_on_missing_fields() {
        let article = Article::new("rec1");
        assert_eq!(article.display_title(), "Untitled");
        assert_eq!(article.display_author(), "Unknown Author");
        assert_eq!(article.display_read_time(), "5 Min Read");
        assert_eq!(article.display_date(), "No date");
        assert_eq!(article.author_initials(), "U");
    }

    #[test]
    fn author_initials_take_first_letter_of_each_word() {
        let mut article = Article::new("rec1");
        article.author = Some("grace brewster hopper".into());
        assert_eq!(article.author_initials(), "GBH");
    }

    #[test]
    fn display_date_accepts_day_and_timestamp_formats() {
        let mut article = Article::new("rec1");
        article.date = Some("2024-05-01".into());
        assert_eq!(article.display_date(), "May  1, 2024");

        article.date = Some("2024-12-24T10:00:00.000Z".into());
        assert_eq!(article.display_date(), "Dec 24, 2024");

        article.date = Some("next week".into());
        assert_eq!(article.display_date(), "next week");
    }

    #[test]
    fn serializes_with_site_field_names() {
        let mut article = Article::new("rec1");
        article.resource_type = Some("Tech".into());
        article.read_time = Some("3 min".into());

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["type"], "Tech");
        assert_eq!(json["readTime"], "3 min");
    }

    #[test]
    fn draft_validation_names_missing_fields() {
        assert!(complete_draft().validate().is_ok());

        let mut draft = complete_draft();
        draft.title = Some("   ".into());
        draft.content = None;
        let err = draft.validate().unwrap_err();
        assert_eq!(
            err,
            ContentError::Invalid("missing required fields: title, content".into())
        );
    }

    #[test]
    fn draft_round_trips_through_article() {
        let article = complete_draft().into_article("rec9");
        assert_eq!(article.id, "rec9");
        assert_eq!(ArticleDraft::from(&article), complete_draft());
    }
}
