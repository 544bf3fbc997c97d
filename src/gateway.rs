//! Boundary to the remote content store.
//!
//! Upstream records come in more than one spelling: the hosted table
//! returns `{ id, fields: { "Title", "Resource Type", ... } }` while the
//! site API flattens them to `{ id, title, type | resourceType, ... }`.
//! [`normalize_record`] is the only place that knows about either shape;
//! everything past this module works with [`Article`].

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{ContentError, Result};
use crate::models::{Article, ArticleDraft};

#[async_trait]
pub trait ContentGateway: Send + Sync {
    async fn list_articles(&self) -> Result<Vec<Article>>;

    /// Fails with [`ContentError::NotFound`] when the store has no such id.
    async fn get_article(&self, id: &str) -> Result<Article>;

    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article>;

    async fn update_article(&self, id: &str, draft: &ArticleDraft) -> Result<Article>;

    async fn delete_article(&self, id: &str) -> Result<()>;
}

const TITLE_KEYS: &[&str] = &["Title", "title"];
const DATE_KEYS: &[&str] = &["Date", "date"];
const AUTHOR_KEYS: &[&str] = &["Author", "author"];
const TAG_KEYS: &[&str] = &["Tags", "tags"];
const EXCERPT_KEYS: &[&str] = &["Excerpt", "excerpt"];
const IMAGE_KEYS: &[&str] = &["Image url", "image", "Image"];
const CATEGORY_KEYS: &[&str] = &["Category", "category"];
const CONTENT_KEYS: &[&str] = &["Content", "content"];
const READ_TIME_KEYS: &[&str] = &["Read time", "readTime"];
const TYPE_KEYS: &[&str] = &["Resource Type", "type", "resourceType"];
const INDUSTRY_KEYS: &[&str] = &["Industry", "industry"];

/// Map one upstream record onto the canonical [`Article`].
pub fn normalize_record(record: &Value) -> Result<Article> {
    let object = record
        .as_object()
        .ok_or_else(|| ContentError::gateway(None, "record is not an object"))?;

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ContentError::gateway(None, "record has no id"))?;

    // Table records nest their columns under "fields"
    let fields = object
        .get("fields")
        .and_then(Value::as_object)
        .unwrap_or(object);

    Ok(Article {
        id: id.to_string(),
        title: text_field(fields, TITLE_KEYS),
        excerpt: text_field(fields, EXCERPT_KEYS),
        author: text_field(fields, AUTHOR_KEYS),
        content: content_field(fields),
        image: image_field(fields),
        category: text_field(fields, CATEGORY_KEYS),
        resource_type: text_field(fields, TYPE_KEYS),
        industry: text_field(fields, INDUSTRY_KEYS),
        tags: tags_field(fields),
        date: text_field(fields, DATE_KEYS),
        read_time: text_field(fields, READ_TIME_KEYS),
    })
}

/// Normalize a list payload. Anything that is neither an array nor a
/// `{ "records": [...] }` page is treated as an empty list; records that
/// cannot be normalized are skipped.
pub fn normalize_list(payload: &Value) -> Vec<Article> {
    let records = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(page) => match page.get("records").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    records
        .iter()
        .filter_map(|record| match normalize_record(record) {
            Ok(article) => Some(article),
            Err(e) => {
                log::warn!("Skipping article record: {}", e);
                None
            }
        })
        .collect()
}

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(fields, keys)? {
        // Single-select columns sometimes come back as one-element lists
        Value::Array(items) => items.iter().find_map(scalar_text),
        other => scalar_text(other),
    }
}

fn content_field(fields: &Map<String, Value>) -> Option<String> {
    match lookup(fields, CONTENT_KEYS)? {
        Value::String(s) => Some(s.clone()),
        structured @ (Value::Array(_) | Value::Object(_)) => Some(structured.to_string()),
        _ => None,
    }
}

fn image_field(fields: &Map<String, Value>) -> Option<String> {
    match lookup(fields, IMAGE_KEYS)? {
        Value::String(url) if !url.trim().is_empty() => Some(url.clone()),
        // Attachment columns: [{ "url": "...", ... }]
        Value::Array(attachments) => attachments.iter().find_map(|attachment| {
            attachment
                .get("url")
                .and_then(Value::as_str)
                .map(str::to_string)
        }),
        Value::Object(attachment) => attachment
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn tags_field(fields: &Map<String, Value>) -> Vec<String> {
    match lookup(fields, TAG_KEYS) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Column names the hosted table uses, for the write path.
pub fn draft_to_fields(draft: &ArticleDraft) -> Map<String, Value> {
    let mut fields = Map::new();
    let mut put = |name: &str, value: &Option<String>| {
        if let Some(value) = value {
            fields.insert(name.to_string(), Value::String(value.clone()));
        }
    };

    put("Title", &draft.title);
    put("Date", &draft.date);
    put("Author", &draft.author);
    put("Excerpt", &draft.excerpt);
    put("Image url", &draft.image);
    put("Category", &draft.category);
    put("Content", &draft.content);
    put("Read time", &draft.read_time);
    put("Resource Type", &draft.resource_type);
    put("Industry", &draft.industry);

    if !draft.tags.is_empty() {
        fields.insert(
            "Tags".to_string(),
            Value::Array(draft.tags.iter().cloned().map(Value::String).collect()),
        );
    }

    fields
}
