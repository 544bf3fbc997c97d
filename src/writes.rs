//! Write path: persist through the gateway first, then tell the cache.

use crate::cache::ContentCache;
use crate::error::Result;
use crate::gateway::ContentGateway;
use crate::models::{Article, ArticleDraft};

pub async fn publish_article(
    gateway: &dyn ContentGateway,
    cache: &ContentCache,
    draft: &ArticleDraft,
) -> Result<Article> {
    draft.validate()?;
    let created = gateway.create_article(draft).await?;
    log::info!("Published article {}", created.id);
    cache.add_one(created.clone());
    Ok(created)
}

pub async fn save_article(
    gateway: &dyn ContentGateway,
    cache: &ContentCache,
    article_id: &str,
    draft: &ArticleDraft,
) -> Result<Article> {
    draft.validate()?;
    let updated = gateway.update_article(article_id, draft).await?;
    log::info!("Saved article {}", updated.id);
    cache.upsert_one(updated.clone());
    Ok(updated)
}
