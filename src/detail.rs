use crate::cache::ContentCache;
use crate::content::{parse_sections, Section};
use crate::error::{ContentError, Result};
use crate::gateway::ContentGateway;
use crate::models::Article;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Ready(Article),
    NotFound,
    Failed(String),
}

impl From<Result<Article>> for DetailState {
    fn from(result: Result<Article>) -> Self {
        match result {
            Ok(article) => Self::Ready(article),
            Err(e) if e.is_not_found() => Self::NotFound,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// State of the single-article screen.
#[derive(Debug, Clone)]
pub struct DetailView {
    article_id: String,
    state: DetailState,
    sections: Vec<Section>,
}

impl DetailView {
    pub fn open(article_id: impl Into<String>) -> Self {
        Self {
            article_id: article_id.into(),
            state: DetailState::Loading,
            sections: Vec::new(),
        }
    }

    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn article(&self) -> Option<&Article> {
        match &self.state {
            DetailState::Ready(article) => Some(article),
            _ => None,
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Resolve an article through the cache into a display state.
    pub async fn load(cache: &ContentCache, article_id: &str, force_refresh: bool) -> DetailState {
        let result = cache.get_one(article_id, force_refresh).await;
        if let Err(e) = &result {
            log::warn!("Error fetching article {}: {}", article_id, e);
        }
        DetailState::from(result)
    }

    /// Apply a load result. Results for an article other than the one on
    /// screen are dropped; returns whether the state changed.
    pub fn apply(&mut self, article_id: &str, state: DetailState) -> bool {
        if article_id != self.article_id {
            log::debug!("Ignoring late result for article {}", article_id);
            return false;
        }

        self.sections = match &state {
            DetailState::Ready(article) => parse_sections(article.content.as_deref().unwrap_or("")),
            _ => Vec::new(),
        };
        self.state = state;
        true
    }

    /// Show the loading state again, e.g. before a forced reload.
    pub fn reload(&mut self) {
        self.state = DetailState::Loading;
        self.sections.clear();
    }
}

/// Persist a delete and hand back the id. Callers evict it from the cache
/// and from any list they hold; the cache does not learn about it on its own.
pub async fn delete_article(gateway: &dyn ContentGateway, article_id: &str) -> Result<String> {
    gateway.delete_article(article_id).await?;
    log::info!("Deleted article {}", article_id);
    Ok(article_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListView;
    use crate::mock_gateway::{article, MockGateway};
    use std::sync::Arc;

    #[tokio::test]
    async fn ready_state_carries_article_and_sections() {
        let mut stored = article("1", "AI Basics");
        stored.content = Some(r#"[{"type": "paragraph", "content": {"text": "Hello"}}]"#.into());
        let gateway = Arc::new(MockGateway::with_articles(vec![stored]));
        let cache = ContentCache::new(gateway);

        let mut view = DetailView::open("1");
        assert_eq!(view.state(), &DetailState::Loading);

        let state = DetailView::load(&cache, "1", false).await;
        assert!(view.apply("1", state));

        assert_eq!(view.article().unwrap().display_title(), "AI Basics");
        assert_eq!(view.sections(), &[Section::Paragraph("Hello".into())]);
    }

    #[tokio::test]
    async fn missing_article_is_not_found_rather_than_failed() {
        let cache = ContentCache::new(Arc::new(MockGateway::default()));

        let state = DetailView::load(&cache, "missing", false).await;
        assert_eq!(state, DetailState::NotFound);
    }

    #[tokio::test]
    async fn transport_failure_is_failed() {
        let gateway = Arc::new(MockGateway::with_articles(vec![article("1", "One")]));
        gateway.fail_get(true);
        let cache = ContentCache::new(gateway);

        let state = DetailView::load(&cache, "1", false).await;
        assert_eq!(state, DetailState::Failed("Fetch error: connection reset".into()));
    }

    #[test]
    fn late_results_for_another_article_are_ignored() {
        let mut view = DetailView::open("2");

        assert!(!view.apply("1", DetailState::Ready(article("1", "Old"))));
        assert_eq!(view.state(), &DetailState::Loading);

        assert!(view.apply("2", DetailState::NotFound));
        assert_eq!(view.state(), &DetailState::NotFound);
        assert!(view.article().is_none());
    }

    #[tokio::test]
    async fn delete_leaves_eviction_to_the_caller() {
        let gateway = Arc::new(MockGateway::with_articles(vec![article("1", "One"), article("2", "Two")]));
        let cache = ContentCache::new(gateway.clone());
        let mut list = ListView::default();
        list.finish_loading(cache.get_list(false).await);

        let deleted = delete_article(gateway.as_ref(), "1").await.unwrap();
        // Still cached until told otherwise
        assert_eq!(cache.get_list(false).await.len(), 2);

        cache.remove_one(&deleted);
        list.remove_article(&deleted);
        assert_eq!(cache.get_list(false).await.len(), 1);
        assert_eq!(list.articles().len(), 1);
        assert!(gateway.stored("1").is_none());
    }

    #[tokio::test]
    async fn failed_delete_is_reported() {
        let gateway = Arc::new(MockGateway::with_articles(vec![article("1", "One")]));
        gateway.fail_writes(true);

        let err = delete_article(gateway.as_ref(), "1").await.unwrap_err();
        assert!(matches!(err, ContentError::Gateway { status: Some(500), .. }));
    }
}
