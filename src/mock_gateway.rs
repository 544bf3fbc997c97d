//! In-memory gateway for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ContentError, Result};
use crate::gateway::ContentGateway;
use crate::models::{Article, ArticleDraft};

pub fn article(id: &str, title: &str) -> Article {
    Article {
        id: id.to_string(),
        title: Some(title.to_string()),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct MockGateway {
    articles: Mutex<Vec<Article>>,
    delay: Option<Duration>,
    list_calls: AtomicUsize,
    get_calls: Mutex<HashMap<String, usize>>,
    next_id: AtomicUsize,
    fail_list: AtomicBool,
    fail_get: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockGateway {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles: Mutex::new(articles),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the stored copy of an article, or append it.
    pub fn put(&self, article: Article) {
        let mut articles = self.articles.lock().unwrap();
        match articles.iter_mut().find(|a| a.id == article.id) {
            Some(slot) => *slot = article,
            None => articles.push(article),
        }
    }

    pub fn stored(&self, id: &str) -> Option<Article> {
        self.articles.lock().unwrap().iter().find(|a| a.id == id).cloned()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self, id: &str) -> usize {
        self.get_calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ContentError::gateway(Some(500), "write rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentGateway for MockGateway {
    async fn list_articles(&self) -> Result<Vec<Article>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ContentError::gateway(Some(500), "Failed to fetch articles"));
        }
        Ok(self.articles.lock().unwrap().clone())
    }

    async fn get_article(&self, id: &str) -> Result<Article> {
        *self.get_calls.lock().unwrap().entry(id.to_string()).or_default() += 1;
        self.pause().await;

        if self.fail_get.load(Ordering::SeqCst) {
            return Err(ContentError::Fetch("connection reset".into()));
        }
        self.stored(id)
            .ok_or_else(|| ContentError::NotFound { id: id.to_string() })
    }

    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article> {
        self.check_writes()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = draft.clone().into_article(format!("rec{}", n));
        self.articles.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn update_article(&self, id: &str, draft: &ArticleDraft) -> Result<Article> {
        self.check_writes()?;
        if self.stored(id).is_none() {
            return Err(ContentError::NotFound { id: id.to_string() });
        }
        let updated = draft.clone().into_article(id);
        self.put(updated.clone());
        Ok(updated)
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        self.check_writes()?;
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.id != id);
        if articles.len() == before {
            return Err(ContentError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
