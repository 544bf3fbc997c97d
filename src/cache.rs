//! Session-wide article cache sitting in front of a [`ContentGateway`].
//!
//! Two views of the same data are kept: a per-id entry map (detail view)
//! and the full unfiltered list (list view). Fetches are coalesced per key:
//! while a fetch for a key is in flight, later callers attach to the same
//! shared future instead of issuing another request.
//!
//! Every fetch and every local write draws a ticket from one monotonic
//! counter. A fetch result only lands if no local write to the same slot
//! (and no `clear`) happened after the fetch started, so a slow response
//! cannot clobber fresher data.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ContentError, Result};
use crate::gateway::ContentGateway;
use crate::models::Article;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

struct InFlight<T> {
    ticket: u64,
    fetch: SharedFetch<T>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Article>,
    // Ticket of the last write per id, removals included
    writes: HashMap<String, u64>,
    list: Option<Vec<Article>>,
    list_fetch: Option<InFlight<Vec<Article>>>,
    item_fetches: HashMap<String, InFlight<Article>>,
    next_ticket: u64,
    cleared_at: u64,
}

impl CacheState {
    fn ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn written_after(&self, id: &str, ticket: u64) -> bool {
        self.writes.get(id).is_some_and(|&written| written > ticket)
    }

    fn settle_list(&mut self, ticket: u64, fetched: Vec<Article>) -> Vec<Article> {
        if ticket < self.cleared_at {
            // Cache was cleared while this was in flight; hand the data
            // to the waiting callers but do not repopulate.
            return fetched;
        }

        // Listed locally after the fetch started but unknown to the store
        // yet, e.g. just published: keep them on top.
        let mut list: Vec<Article> = self
            .list
            .iter()
            .flatten()
            .filter(|local| {
                self.written_after(&local.id, ticket) && !fetched.iter().any(|a| a.id == local.id)
            })
            .cloned()
            .collect();

        for article in fetched {
            if self.written_after(&article.id, ticket) {
                // Locally written since the fetch started: keep the local
                // copy, or drop it if it was removed.
                if let Some(local) = self.entries.get(&article.id) {
                    list.push(local.clone());
                }
                continue;
            }
            if self.entries.contains_key(&article.id) {
                self.entries.insert(article.id.clone(), article.clone());
                self.writes.insert(article.id.clone(), ticket);
            }
            list.push(article);
        }

        self.list = Some(list.clone());
        list
    }

    fn settle_item(&mut self, ticket: u64, id: &str, fetched: Article) -> Result<Article> {
        if ticket < self.cleared_at {
            return Ok(fetched);
        }
        if self.written_after(id, ticket) {
            log::debug!("Discarding stale fetch for article {}", id);
            return self
                .entries
                .get(id)
                .cloned()
                .ok_or_else(|| ContentError::NotFound { id: id.to_string() });
        }

        self.entries.insert(id.to_string(), fetched.clone());
        self.writes.insert(id.to_string(), ticket);
        if let Some(list) = self.list.as_mut() {
            if let Some(slot) = list.iter_mut().find(|a| a.id == id) {
                *slot = fetched.clone();
            }
        }
        Ok(fetched)
    }
}

pub struct ContentCache {
    gateway: Arc<dyn ContentGateway>,
    state: Arc<Mutex<CacheState>>,
}

fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    // Every critical section leaves the state consistent, so a poisoned
    // lock is still safe to use.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ContentCache {
    pub fn new(gateway: Arc<dyn ContentGateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        lock_state(&self.state)
    }

    /// Full article list. Served from cache unless `force_refresh`; list
    /// failures are logged and reported as an empty list.
    pub async fn get_list(&self, force_refresh: bool) -> Vec<Article> {
        let fetch = {
            let mut state = self.lock();

            if !force_refresh {
                if let Some(list) = &state.list {
                    log::debug!("Using cached article list ({} items)", list.len());
                    return list.clone();
                }
            }

            match &state.list_fetch {
                Some(in_flight) => {
                    log::debug!("Article list fetch already in progress, attaching");
                    in_flight.fetch.clone()
                }
                None => {
                    let ticket = state.ticket();
                    let fetch = self.list_fetch(ticket);
                    state.list_fetch = Some(InFlight {
                        ticket,
                        fetch: fetch.clone(),
                    });
                    fetch
                }
            }
        };

        match fetch.await {
            Ok(list) => list,
            Err(e) => {
                log::warn!("Error fetching articles: {}", e);
                Vec::new()
            }
        }
    }

    /// One article by id. Served from cache unless `force_refresh`.
    pub async fn get_one(&self, id: &str, force_refresh: bool) -> Result<Article> {
        let fetch = {
            let mut state = self.lock();

            if !force_refresh {
                if let Some(article) = state.entries.get(id) {
                    log::debug!("Using cached article {}", id);
                    return Ok(article.clone());
                }
            }

            match state.item_fetches.get(id) {
                Some(in_flight) => {
                    log::debug!("Fetch for article {} already in progress, attaching", id);
                    in_flight.fetch.clone()
                }
                None => {
                    let ticket = state.ticket();
                    let fetch = self.item_fetch(ticket, id.to_string());
                    state.item_fetches.insert(
                        id.to_string(),
                        InFlight {
                            ticket,
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Overwrite a cached article and its list position, if listed. Does
    /// not add it to the list.
    pub fn upsert_one(&self, article: Article) {
        let mut state = self.lock();
        let ticket = state.ticket();

        if let Some(list) = state.list.as_mut() {
            if let Some(slot) = list.iter_mut().find(|a| a.id == article.id) {
                *slot = article.clone();
            }
        }

        state.writes.insert(article.id.clone(), ticket);
        state.entries.insert(article.id.clone(), article);
    }

    /// Cache a newly created article and put it at the front of the list.
    pub fn add_one(&self, article: Article) {
        let mut state = self.lock();
        let ticket = state.ticket();

        if let Some(list) = state.list.as_mut() {
            list.retain(|a| a.id != article.id);
            list.insert(0, article.clone());
        }

        state.writes.insert(article.id.clone(), ticket);
        state.entries.insert(article.id.clone(), article);
    }

    pub fn remove_one(&self, id: &str) {
        let mut state = self.lock();
        let ticket = state.ticket();

        state.entries.remove(id);
        state.writes.insert(id.to_string(), ticket);
        if let Some(list) = state.list.as_mut() {
            list.retain(|a| a.id != id);
        }
    }

    /// Drop everything, including in-flight bookkeeping. Fetches still
    /// running finish for their callers but no longer write back.
    pub fn clear(&self) {
        let mut state = self.lock();
        let ticket = state.ticket();

        state.entries.clear();
        state.writes.clear();
        state.list = None;
        state.list_fetch = None;
        state.item_fetches.clear();
        state.cleared_at = ticket;
        log::debug!("Cleared article caches");
    }

    pub fn is_fetching_list(&self) -> bool {
        self.lock().list_fetch.is_some()
    }

    pub fn is_fetching(&self, id: &str) -> bool {
        self.lock().item_fetches.contains_key(id)
    }

    fn list_fetch(&self, ticket: u64) -> SharedFetch<Vec<Article>> {
        let gateway = Arc::clone(&self.gateway);
        let shared = Arc::clone(&self.state);

        async move {
            log::debug!("Fetching article list from gateway");
            let result = gateway.list_articles().await;

            let mut state = lock_state(&shared);
            if state.list_fetch.as_ref().map(|f| f.ticket) == Some(ticket) {
                state.list_fetch = None;
            }
            result.map(|fetched| state.settle_list(ticket, fetched))
        }
        .boxed()
        .shared()
    }

    fn item_fetch(&self, ticket: u64, id: String) -> SharedFetch<Article> {
        let gateway = Arc::clone(&self.gateway);
        let shared = Arc::clone(&self.state);

        async move {
            log::debug!("Fetching article {} from gateway", id);
            let result = gateway.get_article(&id).await;

            let mut state = lock_state(&shared);
            if state.item_fetches.get(&id).map(|f| f.ticket) == Some(ticket) {
                state.item_fetches.remove(&id);
            }
            result.and_then(|fetched| state.settle_item(ticket, &id, fetched))
        }
        .boxed()
        .shared()
    }
}
