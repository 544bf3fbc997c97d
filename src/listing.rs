//! Filtering and pagination for the article grid.
//!
//! Everything here is computed locally from the cached full list; the
//! store is never asked to filter. The pure functions take the list and
//! the navigation state by reference and change neither.

use crate::cache::ContentCache;
use crate::models::Article;
use crate::navigation::{ArticleFilters, NavigationState};

pub const PAGE_SIZE: usize = 9;

/// Options shown before "Show more" expands a facet.
pub const VISIBLE_FACET_OPTIONS: usize = 6;

pub const TYPE_OPTIONS: &[&str] = &[
    "Case Studies",
    "Courses",
    "Podcasts",
    "Tech",
    "Use Cases",
    "Webinars",
    "Research",
    "Tutorials",
];

pub const CATEGORY_OPTIONS: &[&str] = &[
    "Technology",
    "Analytics",
    "Comms & PR",
    "Content",
    "Strategy",
    "Implementation",
    "Best Practices",
];

pub const INDUSTRY_OPTIONS: &[&str] = &[
    "Healthcare",
    "Marketing Agencies",
    "Media",
    "Recreation",
    "Retail",
    "Software",
    "Transportation",
    "Travel",
    "Finance",
    "Education",
];

fn contains_term(field: &Option<String>, term: &str) -> bool {
    field
        .as_deref()
        .is_some_and(|value| value.to_lowercase().contains(term))
}

fn in_selection(selection: &std::collections::BTreeSet<String>, value: &Option<String>) -> bool {
    selection.is_empty() || value.as_ref().is_some_and(|v| selection.contains(v))
}

/// Search matches title, excerpt or author case-insensitively; each facet
/// passes when nothing is selected in it.
pub fn matches(article: &Article, filters: &ArticleFilters) -> bool {
    // Matched as typed, surrounding whitespace included
    let term = filters.search_term.to_lowercase();
    let matches_search = term.is_empty()
        || contains_term(&article.title, &term)
        || contains_term(&article.excerpt, &term)
        || contains_term(&article.author, &term);

    matches_search
        && in_selection(&filters.selected_types, &article.resource_type)
        && in_selection(&filters.selected_categories, &article.category)
        && in_selection(&filters.selected_industries, &article.industry)
}

pub fn filter_articles<'a>(articles: &'a [Article], filters: &ArticleFilters) -> Vec<&'a Article> {
    articles.iter().filter(|a| matches(a, filters)).collect()
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// Keep `page` inside `[1, max(1, total_pages)]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Items on 1-based `page`. Pages past the end are empty, never a panic.
pub fn paginate<'a, T>(items: &'a [T], page: usize, page_size: usize) -> &'a [T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    /// The store has no articles at all
    NoContent,
    /// Articles exist but the filters exclude all of them
    NoMatches,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<'a> {
    pub status: ListStatus,
    pub items: Vec<&'a Article>,
    pub page: usize,
    pub total_pages: usize,
    pub match_count: usize,
    pub total_count: usize,
}

/// The list view's own copy of the article list plus its loading flag.
#[derive(Debug, Clone)]
pub struct ListView {
    articles: Vec<Article>,
    loading: bool,
    page_size: usize,
}

impl Default for ListView {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl ListView {
    pub fn new(page_size: usize) -> Self {
        Self {
            articles: Vec::new(),
            loading: true,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    pub fn finish_loading(&mut self, articles: Vec<Article>) {
        self.articles = articles;
        self.loading = false;
    }

    fn page_count(&self, filters: &ArticleFilters) -> usize {
        let count = self.articles.iter().filter(|a| matches(a, filters)).count();
        total_pages(count, self.page_size)
    }

    /// Everything the grid needs for the current navigation state. The page
    /// shown is clamped, but the stored page is left alone.
    pub fn snapshot<'a>(&'a self, nav: &NavigationState) -> ListSnapshot<'a> {
        let filtered = filter_articles(&self.articles, nav.filters());
        let total_pages = total_pages(filtered.len(), self.page_size);
        let page = clamp_page(nav.current_page(), total_pages);
        let items = paginate(&filtered, page, self.page_size).to_vec();

        let status = if self.loading {
            ListStatus::Loading
        } else if self.articles.is_empty() {
            ListStatus::NoContent
        } else if filtered.is_empty() {
            ListStatus::NoMatches
        } else {
            ListStatus::Results
        };

        ListSnapshot {
            status,
            items,
            page,
            total_pages,
            match_count: filtered.len(),
            total_count: self.articles.len(),
        }
    }

    /// Replace the filters and pull the page back inside the new range, so
    /// narrowing never leaves the reader on a blank page.
    pub fn set_filters(&self, nav: &mut NavigationState, filters: ArticleFilters) {
        let total = self.page_count(&filters);
        nav.set_filters(filters);
        if nav.current_page() > total.max(1) {
            nav.set_current_page(total.max(1));
        }
    }

    /// Apply an edit to the current filters.
    pub fn update_filters<F>(&self, nav: &mut NavigationState, edit: F)
    where
        F: FnOnce(&mut ArticleFilters),
    {
        let mut filters = nav.filters().clone();
        edit(&mut filters);
        self.set_filters(nav, filters);
    }

    pub fn go_to_page(&self, nav: &mut NavigationState, page: usize) {
        let total = self.page_count(nav.filters());
        nav.set_current_page(clamp_page(page, total));
    }

    /// Step one page from the page actually shown, which can sit below
    /// the stored one after the list shrank.
    pub fn step_page(&self, nav: &mut NavigationState, forward: bool) {
        let total = self.page_count(nav.filters());
        let shown = clamp_page(nav.current_page(), total);
        let target = if forward { shown + 1 } else { shown.saturating_sub(1) };
        nav.set_current_page(clamp_page(target, total));
    }

    /// Remember where the reader is and return the id to open.
    pub fn select_article(&self, nav: &mut NavigationState, id: &str, viewport_offset: f32) -> String {
        nav.save_scroll_position(viewport_offset);
        id.to_string()
    }

    pub fn return_from_detail(&self, nav: &mut NavigationState, now: std::time::Instant) {
        nav.restore_scroll_position(now);
    }

    /// Forget everything fetched along with where the reader was, so the
    /// next load starts from the top of a fresh list.
    pub fn reset_session(&mut self, cache: &ContentCache, nav: &mut NavigationState) {
        cache.clear();
        nav.reset();
        self.articles.clear();
        self.loading = true;
    }

    /// Drop a deleted article from the list this view holds.
    pub fn remove_article(&mut self, id: &str) {
        self.articles.retain(|a| a.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_gateway::{article, MockGateway};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn tagged(id: &str, title: &str, kind: &str) -> Article {
        Article {
            id: id.into(),
            title: Some(title.into()),
            resource_type: Some(kind.into()),
            ..Default::default()
        }
    }

    fn numbered(count: usize) -> Vec<Article> {
        (1..=count)
            .map(|n| tagged(&n.to_string(), &format!("Article {}", n), "Tech"))
            .collect()
    }

    fn loaded(articles: Vec<Article>) -> ListView {
        let mut view = ListView::default();
        view.finish_loading(articles);
        view
    }

    fn titles(items: &[&Article]) -> Vec<String> {
        items.iter().map(|a| a.display_title().to_string()).collect()
    }

    #[test]
    fn search_and_type_filters_compose() {
        let articles = vec![tagged("1", "AI Basics", "Tech"), tagged("2", "Growth", "Webinars")];

        let search = ArticleFilters::default().with_search("ai");
        assert_eq!(titles(&filter_articles(&articles, &search)), vec!["AI Basics"]);

        let mut webinars = ArticleFilters::default();
        webinars.toggle_type("Webinars");
        assert_eq!(titles(&filter_articles(&articles, &webinars)), vec!["Growth"]);

        let mut impossible = webinars.clone().with_search("ai");
        assert!(filter_articles(&articles, &impossible).is_empty());

        impossible.clear_all();
        assert_eq!(filter_articles(&articles, &impossible).len(), 2);
    }

    #[test]
    fn search_covers_excerpt_and_author() {
        let mut article = tagged("1", "Quarterly notes", "Research");
        article.excerpt = Some("What LLMs changed".into());
        article.author = Some("Jordan Vega".into());

        assert!(matches(&article, &ArticleFilters::default().with_search("llm")));
        assert!(matches(&article, &ArticleFilters::default().with_search("VEGA")));
        assert!(!matches(&article, &ArticleFilters::default().with_search("podcast")));
    }

    #[test]
    fn search_term_is_not_trimmed() {
        let mut article = tagged("1", "Quarterly notes", "Research");
        article.author = Some("Jordan Vega".into());

        assert!(matches(&article, &ArticleFilters::default().with_search(" vega")));
        assert!(!matches(&article, &ArticleFilters::default().with_search("vega ")));
        assert!(!matches(&article, &ArticleFilters::default().with_search("   ")));
        assert!(matches(&article, &ArticleFilters::default().with_search("")));
    }

    #[test]
    fn facet_requires_a_value_when_selected() {
        let untyped = Article::new("1");
        let mut filters = ArticleFilters::default();
        assert!(matches(&untyped, &filters));

        filters.toggle_industry("Retail");
        assert!(!matches(&untyped, &filters));
    }

    #[test]
    fn pagination_splits_ten_into_nine_and_one() {
        let articles = numbered(10);
        assert_eq!(total_pages(articles.len(), PAGE_SIZE), 2);
        assert_eq!(paginate(&articles, 1, PAGE_SIZE).len(), 9);
        assert_eq!(paginate(&articles, 2, PAGE_SIZE).len(), 1);
        assert_eq!(paginate(&articles, 2, PAGE_SIZE)[0].id, "10");
        assert!(paginate(&articles, 3, PAGE_SIZE).is_empty());
        assert!(paginate(&articles, usize::MAX, PAGE_SIZE).is_empty());
    }

    #[test]
    fn clamp_page_handles_empty_results() {
        assert_eq!(clamp_page(3, 2), 2);
        assert_eq!(clamp_page(0, 2), 1);
        assert_eq!(clamp_page(5, 0), 1);
    }

    #[test]
    fn snapshot_clamps_an_out_of_range_page() {
        let view = loaded(numbered(10));
        let mut nav = NavigationState::default();
        nav.set_current_page(3);

        let snapshot = view.snapshot(&nav);
        assert_eq!(snapshot.page, 2);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.total_pages, 2);
        assert_eq!(snapshot.status, ListStatus::Results);
        // Snapshot is read-only
        assert_eq!(nav.current_page(), 3);
    }

    #[test]
    fn narrowing_filters_pulls_the_page_back() {
        let mut articles = numbered(20);
        articles[0].resource_type = Some("Webinars".into());
        let view = loaded(articles);
        let mut nav = NavigationState::default();
        view.go_to_page(&mut nav, 3);
        assert_eq!(nav.current_page(), 3);

        view.update_filters(&mut nav, |f| f.toggle_type("Webinars"));
        assert_eq!(nav.current_page(), 1);
        assert_eq!(view.snapshot(&nav).items.len(), 1);
    }

    #[test]
    fn widening_filters_keeps_the_page() {
        let view = loaded(numbered(20));
        let mut nav = NavigationState::default();
        view.go_to_page(&mut nav, 2);

        view.update_filters(&mut nav, |f| f.search_term = "article".into());
        assert_eq!(nav.current_page(), 2);
    }

    #[test]
    fn go_to_page_clamps_to_available_pages() {
        let view = loaded(numbered(10));
        let mut nav = NavigationState::default();

        view.go_to_page(&mut nav, 7);
        assert_eq!(nav.current_page(), 2);
        view.go_to_page(&mut nav, 0);
        assert_eq!(nav.current_page(), 1);
    }

    #[test]
    fn stepping_back_starts_from_the_shown_page() {
        let mut view = loaded(numbered(45));
        let mut nav = NavigationState::default();
        view.go_to_page(&mut nav, 5);

        // A refresh shrinks the list to two pages; page 5 is shown as 2
        view.finish_loading(numbered(10));
        assert_eq!(view.snapshot(&nav).page, 2);

        view.step_page(&mut nav, false);
        assert_eq!(nav.current_page(), 1);
        view.step_page(&mut nav, false);
        assert_eq!(nav.current_page(), 1);
        view.step_page(&mut nav, true);
        view.step_page(&mut nav, true);
        assert_eq!(nav.current_page(), 2);
    }

    #[tokio::test]
    async fn reset_session_clears_cache_and_position() {
        let gateway = Arc::new(MockGateway::with_articles(vec![article("1", "One")]));
        let cache = ContentCache::new(gateway.clone());
        let mut view = loaded(cache.get_list(false).await);
        let mut nav = NavigationState::default();
        view.update_filters(&mut nav, |f| f.toggle_type("Tech"));
        nav.save_scroll_position(500.0);

        view.reset_session(&cache, &mut nav);

        assert!(view.is_loading());
        assert!(view.articles().is_empty());
        assert_eq!(nav.scroll_position(), 0);
        assert_eq!(nav.current_page(), 1);
        assert!(!nav.filters().is_active());

        cache.get_list(false).await;
        assert_eq!(gateway.list_calls(), 2);
    }

    #[test]
    fn empty_states_are_distinct() {
        let nav = NavigationState::default();
        assert_eq!(ListView::default().snapshot(&nav).status, ListStatus::Loading);
        assert_eq!(loaded(Vec::new()).snapshot(&nav).status, ListStatus::NoContent);

        let view = loaded(numbered(3));
        let mut nav = NavigationState::default();
        view.update_filters(&mut nav, |f| f.search_term = "nothing like this".into());
        let snapshot = view.snapshot(&nav);
        assert_eq!(snapshot.status, ListStatus::NoMatches);
        assert_eq!(snapshot.total_pages, 0);
        assert_eq!(snapshot.page, 1);
        assert!(snapshot.items.is_empty());
    }

    #[test]
    fn selecting_and_returning_restores_scroll() {
        let view = loaded(numbered(3));
        let mut nav = NavigationState::default();
        let now = Instant::now();

        let opened = view.select_article(&mut nav, "2", 500.0);
        assert_eq!(opened, "2");

        view.return_from_detail(&mut nav, now);
        assert_eq!(nav.take_due_restore(now + Duration::from_millis(150)), Some(500));
    }

    #[test]
    fn removing_a_deleted_article_updates_the_view() {
        let mut view = loaded(numbered(3));
        view.remove_article("2");

        let ids: Vec<&str> = view.articles().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
