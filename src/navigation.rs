//! Where the reader was in the list: page, filters and scroll offset.
//!
//! One instance lives for the whole browsing session and is shared by the
//! list and detail views, so leaving for an article and coming back lands
//! on the same page with the same filters at the same scroll position.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Time given to the list to lay itself out before the saved offset is
/// applied.
pub const DEFAULT_RESTORE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleFilters {
    pub search_term: String,
    pub selected_types: BTreeSet<String>,
    pub selected_categories: BTreeSet<String>,
    pub selected_industries: BTreeSet<String>,
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

impl ArticleFilters {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn toggle_type(&mut self, value: &str) {
        toggle(&mut self.selected_types, value);
    }

    pub fn toggle_category(&mut self, value: &str) {
        toggle(&mut self.selected_categories, value);
    }

    pub fn toggle_industry(&mut self, value: &str) {
        toggle(&mut self.selected_industries, value);
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// True when any clause narrows the list.
    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty()
            || !self.selected_types.is_empty()
            || !self.selected_categories.is_empty()
            || !self.selected_industries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRestore {
    offset: u32,
    due: Instant,
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    current_page: usize,
    filters: ArticleFilters,
    scroll_position: u32,
    restore_delay: Duration,
    pending_restore: Option<PendingRestore>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new(DEFAULT_RESTORE_DELAY)
    }
}

impl NavigationState {
    pub fn new(restore_delay: Duration) -> Self {
        Self {
            current_page: 1,
            filters: ArticleFilters::default(),
            scroll_position: 0,
            restore_delay,
            pending_restore: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Pages are 1-based; anything below 1 is stored as 1. Clamping to the
    /// last page is the list view's job since only it knows the count.
    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn filters(&self) -> &ArticleFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: ArticleFilters) {
        self.filters = filters;
    }

    pub fn scroll_position(&self) -> u32 {
        self.scroll_position
    }

    /// Remember the viewport's vertical offset before leaving the list.
    pub fn save_scroll_position(&mut self, viewport_offset: f32) {
        self.scroll_position = if viewport_offset.is_finite() && viewport_offset > 0.0 {
            viewport_offset.round() as u32
        } else {
            0
        };
        log::debug!("Saved scroll position: {}", self.scroll_position);
    }

    /// Schedule a one-shot jump back to the saved offset once the list has
    /// had `restore_delay` to render. The saved offset is kept, so calling
    /// this again is harmless.
    pub fn restore_scroll_position(&mut self, now: Instant) {
        if self.scroll_position == 0 {
            return;
        }
        log::debug!("Restoring scroll position: {}", self.scroll_position);
        self.pending_restore = Some(PendingRestore {
            offset: self.scroll_position,
            due: now + self.restore_delay,
        });
    }

    /// The offset to jump to, once, when the scheduled restore is due.
    pub fn take_due_restore(&mut self, now: Instant) -> Option<u32> {
        match self.pending_restore {
            Some(pending) if now >= pending.due => {
                self.pending_restore = None;
                Some(pending.offset)
            }
            _ => None,
        }
    }

    /// How long until the scheduled restore fires, for repaint scheduling.
    pub fn restore_pending_in(&self, now: Instant) -> Option<Duration> {
        self.pending_restore
            .map(|pending| pending.due.saturating_duration_since(now))
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.restore_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_first_page_with_nothing_selected() {
        let nav = NavigationState::default();
        assert_eq!(nav.current_page(), 1);
        assert_eq!(nav.scroll_position(), 0);
        assert!(!nav.filters().is_active());
    }

    #[test]
    fn page_never_drops_below_one() {
        let mut nav = NavigationState::default();
        nav.set_current_page(0);
        assert_eq!(nav.current_page(), 1);
        nav.set_current_page(4);
        assert_eq!(nav.current_page(), 4);
    }

    #[test]
    fn scroll_round_trip_restores_saved_offset_after_delay() {
        let mut nav = NavigationState::default();
        let start = Instant::now();

        nav.save_scroll_position(500.0);
        nav.restore_scroll_position(start);

        assert_eq!(nav.take_due_restore(start), None);
        assert_eq!(nav.take_due_restore(start + Duration::from_millis(100)), Some(500));
        // One-shot
        assert_eq!(nav.take_due_restore(start + Duration::from_millis(200)), None);
        // The saved value stays, so a second restore works again
        assert_eq!(nav.scroll_position(), 500);
        nav.restore_scroll_position(start);
        assert_eq!(nav.take_due_restore(start + Duration::from_secs(1)), Some(500));
    }

    #[test]
    fn nothing_is_scheduled_for_a_zero_offset() {
        let mut nav = NavigationState::default();
        let now = Instant::now();

        nav.save_scroll_position(-12.0);
        nav.restore_scroll_position(now);

        assert_eq!(nav.scroll_position(), 0);
        assert_eq!(nav.restore_pending_in(now), None);
        assert_eq!(nav.take_due_restore(now + Duration::from_secs(1)), None);
    }

    #[test]
    fn restore_delay_is_configurable() {
        let mut nav = NavigationState::new(Duration::from_millis(10));
        let now = Instant::now();

        nav.save_scroll_position(42.4);
        nav.restore_scroll_position(now);

        assert_eq!(nav.restore_pending_in(now), Some(Duration::from_millis(10)));
        assert_eq!(nav.take_due_restore(now + Duration::from_millis(10)), Some(42));
    }

    #[test]
    fn filter_toggles_add_and_remove() {
        let mut filters = ArticleFilters::default();
        filters.toggle_type("Webinars");
        filters.toggle_category("Strategy");
        assert!(filters.is_active());

        filters.toggle_type("Webinars");
        assert!(filters.selected_types.is_empty());
        assert!(filters.selected_categories.contains("Strategy"));

        filters.clear_all();
        assert_eq!(filters, ArticleFilters::default());
    }

    #[test]
    fn any_typed_search_is_an_active_filter() {
        assert!(!ArticleFilters::default().with_search("").is_active());
        assert!(ArticleFilters::default().with_search("   ").is_active());
    }

    #[test]
    fn reset_keeps_the_restore_delay() {
        let mut nav = NavigationState::new(Duration::from_millis(5));
        nav.set_current_page(3);
        nav.save_scroll_position(80.0);
        nav.reset();

        assert_eq!(nav.current_page(), 1);
        assert_eq!(nav.scroll_position(), 0);
        nav.save_scroll_position(10.0);
        let now = Instant::now();
        nav.restore_scroll_position(now);
        assert_eq!(nav.restore_pending_in(now), Some(Duration::from_millis(5)));
    }
}
