use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui, ViewportBuilder};
use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

use insights_reader::client::AirtableGateway;
use insights_reader::config::Config;
use insights_reader::content::Section;
use insights_reader::detail::{self, DetailState, DetailView};
use insights_reader::listing::{
    ListStatus, ListView, CATEGORY_OPTIONS, INDUSTRY_OPTIONS, TYPE_OPTIONS, VISIBLE_FACET_OPTIONS,
};
use insights_reader::{Article, ArticleFilters, ContentCache, ContentError, ContentGateway, NavigationState};

const APP_TITLE: &str = "Articles & Insights";
const GRID_COLUMNS: usize = 3;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("insights_reader=info"))
        .init();

    let config = Config::load()?;
    let gateway: Arc<dyn ContentGateway> = Arc::new(AirtableGateway::new(&config)?);
    let runtime = tokio::runtime::Runtime::new()?;

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title(APP_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| {
            let mut app = InsightsApp::new(&config, gateway, runtime);

            if let Some(storage) = cc.storage {
                if let Some(theme_str) = storage.get_string("is_dark_mode") {
                    if let Ok(is_dark_mode) = theme_str.parse::<bool>() {
                        app.set_dark_mode(is_dark_mode);
                    }
                }
            }

            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start {}: {}", APP_TITLE, e))
}

struct AppTheme {
    background: Color32,
    card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    chip_background: Color32,
    separator: Color32,
    error: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(1, 8, 23),
            card_background: Color32::from_rgb(15, 23, 42),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(160, 170, 185),
            highlight: Color32::from_rgb(56, 150, 209),
            chip_background: Color32::from_rgb(22, 88, 129),
            separator: Color32::from_rgb(40, 50, 70),
            error: Color32::from_rgb(239, 83, 80),
            button_background: Color32::from_rgb(30, 41, 59),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(22, 88, 129),
            button_hover_background: Color32::from_rgb(45, 58, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 247, 250),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(22, 88, 129),
            chip_background: Color32::from_rgb(214, 232, 245),
            separator: Color32::from_rgb(200, 200, 200),
            error: Color32::from_rgb(190, 30, 30),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(22, 88, 129),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);
        style.visuals.hyperlink_color = self.highlight;

        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Facet {
    Type,
    Category,
    Industry,
}

impl Facet {
    const ALL: [Facet; 3] = [Facet::Type, Facet::Category, Facet::Industry];

    fn title(self) -> &'static str {
        match self {
            Facet::Type => "Type",
            Facet::Category => "Category",
            Facet::Industry => "Industry",
        }
    }

    fn options(self) -> &'static [&'static str] {
        match self {
            Facet::Type => TYPE_OPTIONS,
            Facet::Category => CATEGORY_OPTIONS,
            Facet::Industry => INDUSTRY_OPTIONS,
        }
    }

    fn selection(self, filters: &ArticleFilters) -> &BTreeSet<String> {
        match self {
            Facet::Type => &filters.selected_types,
            Facet::Category => &filters.selected_categories,
            Facet::Industry => &filters.selected_industries,
        }
    }

    fn toggle(self, filters: &mut ArticleFilters, value: &str) {
        match self {
            Facet::Type => filters.toggle_type(value),
            Facet::Category => filters.toggle_category(value),
            Facet::Industry => filters.toggle_industry(value),
        }
    }
}

/// Everything the user can ask for in a frame. Rendering only records
/// these; they are applied once the frame's widgets are laid out.
enum Action {
    OpenArticle(String),
    Back,
    GoToPage(usize),
    StepPage { forward: bool },
    Refresh,
    ClearCache,
    Reload,
    Search(String),
    ToggleFacet(Facet, &'static str),
    ToggleShowMore(Facet),
    ClearFilters,
    AskDelete,
    CancelDelete,
    Delete(String),
    OpenLink(String),
    ToggleTheme,
}

enum Screen {
    List,
    Detail(DetailView),
}

struct InsightsApp {
    runtime: tokio::runtime::Runtime,
    gateway: Arc<dyn ContentGateway>,
    cache: Arc<ContentCache>,
    list: ListView,
    navigation: NavigationState,
    screen: Screen,
    theme: AppTheme,
    is_dark_mode: bool,
    search_input: String,
    expanded_facets: BTreeSet<Facet>,
    list_receiver: Option<Receiver<Vec<Article>>>,
    detail_receiver: Option<Receiver<(String, DetailState)>>,
    delete_receiver: Option<Receiver<Result<String, ContentError>>>,
    confirm_delete: bool,
    list_scroll_offset: f32,
    pending_jump: Option<f32>,
    status_message: Option<String>,
    started: bool,
}

impl InsightsApp {
    fn new(config: &Config, gateway: Arc<dyn ContentGateway>, runtime: tokio::runtime::Runtime) -> Self {
        let cache = Arc::new(ContentCache::new(gateway.clone()));
        Self {
            runtime,
            gateway,
            cache,
            list: ListView::new(config.page_size),
            navigation: NavigationState::new(config.scroll_restore_delay()),
            screen: Screen::List,
            theme: if config.dark_mode { AppTheme::dark() } else { AppTheme::light() },
            is_dark_mode: config.dark_mode,
            search_input: String::new(),
            expanded_facets: BTreeSet::new(),
            list_receiver: None,
            detail_receiver: None,
            delete_receiver: None,
            confirm_delete: false,
            list_scroll_offset: 0.0,
            pending_jump: None,
            status_message: None,
            started: false,
        }
    }

    fn set_dark_mode(&mut self, is_dark_mode: bool) {
        self.is_dark_mode = is_dark_mode;
        self.theme = if is_dark_mode { AppTheme::dark() } else { AppTheme::light() };
    }

    fn load_list(&mut self, ctx: &egui::Context, force_refresh: bool) {
        self.list.begin_loading();

        let cache = self.cache.clone();
        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        // Load on the runtime; the result comes back through the channel
        // and is picked up by check_tasks on a later frame
        self.runtime.spawn(async move {
            let articles = cache.get_list(force_refresh).await;
            let _ = tx.send(articles);
            // Wake the UI, otherwise nothing polls until the next input event
            ctx.request_repaint();
        });
        self.list_receiver = Some(rx);
    }

    fn load_detail(&mut self, ctx: &egui::Context, article_id: String, force_refresh: bool) {
        let cache = self.cache.clone();
        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        self.runtime.spawn(async move {
            let state = DetailView::load(&cache, &article_id, force_refresh).await;
            let _ = tx.send((article_id, state));
            ctx.request_repaint();
        });
        self.detail_receiver = Some(rx);
    }

    fn start_delete(&mut self, ctx: &egui::Context, article_id: String) {
        let gateway = self.gateway.clone();
        let ctx = ctx.clone();
        let (tx, rx) = mpsc::channel();
        self.runtime.spawn(async move {
            let result = detail::delete_article(gateway.as_ref(), &article_id).await;
            let _ = tx.send(result);
            ctx.request_repaint();
        });
        self.delete_receiver = Some(rx);
        self.confirm_delete = false;
    }

    // Poll every pending background task without blocking the frame
    fn check_tasks(&mut self) {
        if let Some(rx) = &self.list_receiver {
            match rx.try_recv() {
                Ok(articles) => {
                    log::debug!("Showing {} articles", articles.len());
                    self.list.finish_loading(articles);
                    self.list_receiver = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    log::error!("Article list task ended without a result");
                    // Keep showing whatever we had before
                    let current = self.list.articles().to_vec();
                    self.list.finish_loading(current);
                    self.list_receiver = None;
                }
            }
        }

        if let Some(rx) = &self.detail_receiver {
            match rx.try_recv() {
                Ok((article_id, state)) => {
                    // The view drops results for an article no longer on screen
                    if let Screen::Detail(view) = &mut self.screen {
                        view.apply(&article_id, state);
                    }
                    self.detail_receiver = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    log::error!("Article task ended without a result");
                    self.detail_receiver = None;
                }
            }
        }

        if let Some(rx) = &self.delete_receiver {
            match rx.try_recv() {
                Ok(Ok(article_id)) => {
                    self.delete_receiver = None;
                    self.cache.remove_one(&article_id);
                    self.list.remove_article(&article_id);
                    self.status_message = Some("Article deleted".to_string());
                    let showing_deleted = matches!(
                        &self.screen,
                        Screen::Detail(view) if view.article_id() == article_id
                    );
                    if showing_deleted {
                        self.back_to_list();
                    }
                }
                Ok(Err(e)) => {
                    self.delete_receiver = None;
                    log::error!("Error deleting article: {}", e);
                    self.status_message = Some(format!("Could not delete article: {}", e));
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.delete_receiver = None;
                }
            }
        }
    }

    fn back_to_list(&mut self) {
        if let Screen::Detail(_) = self.screen {
            self.screen = Screen::List;
            self.confirm_delete = false;
            self.list.return_from_detail(&mut self.navigation, Instant::now());
        }
    }

    fn apply(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::OpenArticle(id) => {
                let id = self.list.select_article(&mut self.navigation, &id, self.list_scroll_offset);
                self.status_message = None;
                self.screen = Screen::Detail(DetailView::open(id.clone()));
                self.load_detail(ctx, id, false);
            }
            Action::Back => self.back_to_list(),
            Action::GoToPage(page) => {
                self.list.go_to_page(&mut self.navigation, page);
                self.pending_jump = Some(0.0);
            }
            Action::StepPage { forward } => {
                self.list.step_page(&mut self.navigation, forward);
                self.pending_jump = Some(0.0);
            }
            Action::ClearCache => {
                self.list.reset_session(&self.cache, &mut self.navigation);
                self.search_input.clear();
                self.status_message = None;
                self.pending_jump = Some(0.0);
                self.load_list(ctx, false);
            }
            Action::Refresh => {
                self.status_message = None;
                self.load_list(ctx, true);
            }
            Action::Reload => {
                let id = match &mut self.screen {
                    Screen::Detail(view) => {
                        view.reload();
                        view.article_id().to_string()
                    }
                    Screen::List => return,
                };
                self.load_detail(ctx, id, true);
            }
            Action::Search(term) => {
                self.list
                    .update_filters(&mut self.navigation, |filters| filters.search_term = term);
            }
            Action::ToggleFacet(facet, value) => {
                self.list
                    .update_filters(&mut self.navigation, |filters| facet.toggle(filters, value));
            }
            Action::ToggleShowMore(facet) => {
                if !self.expanded_facets.remove(&facet) {
                    self.expanded_facets.insert(facet);
                }
            }
            Action::ClearFilters => {
                self.search_input.clear();
                self.list
                    .update_filters(&mut self.navigation, ArticleFilters::clear_all);
            }
            Action::AskDelete => self.confirm_delete = true,
            Action::CancelDelete => self.confirm_delete = false,
            Action::Delete(id) => self.start_delete(ctx, id),
            Action::OpenLink(url) => {
                if let Err(e) = open::that(&url) {
                    log::error!("Failed to open {}: {}", url, e);
                }
            }
            Action::ToggleTheme => self.set_dark_mode(!self.is_dark_mode),
        }
    }

    fn process_keyboard_shortcuts(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        // Typing in the search box must not page or navigate
        if ctx.wants_keyboard_input() {
            return;
        }

        let (back, previous, next) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape) || i.key_pressed(egui::Key::Backspace),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });

        match self.screen {
            Screen::Detail(_) if back => actions.push(Action::Back),
            Screen::List => {
                if previous {
                    actions.push(Action::StepPage { forward: false });
                }
                if next {
                    actions.push(Action::StepPage { forward: true });
                }
            }
            _ => {}
        }
    }

    fn themed_button(&self, text: &str, active: bool) -> egui::Button<'static> {
        egui::Button::new(RichText::new(text).color(if active {
            Color32::WHITE
        } else {
            self.theme.button_foreground
        }))
        .min_size(egui::Vec2::new(32.0, 30.0))
        .corner_radius(CornerRadius::same(6))
        .fill(if active {
            self.theme.button_active_background
        } else {
            self.theme.button_background
        })
    }

    fn render_header(&self, ui: &mut Ui, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new(APP_TITLE).color(self.theme.highlight).size(24.0));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme_label = if self.is_dark_mode { "☀ Light" } else { "☾ Dark" };
                if ui.add(self.themed_button(theme_label, false)).clicked() {
                    actions.push(Action::ToggleTheme);
                }

                if let Screen::List = self.screen {
                    let refresh = ui.add_enabled(
                        !self.list.is_loading(),
                        self.themed_button("⟳ Refresh", false),
                    );
                    if refresh.clicked() {
                        actions.push(Action::Refresh);
                    }

                    let clear = ui.add_enabled(
                        !self.list.is_loading(),
                        self.themed_button("Clear cache", false),
                    );
                    if clear.clicked() {
                        actions.push(Action::ClearCache);
                    }
                }
            });
        });

        if let Some(message) = &self.status_message {
            ui.label(RichText::new(message).color(self.theme.secondary_text).italics());
        }
    }

    fn render_filters(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        ui.add_space(8.0);
        ui.label(RichText::new("Search").strong().color(self.theme.text));
        let search = ui.add(
            egui::TextEdit::singleline(&mut self.search_input)
                .hint_text("Search articles...")
                .desired_width(f32::INFINITY),
        );
        if search.changed() {
            actions.push(Action::Search(self.search_input.clone()));
        }

        ui.add_space(8.0);
        ui.add(egui::Separator::default().spacing(8.0));

        let filters = self.navigation.filters();
        for facet in Facet::ALL {
            let selection = facet.selection(filters);
            let expanded = self.expanded_facets.contains(&facet);
            let options = facet.options();
            let shown = if expanded {
                options
            } else {
                &options[..options.len().min(VISIBLE_FACET_OPTIONS)]
            };

            egui::CollapsingHeader::new(RichText::new(facet.title()).strong().color(self.theme.text))
                .id_salt(facet.title())
                .default_open(true)
                .show(ui, |ui| {
                    for &option in shown {
                        let mut checked = selection.contains(option);
                        if ui.checkbox(&mut checked, option).changed() {
                            actions.push(Action::ToggleFacet(facet, option));
                        }
                    }

                    if options.len() > VISIBLE_FACET_OPTIONS {
                        let label = if expanded { "Show less" } else { "Show more" };
                        if ui.link(RichText::new(label).color(self.theme.highlight)).clicked() {
                            actions.push(Action::ToggleShowMore(facet));
                        }
                    }
                });
        }

        ui.add_space(12.0);
        if ui
            .add_enabled(filters.is_active(), self.themed_button("Clear all", false))
            .clicked()
        {
            actions.push(Action::ClearFilters);
        }
    }

    // Returns true when the card was clicked
    fn render_card(&self, ui: &mut Ui, article: &Article) -> bool {
        let response = egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(8))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(12.0)
            .outer_margin(egui::vec2(8.0, 6.0))
            .show(ui, |ui| {
                ui.set_min_height(180.0);
                ui.horizontal_wrapped(|ui| {
                    for chip in [&article.resource_type, &article.category].into_iter().flatten() {
                        self.render_chip(ui, chip);
                    }
                });
                ui.add_space(6.0);
                ui.add(
                    egui::Label::new(
                        RichText::new(article.display_title())
                            .size(18.0)
                            .strong()
                            .color(self.theme.text),
                    )
                    .wrap(),
                );
                ui.add_space(4.0);
                ui.add(
                    egui::Label::new(
                        RichText::new(article.display_excerpt()).color(self.theme.secondary_text),
                    )
                    .wrap(),
                );
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(article.author_initials())
                            .strong()
                            .color(self.theme.highlight),
                    );
                    ui.label(RichText::new(article.display_author()).color(self.theme.text));
                });
                ui.label(
                    RichText::new(format!(
                        "{} · {}",
                        article.display_date(),
                        article.display_read_time()
                    ))
                    .size(13.0)
                    .color(self.theme.secondary_text),
                );
            })
            .response
            .interact(egui::Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand);

        response.clicked()
    }

    fn render_chip(&self, ui: &mut Ui, text: &str) {
        egui::Frame::new()
            .fill(self.theme.chip_background)
            .corner_radius(CornerRadius::same(10))
            .inner_margin(egui::vec2(8.0, 2.0))
            .show(ui, |ui| {
                ui.label(RichText::new(text).size(12.0).color(self.theme.text));
            });
    }

    fn render_list(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        // A jump is applied for one frame only; after that the user owns the scrollbar
        let jump = self.pending_jump.take();
        let snapshot = self.list.snapshot(&self.navigation);

        match snapshot.status {
            ListStatus::Loading => {
                ui.add_space(40.0);
                ui.vertical_centered(|ui| {
                    ui.spinner();
                    ui.add_space(8.0);
                    ui.label(RichText::new("Loading articles...").color(self.theme.secondary_text));
                });
                return;
            }
            ListStatus::NoContent => {
                ui.add_space(40.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("No articles available yet")
                            .size(18.0)
                            .color(self.theme.secondary_text),
                    );
                });
                return;
            }
            ListStatus::NoMatches => {
                ui.add_space(40.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("No articles match your filters")
                            .size(18.0)
                            .color(self.theme.secondary_text),
                    );
                    ui.add_space(8.0);
                    if ui.add(self.themed_button("Clear all filters", false)).clicked() {
                        actions.push(Action::ClearFilters);
                    }
                });
                return;
            }
            ListStatus::Results => {}
        }

        ui.label(
            RichText::new(format!(
                "Showing {} of {} articles",
                snapshot.match_count, snapshot.total_count
            ))
            .color(self.theme.secondary_text),
        );

        let mut area = ScrollArea::vertical()
            .id_salt("articles_scroll_area")
            .auto_shrink([false, false]);
        if let Some(offset) = jump {
            area = area.vertical_scroll_offset(offset);
        }

        let scroll_response = area.show(ui, |ui| {
            for row in snapshot.items.chunks(GRID_COLUMNS) {
                ui.columns(GRID_COLUMNS, |columns| {
                    for (column, article) in columns.iter_mut().zip(row) {
                        if self.render_card(column, article) {
                            actions.push(Action::OpenArticle(article.id.clone()));
                        }
                    }
                });
            }

            if snapshot.total_pages > 1 {
                ui.add_space(12.0);
                self.render_pagination(ui, snapshot.page, snapshot.total_pages, actions);
            }
            ui.add_space(20.0);
        });

        // Remember the offset so opening an article can save it
        self.list_scroll_offset = scroll_response.state.offset.y;
    }

    fn render_pagination(&self, ui: &mut Ui, page: usize, total_pages: usize, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(page > 1, self.themed_button("◀ Prev", false))
                .clicked()
            {
                actions.push(Action::GoToPage(page - 1));
            }

            for number in 1..=total_pages {
                if ui
                    .add(self.themed_button(&number.to_string(), number == page))
                    .clicked()
                {
                    actions.push(Action::GoToPage(number));
                }
            }

            if ui
                .add_enabled(page < total_pages, self.themed_button("Next ▶", false))
                .clicked()
            {
                actions.push(Action::GoToPage(page + 1));
            }
        });
    }

    fn render_detail(&self, ui: &mut Ui, view: &DetailView, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            if ui.add(self.themed_button("← Back to insights", false)).clicked() {
                actions.push(Action::Back);
            }

            if view.article().is_none() {
                return;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let deleting = self.delete_receiver.is_some();
                if self.confirm_delete {
                    if ui.add(self.themed_button("Cancel", false)).clicked() {
                        actions.push(Action::CancelDelete);
                    }
                    let confirm = egui::Button::new(RichText::new("Confirm delete").color(Color32::WHITE))
                        .min_size(egui::Vec2::new(32.0, 30.0))
                        .corner_radius(CornerRadius::same(6))
                        .fill(self.theme.error);
                    if ui.add_enabled(!deleting, confirm).clicked() {
                        actions.push(Action::Delete(view.article_id().to_string()));
                    }
                } else if ui
                    .add_enabled(!deleting, self.themed_button("Delete", false))
                    .clicked()
                {
                    actions.push(Action::AskDelete);
                }

                if ui.add(self.themed_button("⟳ Reload", false)).clicked() {
                    actions.push(Action::Reload);
                }
            });
        });
        ui.add(egui::Separator::default().spacing(8.0));

        match view.state() {
            DetailState::Loading => {
                ui.add_space(40.0);
                ui.vertical_centered(|ui| {
                    ui.spinner();
                    ui.add_space(8.0);
                    ui.label(RichText::new("Loading article...").color(self.theme.secondary_text));
                });
            }
            DetailState::NotFound => {
                ui.add_space(40.0);
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("Article not found").size(20.0).color(self.theme.text));
                    ui.label(
                        RichText::new("It may have been removed or the link is wrong.")
                            .color(self.theme.secondary_text),
                    );
                });
            }
            DetailState::Failed(message) => {
                ui.add_space(40.0);
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("Could not load this article").size(20.0).color(self.theme.error));
                    ui.label(RichText::new(message).color(self.theme.secondary_text));
                    ui.add_space(8.0);
                    if ui.add(self.themed_button("Try again", false)).clicked() {
                        actions.push(Action::Reload);
                    }
                });
            }
            DetailState::Ready(article) => {
                ScrollArea::vertical()
                    .id_salt("article_scroll_area")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.render_article(ui, article, view.sections(), actions);
                    });
            }
        }
    }

    fn render_article(&self, ui: &mut Ui, article: &Article, sections: &[Section], actions: &mut Vec<Action>) {
        ui.horizontal_wrapped(|ui| {
            for chip in [&article.resource_type, &article.category, &article.industry]
                .into_iter()
                .flatten()
            {
                self.render_chip(ui, chip);
            }
            for tag in &article.tags {
                self.render_chip(ui, &format!("#{}", tag));
            }
        });
        ui.add_space(8.0);
        ui.add(
            egui::Label::new(
                RichText::new(article.display_title())
                    .size(28.0)
                    .strong()
                    .color(self.theme.text),
            )
            .wrap(),
        );
        ui.label(
            RichText::new(format!(
                "{} · {} · {}",
                article.display_author(),
                article.display_date(),
                article.display_read_time()
            ))
            .color(self.theme.secondary_text),
        );

        if let Some(image) = article.image.as_deref().filter(|url| !url.is_empty()) {
            if ui.link(RichText::new("View cover image").color(self.theme.highlight)).clicked() {
                actions.push(Action::OpenLink(image.to_string()));
            }
        }

        ui.add_space(8.0);
        ui.add(
            egui::Label::new(
                RichText::new(article.display_excerpt())
                    .size(16.0)
                    .italics()
                    .color(self.theme.secondary_text),
            )
            .wrap(),
        );
        ui.add(egui::Separator::default().spacing(12.0));

        if sections.is_empty() {
            ui.label(RichText::new("This article has no content yet.").color(self.theme.secondary_text));
        }
        for section in sections {
            self.render_section(ui, section, actions);
            ui.add_space(8.0);
        }
    }

    fn render_section(&self, ui: &mut Ui, section: &Section, actions: &mut Vec<Action>) {
        match section {
            Section::Header { level, text } => {
                let size = 28.0 - f32::from(*level) * 2.0;
                ui.label(RichText::new(text).size(size).strong().color(self.theme.text));
            }
            Section::Paragraph(text) => {
                ui.add(egui::Label::new(RichText::new(text).size(15.0).color(self.theme.text)).wrap());
            }
            Section::Quote { text, author } => {
                egui::Frame::new()
                    .fill(self.theme.card_background)
                    .corner_radius(CornerRadius::same(6))
                    .stroke(Stroke::new(1.0, self.theme.highlight))
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.add(egui::Label::new(RichText::new(text).italics().size(16.0)).wrap());
                        if let Some(author) = author {
                            ui.label(RichText::new(format!("- {}", author)).color(self.theme.secondary_text));
                        }
                    });
            }
            Section::User { name, bio } => {
                ui.label(RichText::new(name).strong().color(self.theme.text));
                ui.label(RichText::new(bio).color(self.theme.secondary_text));
            }
            Section::Image { url, caption } => {
                if !url.is_empty()
                    && ui
                        .link(RichText::new("Open image").color(self.theme.highlight))
                        .clicked()
                {
                    actions.push(Action::OpenLink(url.clone()));
                }
                if let Some(caption) = caption {
                    ui.label(RichText::new(caption).size(13.0).color(self.theme.secondary_text));
                }
            }
            Section::List { ordered, items } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}.", index + 1)
                    } else {
                        "•".to_string()
                    };
                    ui.horizontal_wrapped(|ui| {
                        ui.label(RichText::new(marker).color(self.theme.highlight));
                        ui.label(RichText::new(item).color(self.theme.text));
                    });
                }
            }
            Section::Divider => {
                ui.separator();
            }
            Section::Code(code) => {
                egui::Frame::new()
                    .fill(self.theme.button_background)
                    .corner_radius(CornerRadius::same(4))
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(code).monospace().color(self.theme.text));
                    });
            }
            Section::Link { url, text, description } => {
                if ui.link(RichText::new(text).color(self.theme.highlight)).clicked() {
                    actions.push(Action::OpenLink(url.clone()));
                }
                if let Some(description) = description {
                    ui.label(RichText::new(description).color(self.theme.secondary_text));
                }
            }
            Section::Unknown(kind) => {
                log::debug!("Skipping unsupported section type {:?}", kind);
            }
        }
    }
}

impl eframe::App for InsightsApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        // First frame
        if !self.started {
            self.started = true;
            self.load_list(ctx, false);
        }

        self.check_tasks();

        // Returning from an article: jump back once the list had time to lay out
        let now = Instant::now();
        if let Some(offset) = self.navigation.take_due_restore(now) {
            self.pending_jump = Some(offset as f32);
        }
        // No input may arrive before the restore is due, so schedule a frame
        if let Some(wait) = self.navigation.restore_pending_in(now) {
            ctx.request_repaint_after(wait);
        }

        // Panels only record what was clicked; state changes happen below,
        // after rendering, so nothing is mutated while it is being drawn
        let mut actions = Vec::new();
        self.process_keyboard_shortcuts(ctx, &mut actions);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            self.render_header(ui, &mut actions);
            ui.add_space(6.0);
        });

        if let Screen::Detail(view) = &self.screen {
            egui::CentralPanel::default().show(ctx, |ui| self.render_detail(ui, view, &mut actions));
        } else {
            egui::SidePanel::left("filters_panel")
                .resizable(false)
                .exact_width(260.0)
                .show(ctx, |ui| {
                    // Facets can outgrow short windows
                    ScrollArea::vertical()
                        .id_salt("filters_scroll_area")
                        .show(ui, |ui| self.render_filters(ui, &mut actions));
                });
            egui::CentralPanel::default().show(ctx, |ui| self.render_list(ui, &mut actions));
        }

        for action in actions {
            self.apply(ctx, action);
        }
    }
}
