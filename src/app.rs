// app.rs

use ratatui::layout::Rect;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dataset::TemperatureTable;
use crate::export;
use crate::geo::{BBox, BoundaryCollection, BoundaryInfo, RegionCode};
use crate::months::{MonthKey, month_index};
use crate::panel::PanelState;
use crate::render::{Overlay, Raster, StyledRegion, cell_center, render_overlay};
use crate::view::{FrameTarget, ViewTransition, Viewport};

/// Metropolitan France, used when the boundary file has no usable extent.
const FRANCE: BBox = BBox {
    min_lon: -5.5,
    min_lat: 41.0,
    max_lon: 10.0,
    max_lat: 51.5,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentScreen {
    Map,
    Help,
}

/// Everything the user can ask of the application.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    NextMonth,
    PrevMonth,
    FirstMonth,
    LastMonth,
    SelectMonth(usize),
    /// Left click on a terminal cell.
    ClickCell { column: u16, row: u16 },
    /// Pointer moved over a terminal cell.
    HoverCell { column: u16, row: u16 },
    NextRegion,
    PrevRegion,
    OpenSelected,
    OpenRegion(RegionCode),
    ClosePanel,
    ToggleHelp,
    Export,
    Tick,
    Quit,
}

pub struct App {
    pub current_screen: CurrentScreen,
    pub quit: bool,

    // Data, read-only after startup
    pub months: Vec<MonthKey>,
    pub boundaries: Rc<BoundaryCollection>,
    pub boundary_info: BoundaryInfo,
    pub table: TemperatureTable,

    // Selection
    pub selected_month: usize,
    pub selected_region: Option<usize>, // Keyboard cursor into `overlay.regions`
    pub hovered_region: Option<usize>,

    // Rendered state
    pub overlay: Overlay,
    pub panel: PanelState,

    // View
    pub viewport: Viewport,
    pub framed: FrameTarget,
    pub pending_view: Option<ViewTransition>,
    pub map_area: Rect,
    pub raster: Option<Raster>,

    // UI related
    pub notification: String,
    pub help_keybinds: Vec<String>,
    pub output_dir: PathBuf,
}

impl App {
    /// Builds the state and renders the first month.
    pub fn new(
        boundaries: BoundaryCollection,
        boundary_info: BoundaryInfo,
        table: TemperatureTable,
        output_dir: PathBuf,
    ) -> App {
        let months = month_index();
        let boundaries = Rc::new(boundaries);
        let overlay = render_overlay(&boundaries, &table, months[0]);
        let full = boundaries.bbox().unwrap_or(FRANCE);

        App {
            current_screen: CurrentScreen::Map,
            quit: false,

            months,
            boundaries,
            boundary_info,
            table,

            selected_month: 0,
            selected_region: None,
            hovered_region: None,

            overlay,
            panel: PanelState::Closed,

            viewport: Viewport::framing(full, 1.0),
            framed: FrameTarget::Full,
            pending_view: None,
            map_area: Rect::default(),
            raster: None,

            notification: String::from("Select a département to see its temperature trend"),
            help_keybinds: vec![
                "←/→ or H/L: Previous / next month".to_string(),
                "Home/End: First / last month".to_string(),
                "↑/↓ or K/J: Select département".to_string(),
                "Enter: Open selected département".to_string(),
                "Click: Open département under the pointer".to_string(),
                "Esc/X: Close detail panel".to_string(),
                "E: Export map (and open chart) as PNG".to_string(),
                "?: Toggle this help".to_string(),
                "Q: Quit the application".to_string(),
            ],
            output_dir,
        }
    }

    pub fn month(&self) -> MonthKey {
        self.months[self.selected_month]
    }

    pub fn selected(&self) -> Option<&StyledRegion> {
        self.selected_region
            .and_then(|i| self.overlay.regions.get(i))
    }

    pub fn hovered(&self) -> Option<&StyledRegion> {
        self.hovered_region
            .and_then(|i| self.overlay.regions.get(i))
    }

    pub fn handle(&mut self, message: Message, now: Instant) {
        match message {
            Message::NextMonth => self.select_month(self.selected_month.saturating_add(1)),
            Message::PrevMonth => self.select_month(self.selected_month.saturating_sub(1)),
            Message::FirstMonth => self.select_month(0),
            Message::LastMonth => self.select_month(self.months.len() - 1),
            Message::SelectMonth(index) => self.select_month(index),
            Message::ClickCell { column, row } => {
                if let Some(code) = self
                    .region_at_cell(column, row)
                    .map(|styled| styled.code.clone())
                {
                    self.open_region(&code, now);
                }
            }
            Message::HoverCell { column, row } => {
                self.hovered_region = self
                    .region_at_cell(column, row)
                    .map(|styled| styled.index);
            }
            Message::NextRegion => self.move_region_cursor(1),
            Message::PrevRegion => self.move_region_cursor(-1),
            Message::OpenSelected => {
                if let Some(code) = self.selected().map(|s| s.code.clone()) {
                    self.open_region(&code, now);
                }
            }
            Message::OpenRegion(code) => self.open_region(&code, now),
            Message::ClosePanel => self.close_panel(now),
            Message::ToggleHelp => {
                self.current_screen = match self.current_screen {
                    CurrentScreen::Map => CurrentScreen::Help,
                    CurrentScreen::Help => CurrentScreen::Map,
                }
            }
            Message::Export => self.export(),
            Message::Tick => self.apply_due_transition(now),
            Message::Quit => self.quit = true,
        }
    }

    /// Re-renders the overlay for another month. The previous overlay and
    /// its raster are dropped.
    fn select_month(&mut self, index: usize) {
        let index = index.min(self.months.len() - 1);
        let month = self.months[index];
        self.selected_month = index;
        self.overlay = render_overlay(&self.boundaries, &self.table, month);
        self.raster = None;
        self.panel.set_month(month, &self.table);
        debug!(%month, "overlay rendered");
    }

    fn move_region_cursor(&mut self, delta: isize) {
        let len = self.overlay.regions.len();
        if len == 0 {
            return;
        }
        // The first move lands on either end of the list.
        let next = match self.selected_region {
            Some(current) => current as isize + delta,
            None if delta > 0 => 0,
            None => -1,
        };
        self.selected_region = Some(next.rem_euclid(len as isize) as usize);
        if let Some(label) = self.selected().map(StyledRegion::label) {
            self.notification = label;
        }
    }

    fn open_region(&mut self, code: &RegionCode, now: Instant) {
        let Some(styled) = self.overlay.find(code) else {
            debug!(%code, "no such region in overlay");
            return;
        };
        let index = styled.index;
        let name = styled.name.clone();
        let temperature = styled.temperature;
        let bbox = self.overlay.geometry(styled).bbox;

        self.panel.open(
            code.clone(),
            name.clone(),
            temperature,
            self.month(),
            &self.months,
            &self.table,
        );
        self.selected_region = Some(index);
        if !bbox.is_empty() {
            self.pending_view = Some(ViewTransition::after_settle(now, FrameTarget::Region(bbox)));
        }
        self.notification = if self.table.contains_region(code) {
            format!("{} ({})", name, code)
        } else {
            format!("{} ({}), no temperature file loaded", name, code)
        };
        info!(%code, "detail panel opened");
    }

    fn close_panel(&mut self, now: Instant) {
        if self.panel.close() {
            self.pending_view = Some(ViewTransition::after_settle(now, FrameTarget::Full));
            self.notification = String::from("Panel closed");
        }
    }

    fn apply_due_transition(&mut self, now: Instant) {
        if let Some(transition) = self.pending_view.filter(|t| t.is_due(now)) {
            self.pending_view = None;
            self.framed = transition.target;
            self.reframe();
        }
    }

    /// Called by the UI with the inner map area of the current frame.
    pub fn set_map_area(&mut self, area: Rect) {
        if area != self.map_area {
            self.map_area = area;
            self.reframe();
        }
    }

    fn reframe(&mut self) {
        let target = match self.framed {
            FrameTarget::Full => self.boundaries.bbox().unwrap_or(FRANCE),
            FrameTarget::Region(bbox) => bbox,
        };
        // Terminal cells are about twice as tall as they are wide.
        let aspect = if self.map_area.height > 0 {
            self.map_area.width as f64 / (self.map_area.height as f64 * 2.0)
        } else {
            1.0
        };
        self.viewport = Viewport::framing(target, aspect);
        self.raster = None;
    }

    fn region_at_cell(&self, column: u16, row: u16) -> Option<&StyledRegion> {
        let area = self.map_area;
        if self.current_screen != CurrentScreen::Map
            || area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        let point = cell_center(
            self.viewport.bounds,
            area.width as usize,
            area.height as usize,
            (column - area.x) as usize,
            (row - area.y) as usize,
        );
        self.overlay.hit_test(point)
    }

    /// Returns the raster for the current overlay and map size, rebuilding
    /// it when either changed.
    pub fn raster(&mut self, cols: usize, rows: usize) -> &Raster {
        let bounds = self.viewport.bounds;
        let stale = !matches!(
            &self.raster,
            Some(r) if r.cols == cols && r.rows == rows && r.bounds == bounds
        );
        if stale {
            self.raster = None;
        }
        self.raster
            .get_or_insert_with(|| self.overlay.rasterize(bounds, cols, rows))
    }

    fn export(&mut self) {
        let mut written = Vec::new();
        let result = export::export_map(&self.overlay, self.viewport.bounds, &self.output_dir)
            .and_then(|path| {
                written.push(path);
                match self.panel.current() {
                    Some(panel) => {
                        export::export_chart(panel, &self.months, &self.output_dir).map(|path| {
                            written.push(path);
                        })
                    }
                    None => Ok(()),
                }
            });

        match result {
            Ok(()) => {
                let names: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
                self.notification = format!("Exported {}", names.join(", "));
            }
            Err(e) => {
                warn!("export failed: {:#}", e);
                self.notification = format!("Export failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Band;
    use crate::geo::tests::fixture;
    use crate::view::SETTLE_DELAY;
    use std::time::Duration;

    fn app() -> App {
        let m = |s: &str| s.parse::<MonthKey>().unwrap();
        let table: TemperatureTable = [
            (RegionCode::new("01"), m("2020-01"), 5.2),
            (RegionCode::new("2A"), m("2020-01"), 12.0),
        ]
        .into_iter()
        .collect();
        let mut app = App::new(
            fixture(),
            BoundaryInfo::default(),
            table,
            std::env::temp_dir(),
        );
        app.set_map_area(Rect::new(0, 0, 29, 9));
        app
    }

    fn index_of(app: &App, key: &str) -> usize {
        app.months.iter().position(|m| m.to_string() == key).unwrap()
    }

    #[test]
    fn month_selection_recolors_regions() {
        let mut app = app();
        let now = Instant::now();
        let ain = RegionCode::new("01");

        app.handle(Message::SelectMonth(index_of(&app, "2020-01")), now);
        assert_eq!(app.overlay.find(&ain).unwrap().band, Band::Band6);

        app.handle(Message::NextMonth, now);
        assert_eq!(app.month().to_string(), "2020-02");
        assert_eq!(app.overlay.find(&ain).unwrap().band, Band::Unknown);
    }

    #[test]
    fn month_selection_is_clamped() {
        let mut app = app();
        let now = Instant::now();
        app.handle(Message::PrevMonth, now);
        assert_eq!(app.selected_month, 0);
        app.handle(Message::SelectMonth(500), now);
        assert_eq!(app.selected_month, 92);
        app.handle(Message::NextMonth, now);
        assert_eq!(app.month().to_string(), "2025-09");
    }

    #[test]
    fn rerendering_same_month_is_identical() {
        let mut app = app();
        let now = Instant::now();
        let idx = index_of(&app, "2020-01");
        app.handle(Message::SelectMonth(idx), now);
        let first = app.overlay.clone();
        app.handle(Message::SelectMonth(idx), now);
        assert_eq!(app.overlay, first);
        assert_eq!(app.overlay.regions.len(), 2);
    }

    #[test]
    fn opening_two_regions_keeps_the_last() {
        let mut app = app();
        let now = Instant::now();
        app.handle(Message::SelectMonth(index_of(&app, "2020-01")), now);
        app.handle(Message::OpenRegion(RegionCode::new("01")), now);
        app.handle(Message::OpenRegion(RegionCode::new("2A")), now);

        let open = app.panel.current().unwrap();
        assert_eq!(open.code.as_str(), "2A");
        assert_eq!(open.name, "Corse-du-Sud");
        assert_eq!(open.temperature, Some(12.0));
        assert_eq!(open.chart.code.as_str(), "2A");
    }

    #[test]
    fn unknown_region_and_closed_panel_are_no_ops() {
        let mut app = app();
        let now = Instant::now();
        app.handle(Message::OpenRegion(RegionCode::new("99")), now);
        assert!(!app.panel.is_open());
        app.handle(Message::ClosePanel, now);
        assert!(app.pending_view.is_none());
    }

    #[test]
    fn reframing_waits_for_the_settle_delay() {
        let mut app = app();
        let now = Instant::now();
        let full = app.viewport;

        app.handle(Message::OpenRegion(RegionCode::new("01")), now);
        app.handle(Message::Tick, now + Duration::from_millis(100));
        assert_eq!(app.viewport, full);

        app.handle(Message::Tick, now + SETTLE_DELAY);
        assert!(app.pending_view.is_none());
        assert!(matches!(app.framed, FrameTarget::Region(_)));
        assert!(app.viewport.bounds.max_lon < full.bounds.max_lon);

        let later = now + Duration::from_secs(1);
        app.handle(Message::ClosePanel, later);
        assert!(!app.panel.is_open());
        app.handle(Message::Tick, later + SETTLE_DELAY);
        assert_eq!(app.framed, FrameTarget::Full);
        assert_eq!(app.viewport, full);
    }

    #[test]
    fn closing_cancels_a_pending_zoom() {
        let mut app = app();
        let now = Instant::now();
        app.handle(Message::OpenRegion(RegionCode::new("01")), now);
        app.handle(Message::ClosePanel, now + Duration::from_millis(50));
        app.handle(Message::Tick, now + Duration::from_secs(1));
        assert_eq!(app.framed, FrameTarget::Full);
    }

    #[test]
    fn clicking_a_cell_opens_the_region_below() {
        let mut app = app();
        let now = Instant::now();
        // Top-left corner of the map is outside every polygon.
        app.handle(Message::ClickCell { column: 0, row: 0 }, now);
        assert!(!app.panel.is_open());

        let (lon, lat) = (3.5, 3.0);
        let b = app.viewport.bounds;
        let area = app.map_area;
        let column = ((lon - b.min_lon) / (b.max_lon - b.min_lon) * area.width as f64) as u16;
        let row = ((b.max_lat - lat) / (b.max_lat - b.min_lat) * area.height as f64) as u16;

        app.handle(Message::HoverCell { column, row }, now);
        assert_eq!(app.hovered().unwrap().code.as_str(), "01");

        app.handle(Message::ClickCell { column, row }, now);
        assert_eq!(app.panel.current().unwrap().code.as_str(), "01");
        assert_eq!(app.selected_region, Some(0));
    }

    #[test]
    fn keyboard_cursor_wraps_and_opens() {
        let mut app = app();
        let now = Instant::now();
        assert!(app.selected().is_none());
        app.handle(Message::OpenSelected, now);
        assert!(!app.panel.is_open());

        app.handle(Message::PrevRegion, now);
        assert_eq!(app.selected().unwrap().code.as_str(), "2A");
        app.handle(Message::NextRegion, now);
        app.handle(Message::OpenSelected, now);
        assert_eq!(app.panel.current().unwrap().code.as_str(), "01");
    }

    #[test]
    fn raster_is_cached_until_the_view_changes() {
        let mut app = app();
        let now = Instant::now();
        let first = app.raster(20, 10).clone();
        assert_eq!(app.raster(20, 10), &first);
        app.handle(Message::NextMonth, now);
        assert!(app.raster.is_none());
        assert_eq!(app.raster(20, 10).cols, 20);
    }
}
