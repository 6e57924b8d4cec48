// ui.rs

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Wrap,
        canvas::{Canvas, Painter, Points, Shape},
    },
};

use crate::app::{App, CurrentScreen};
use crate::color::Band;
use crate::months::MonthKey;
use crate::panel::OpenPanel;
use crate::render::Raster;

const OCEAN: Color = Color::Rgb(173, 216, 230);

fn band_color(band: Band) -> Color {
    let rgb = band.rgb();
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Paints raster cells straight into a half-block canvas grid of
/// `cols` x `rows` pixels.
struct RasterFill<'a> {
    raster: &'a Raster,
    cols: usize,
    rows: usize,
}

impl Shape for RasterFill<'_> {
    fn draw(&self, painter: &mut Painter) {
        if self.raster.cols != self.cols || self.raster.rows != self.rows {
            return;
        }
        for (band, cells) in &self.raster.layers {
            let color = band_color(*band);
            for &(col, row) in cells {
                painter.paint(col, row, color);
            }
        }
    }
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Map (+ panel)
            Constraint::Length(3), // Month slider
            Constraint::Length(1), // Legend
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    match app.current_screen {
        CurrentScreen::Map => render_map_screen(frame, app, main_layout[0]),
        CurrentScreen::Help => render_help_screen(frame, app, main_layout[0]),
    }

    render_slider(frame, app, main_layout[1]);
    render_legend(frame, main_layout[2]);
    render_footer(frame, app, main_layout[3]);
}

fn render_map_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    // The panel takes the right part of the screen while open.
    let (map_area, panel_area) = if app.panel.is_open() {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        (split[0], Some(split[1]))
    } else {
        (area, None)
    };

    render_map(frame, app, map_area);
    if let (Some(panel_area), Some(panel)) = (panel_area, app.panel.current()) {
        render_panel(frame, panel, &app.months, panel_area);
    }
}

fn render_map(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(format!(" Mean temperature · {} ", app.month()))
        .title_style(Style::default().fg(Color::Cyan).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    let inner = block.inner(area);
    app.set_map_area(inner);

    // Half blocks give one pixel per column and two per row.
    let cols = inner.width as usize;
    let rows = inner.height as usize * 2;
    app.raster(cols, rows);

    let app = &*app;
    let bounds = app.viewport.bounds;
    let Some(raster) = app.raster.as_ref() else {
        return;
    };

    let highlighted = app
        .panel
        .current()
        .and_then(|panel| app.overlay.find(&panel.code))
        .or_else(|| app.selected());
    let label = app.hovered().or(highlighted);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::HalfBlock)
        .background_color(OCEAN)
        .x_bounds([bounds.min_lon, bounds.max_lon])
        .y_bounds([bounds.min_lat, bounds.max_lat])
        .paint(|ctx| {
            ctx.draw(&RasterFill {
                raster,
                cols,
                rows,
            });
            ctx.layer();

            if let Some(styled) = highlighted {
                for polygon in &app.overlay.geometry(styled).polygons {
                    if let Some(ring) = polygon.first() {
                        ctx.draw(&Points {
                            coords: ring,
                            color: Color::White,
                        });
                    }
                }
            }
            if let Some(styled) = label {
                let (lon, lat) = app.overlay.geometry(styled).bbox.center();
                ctx.print(
                    lon,
                    lat,
                    Span::styled(
                        styled.label(),
                        Style::default().fg(Color::Black).bg(Color::White),
                    ),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn render_panel(frame: &mut Frame, panel: &OpenPanel, months: &[MonthKey], area: Rect) {
    let block = Block::default()
        .title(" Details (Esc to close) ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(inner);

    let temperature = match panel.temperature {
        Some(t) => format!("{} °C", t),
        None => String::from("N/A"),
    };
    let text = vec![
        Line::from(Span::styled(
            panel.name.clone(),
            Style::default().add_modifier(Modifier::BOLD).fg(Color::White),
        )),
        Line::from(format!("Code: {}", panel.code)),
        Line::from(format!("Temperature: {}", temperature)),
        Line::from(format!("Month: {}", panel.month)),
    ];
    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }),
        chunks[0],
    );

    if !panel.chart.has_data() {
        frame.render_widget(
            Paragraph::new("No temperature series for this département.")
                .style(Style::default().fg(Color::Gray)),
            chunks[1],
        );
        return;
    }

    let segments = panel.chart.segments();
    let current: Vec<(f64, f64)> = months
        .iter()
        .position(|m| *m == panel.month)
        .zip(panel.temperature)
        .map(|(x, t)| vec![(x as f64, t)])
        .unwrap_or_default();

    let line_style = Style::default().fg(band_color(Band::Band2));
    let mut datasets: Vec<Dataset> = segments
        .iter()
        .map(|segment| {
            // A lone month has no neighbour to draw a line to.
            let graph_type = if segment.len() == 1 {
                GraphType::Scatter
            } else {
                GraphType::Line
            };
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(graph_type)
                .style(line_style)
                .data(segment)
        })
        .collect();
    datasets.push(
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::White))
            .data(&current),
    );

    let (lo, hi) = panel.chart.y_bounds().unwrap_or((0.0, 1.0));
    let (lo, hi) = ((lo - 1.0).floor(), (hi + 1.0).ceil());
    let x_max = months.len().saturating_sub(1) as f64;
    let month_label = |i: usize| {
        months
            .get(i)
            .map(|m| Span::raw(m.to_string()))
            .unwrap_or_default()
    };

    let chart = Chart::new(datasets)
        .block(Block::default().title(" Monthly mean (°C) ").borders(Borders::TOP))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![
                    month_label(0),
                    month_label(months.len() / 2),
                    month_label(months.len().saturating_sub(1)),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(format!("{:.0}", lo)),
                    Span::raw(format!("{:.0}", (lo + hi) / 2.0)),
                    Span::raw(format!("{:.0}", hi)),
                ]),
        );
    frame.render_widget(chart, chunks[1]);
}

/// Renders the help screen with the keybinds and boundary file facts.
fn render_help_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(" Help Screen ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let mut lines: Vec<Line> = vec![Line::from("Keybinds:").bold()];
    lines.extend(app.help_keybinds.iter().map(|s| Line::from(format!("  {}", s))));
    lines.push(Line::from(""));

    let info = &app.boundary_info;
    lines.push(Line::from("Boundary file:").bold());
    lines.push(Line::from(format!("  Size: {} KB", info.file_size_kb)));
    lines.push(Line::from(format!("  Modified: {}", info.modified_time)));
    lines.push(Line::from(format!("  Features: {}", info.feature_count)));
    match info.bbox {
        Some(b) => lines.push(Line::from(format!(
            "  BBox: [{:.2},{:.2},{:.2},{:.2}]",
            b.min_lon, b.min_lat, b.max_lon, b.max_lat
        ))),
        None => lines.push(Line::from("  BBox: Not applicable/Found")),
    }
    lines.push(Line::from(format!(
        "  Départements with data: {}",
        app.table.region_count()
    )));

    let help_text = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::LightGreen));

    frame.render_widget(help_text, area);
}

fn render_slider(frame: &mut Frame, app: &App, area: Rect) {
    let last = app.months.len().saturating_sub(1).max(1);
    let gauge = Gauge::default()
        .block(Block::default().title(" Month (←/→) ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::LightCyan).bg(Color::DarkGray))
        .ratio(app.selected_month as f64 / last as f64)
        .label(format!(
            "{}  ({}/{})",
            app.month(),
            app.selected_month + 1,
            app.months.len()
        ));
    frame.render_widget(gauge, area);
}

fn render_legend(frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for band in Band::ALL {
        spans.push(Span::styled("██", Style::default().fg(band_color(band))));
        spans.push(Span::raw(format!(" {}  ", band.legend())));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

/// Renders a common footer area.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let current_screen_name = match app.current_screen {
        CurrentScreen::Map => "Map",
        CurrentScreen::Help => "Help",
    };

    let footer_text = Line::from(vec![
        Span::styled(
            app.notification.clone(),
            Style::default().fg(Color::White),
        ),
        Span::raw(" | Screen: "),
        Span::styled(
            current_screen_name,
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Press "),
        Span::styled(
            "q",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        ),
        Span::raw(" to quit "),
        Span::raw(" | Press "),
        Span::styled(
            "?",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Green),
        ),
        Span::raw(" for Help "),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(footer, area);
}
