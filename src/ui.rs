//! TUI rendering for geofix
//!
//! This module handles all UI rendering logic using the `ratatui` crate:
//! the summary view with the current resolution state and the world map view
//! with a crosshair on the resolved position.

use crate::app::{App, ViewMode};
use crate::models::{format_accuracy, format_coords, ResolutionState};
use ratatui::{
    prelude::*,
    widgets::{canvas::*, *},
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Renders one frame of the TUI based on current application state.
///
/// The body is drawn according to [`App::view_mode`]; a one-line footer with
/// the key bindings is always shown.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.size());

    match app.view_mode {
        ViewMode::Summary => render_summary_view(f, app, chunks[0]),
        ViewMode::Map => render_map_view(f, app, chunks[0]),
    }

    render_footer(f, chunks[1]);
}

/// Summary view: a centered status panel.
///
/// Shows a spinner while a resolution is in flight, the coordinates with
/// their source and settle time on success, or the failure message in red.
fn render_summary_view(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(10),
            Constraint::Min(0),
        ])
        .split(area);
    let panel = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(15),
            Constraint::Percentage(70),
            Constraint::Percentage(15),
        ])
        .split(rows[1])[1];

    let label = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = match &app.location {
        ResolutionState::Loading => vec![Line::from(vec![
            Span::styled(
                format!("{} ", SPINNER[app.tick_count % SPINNER.len()]),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("Determining your location..."),
        ])],
        ResolutionState::Located {
            coordinates,
            source,
            accuracy_m,
        } => vec![
            Line::from(vec![
                Span::styled("Position: ", label),
                Span::styled(
                    format_coords(coordinates.latitude, coordinates.longitude),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Source:   ", label),
                Span::styled(source.to_string(), Style::default().fg(Color::Magenta)),
            ]),
            Line::from(vec![
                Span::styled("Accuracy: ", label),
                Span::raw(format_accuracy(*accuracy_m)),
            ]),
        ],
        ResolutionState::Failed(message) => vec![Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Red),
        ))],
    };

    if let Some(at) = app.last_settled {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Updated:  ", label),
            Span::styled(
                at.format("%H:%M:%S").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Location ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .padding(Padding::new(2, 2, 1, 1)),
        );
    f.render_widget(p, panel);
}

fn render_map_view(f: &mut Frame, app: &App, area: Rect) {
    let target = app.location.coordinates();

    let map = Canvas::default()
        .block(Block::bordered().title(" World Map "))
        .marker(symbols::Marker::Braille)
        .x_bounds([-180.0, 180.0])
        .y_bounds([-90.0, 90.0])
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::Rgb(50, 50, 50),
                resolution: MapResolution::High,
            });

            match target {
                Some(c) => {
                    ctx.layer();
                    ctx.print(
                        c.longitude,
                        c.latitude,
                        Line::from(Span::styled(
                            " ⌖ ",
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        )),
                    );
                }
                None => ctx.print(
                    -20.0,
                    0.0,
                    Line::from(Span::styled(
                        if app.location.is_loading() {
                            "locating..."
                        } else {
                            "no position"
                        },
                        Style::default().fg(Color::DarkGray),
                    )),
                ),
            }
        });

    f.render_widget(map, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(" r", key),
        Span::raw(" refresh  "),
        Span::styled("Tab", key),
        Span::raw(" switch view  "),
        Span::styled("q", key),
        Span::raw(" quit"),
    ]))
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}
