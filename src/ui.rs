use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Line as TextLine,
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap,
        canvas::{Canvas, Context, Line, Rectangle},
    },
};
use std::time::Instant;

use crate::chart::{Bar, ChartLayout};
use crate::map_draw::{MapView, rgb};
use crate::quakes::{LEGEND_GRADES, magnitude_color};
use crate::state::AppState;
use crate::view::Popup;

/// Horizontal strokes used to fill one bar.
const FILL_STROKES: usize = 6;

pub fn draw(f: &mut Frame, state: &AppState, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(f.area());

    // Left: park list
    let items: Vec<ListItem> = state.list_items
        .iter()
        .map(|i| ListItem::new(i.clone()))
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Parks"))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Red));
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    // Center: map
    let highlight = state.selected_name();
    MapView::new(&state.catalog, &state.quakes, &state.view, highlight).render(f, chunks[1], now);

    // Right: info + magnitude legend
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);

    let info = Paragraph::new(state.info_text())
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, right[0]);

    let legend: Vec<TextLine> = LEGEND_GRADES
        .iter()
        .map(|g| {
            TextLine::styled(
                format!("● {}", g),
                Style::default().fg(rgb(magnitude_color(*g))),
            )
        })
        .collect();
    let legend = Paragraph::new(legend)
        .block(Block::default().borders(Borders::ALL).title("Magnitude"));
    f.render_widget(legend, right[1]);

    if let Some(popup) = state.view.popup() {
        draw_popup(f, popup, chunks[1]);
    }
}

/// Both charts side by side over the lower part of the map.
fn draw_popup(f: &mut Frame, popup: &Popup, map_area: Rect) {
    let height = (map_area.height * 3 / 4).max(10).min(map_area.height);
    let area = Rect {
        x: map_area.x,
        y: map_area.y + map_area.height - height,
        width: map_area.width,
        height,
    };
    f.render_widget(Clear, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let overlay = popup.focus.map(|i| popup.charts.overlay(i)).unwrap_or_default();
    let left_title = format!("{} (Esc closes)", popup.park());
    draw_chart(f, halves[0], &popup.charts.category, &overlay, &left_title);

    let right_title = match popup.focused_key() {
        Some(key) => format!("focus: {} (←/→)", key),
        None => "←/→ focus a status".to_string(),
    };
    draw_chart(f, halves[1], &popup.charts.status, &[], &right_title);
}

fn fill_bar(ctx: &mut Context, bar: &Bar, flip: f64, color: Color) {
    if bar.width <= 0.0 {
        return;
    }
    let top = flip - bar.y;
    for i in 0..=FILL_STROKES {
        let y = top - bar.height * i as f64 / FILL_STROKES as f64;
        ctx.draw(&Line { x1: bar.x, y1: y, x2: bar.x + bar.width, y2: y, color });
    }
}

fn draw_chart(f: &mut Frame, area: Rect, layout: &ChartLayout, overlay: &[Bar], title: &str) {
    let frame = &layout.frame;
    // chart y grows downward, canvas y grows upward
    let flip = frame.height;

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .marker(Marker::Braille)
        .x_bounds([0.0, frame.width])
        .y_bounds([0.0, frame.height])
        .paint(|ctx| {
            for bar in &layout.bars {
                fill_bar(ctx, bar, flip, rgb(bar.color));
            }
            ctx.layer();
            for bar in overlay {
                fill_bar(ctx, bar, flip, rgb(bar.color));
                ctx.draw(&Rectangle {
                    x: bar.x,
                    y: flip - bar.y - bar.height,
                    width: bar.width,
                    height: bar.height,
                    color: Color::White,
                });
            }

            // axes
            let baseline = flip - (frame.height - frame.margin_bottom);
            let [x0, x1] = frame.x_range();
            ctx.draw(&Line { x1: x0, y1: baseline, x2: x1, y2: baseline, color: Color::Gray });
            let [y0, y1] = frame.y_range();
            ctx.draw(&Line { x1: x0, y1: flip - y0, x2: x0, y2: flip - y1, color: Color::Gray });

            for tick in &layout.x_ticks {
                ctx.print(tick.x, baseline - 10.0, tick.text.clone());
            }
            for tick in &layout.y_ticks {
                ctx.print(0.0, flip - tick.y, tick.text.clone());
            }
            for label in &layout.value_labels {
                ctx.print(label.x, flip - label.y, label.text.clone());
            }
            for entry in &layout.legend {
                ctx.print(
                    entry.x,
                    flip - entry.y,
                    TextLine::styled(format!("● {}", entry.key), Style::default().fg(rgb(entry.color))),
                );
            }

            if let Some(t) = &layout.title {
                ctx.print(
                    frame.width / 3.0,
                    flip - frame.margin_top / 2.0,
                    TextLine::styled(t.clone(), Style::default().add_modifier(Modifier::BOLD)),
                );
            }
            ctx.print(frame.width / 3.0, flip - frame.margin_top, layout.subtitle.clone());
        });
    f.render_widget(canvas, area);
}
