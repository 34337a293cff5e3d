use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use preciario_core::utils::{format_age, truncate_string};
use preciario_core::{CacheState, CacheStatus, Origin, Product};

use crate::app::{App, AppState, ResultView};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let warnings = app.book.warnings();
    let banner_height = if warnings.is_empty() { 0 } else { warnings.len() as u16 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Title bar
            Constraint::Length(banner_height), // Persistence warnings
            Constraint::Length(3),             // Search box
            Constraint::Min(8),                // Results + history
            Constraint::Length(2),             // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    if !warnings.is_empty() {
        render_warning_banner(frame, &warnings, chunks[1]);
    }
    render_search_box(frame, app, chunks[2]);
    render_main_content(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    // Overlays
    if let Some(message) = app.book.status().blocking_message() {
        render_unavailable_overlay(frame, message);
    } else if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    } else if matches!(app.state, AppState::ConfirmingClearHistory) {
        render_clear_history_overlay(frame, app.book.history().len());
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  Preciario";
    let help_hint = "[F1] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_warning_banner(frame: &mut Frame, warnings: &[String], area: Rect) {
    let lines: Vec<Line> = warnings
        .iter()
        .map(|w| {
            Line::from(Span::raw(format!(
                " ! {}",
                truncate_string(w, area.width.saturating_sub(4) as usize)
            )))
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).style(styles::warning_banner_style()),
        area,
    );
}

fn render_search_box(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.state, AppState::Normal) && !app.is_blocked();
    let cursor = if focused { "▌" } else { "" };

    let line = Line::from(vec![
        Span::styled(" > ", styles::muted_style()),
        Span::styled(format!("{}{}", app.search_input, cursor), styles::search_style()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .title(" Scan or type a code / description ");

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    render_results(frame, app, chunks[0]);
    render_history(frame, app, chunks[1]);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let (title, lines) = match &app.result_view {
        ResultView::Idle => (
            " Results ".to_string(),
            vec![Line::from(Span::styled(
                " Scan a barcode or type at least a few letters of a name.",
                styles::muted_style(),
            ))],
        ),
        ResultView::Search { query, matches } if matches.is_empty() => (
            format!(" Results for \"{}\" ", query),
            vec![Line::from(Span::styled(
                " No products found.",
                styles::error_style(),
            ))],
        ),
        ResultView::Search { query, matches } => {
            let label = if matches.len() == 1 { "match" } else { "matches" };
            let lines: Vec<Line> = matches
                .iter()
                .enumerate()
                .flat_map(|(i, p)| product_card(p, i > 0, area.width))
                .collect();
            (
                format!(" Results for \"{}\" ({} {}) ", query, matches.len(), label),
                lines,
            )
        }
        ResultView::History(product) => (
            " From history ".to_string(),
            product_card(product, false, area.width),
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(title);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Lines for one product: name, code, then both prices.
fn product_card(product: &Product, separated: bool, width: u16) -> Vec<Line<'static>> {
    let inner = width.saturating_sub(4) as usize;
    let mut lines = Vec::with_capacity(5);

    if separated {
        lines.push(Line::from(Span::styled(
            "─".repeat(inner),
            styles::muted_style(),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!(" {}", truncate_string(product.display_name(), inner)),
        styles::title_style(),
    )));
    lines.push(Line::from(Span::styled(
        format!(" Code {}", product.code),
        styles::muted_style(),
    )));
    lines.push(Line::from(vec![
        Span::styled(" Credit ", styles::help_desc_style()),
        Span::styled(product.credit_display(), styles::price_style()),
        Span::raw("    "),
        Span::styled("Cash ", styles::help_desc_style()),
        Span::styled(product.cash_display(), styles::price_style()),
    ]));
    lines
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.book.history();
    let inner = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = if history.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            " No lookups yet",
            styles::muted_style(),
        )))]
    } else {
        history
            .iter()
            .map(|p| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        truncate_string(p.display_name(), inner),
                        styles::list_item_style(),
                    )),
                    Line::from(Span::styled(
                        format!("  {}  {}", p.credit_display(), p.cash_display()),
                        styles::muted_style(),
                    )),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.history_selection.is_some()))
        .title(format!(" History ({}) ", history.len()));

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(app.history_selection);
    frame.render_stateful_widget(list, area, &mut state);
}

/// Left side of the status bar: where the prices came from.
fn connection_spans(status: &CacheStatus) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    match (status.state, status.origin) {
        (CacheState::Live, _) | (CacheState::Loading, Some(Origin::Live)) => {
            spans.push(Span::styled(" ● Live ", styles::live_style()));
            spans.push(Span::styled(
                format!("{} items ", status.product_count),
                styles::muted_style(),
            ));
        }
        (CacheState::StaleCached, _) | (CacheState::Loading, Some(Origin::Cached)) => {
            spans.push(Span::styled(" ● Offline ", styles::offline_style()));
            let as_of = match status.as_of {
                Some(t) => {
                    let age = format_age((chrono::Utc::now() - t).num_minutes());
                    format!("prices as of {} ({}) ", t.format("%Y-%m-%d %H:%M"), age)
                }
                None => "saved prices, date unknown ".to_string(),
            };
            spans.push(Span::styled(as_of, styles::muted_style()));
        }
        (CacheState::Unavailable, _) => {
            spans.push(Span::styled(" ● No price list ", styles::error_style()));
        }
        (CacheState::Loading, None) | (CacheState::Uninitialized, _) => {
            spans.push(Span::styled(" Starting... ", styles::muted_style()));
        }
    }

    if status.state == CacheState::Loading {
        spans.push(Span::styled("(updating) ", styles::highlight_style()));
    }
    spans
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[F5] update | [^L] clear history | [^Q] quit";
    let status = app.book.status();

    let mut spans = connection_spans(&status);
    if let Some(ref msg) = app.status_message {
        spans.push(Span::styled(format!("| {} ", msg), styles::muted_style()));
    }

    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(used)
        .saturating_sub(right_text.len());

    spans.push(Span::raw(" ".repeat(padding_len)));
    spans.push(Span::styled(right_text, styles::muted_style()));

    let paragraph = Paragraph::new(Line::from(spans)).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 18, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Preciario", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Search", styles::highlight_style())),
        help_line("  Enter     ", "Look up the typed code or name"),
        help_line("  Esc       ", "Clear input, then results"),
        Line::from(""),
        Line::from(Span::styled(" History", styles::highlight_style())),
        help_line("  ↑/↓       ", "Browse recent lookups"),
        help_line("  Enter     ", "Show the selected entry (empty box)"),
        help_line("  Ctrl+L    ", "Clear history"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("  F5/Ctrl+R ", "Update price list"),
        help_line("  Ctrl+Q    ", "Quit"),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("F1", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_clear_history_overlay(frame: &mut Frame, count: usize) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   Clear all {} history entries?", count),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to clear, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_unavailable_overlay(frame: &mut Frame, message: &str) {
    let area = centered_rect_fixed(56, 9, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" {}", message),
            styles::error_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[R]", styles::help_key_style()),
            Span::styled(" to retry, ", styles::muted_style()),
            Span::styled("[Q]", styles::help_key_style()),
            Span::styled(" to quit", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style())
        .title(" No price list ");

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
