//! All drawing / rendering functions.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Row, Table};

use crate::format::{format_currency, format_percent, format_weight};
use crate::pricing::{STATUS_INVALID, STATUS_SAVED, TableRow};
use crate::store::SettingsStore;

use super::app::{App, Focus, Popup};

const CONTROLS: &str =
    "Tab: focus | \u{2190}/\u{2192}: discount (Shift \u{00b1}5) | Enter/Ctrl-S: save | Esc: quit";

pub fn draw<S: SettingsStore>(frame: &mut ratatui::Frame, app: &App<S>) {
    draw_main(frame, app);
    match app.popup {
        Popup::None => {}
        Popup::Pin => draw_pin_popup(frame, app),
    }
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn draw_main<S: SettingsStore>(frame: &mut ratatui::Frame, app: &App<S>) {
    let area = frame.area();
    let outer = Block::default()
        .title(" gold-melt ")
        .title_alignment(Alignment::Left)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Spot
            Constraint::Length(3), // Discount
            Constraint::Min(6),    // Table
            Constraint::Length(1), // Status
            Constraint::Length(1), // Controls
        ])
        .split(inner);

    let spot = Paragraph::new(app.view.spot_text()).block(
        Block::default()
            .title(" Spot ($/oz) ")
            .borders(Borders::ALL)
            .border_style(field_style(app.focus == Focus::Spot)),
    );
    frame.render_widget(spot, chunks[0]);

    let discount = app.view.discount();
    let slider = Gauge::default()
        .block(
            Block::default()
                .title(" Discount ")
                .borders(Borders::ALL)
                .border_style(field_style(app.focus == Focus::Discount)),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((discount / 100.0).clamp(0.0, 1.0))
        .label(format!("{}%", format_percent(discount)));
    frame.render_widget(slider, chunks[1]);

    draw_table(frame, app, chunks[2]);

    let status_color = match app.screen.status.as_str() {
        STATUS_INVALID => Color::Red,
        STATUS_SAVED => Color::Green,
        _ => Color::Gray,
    };
    let status = Paragraph::new(app.screen.status.as_str()).style(Style::default().fg(status_color));
    frame.render_widget(status, chunks[3]);

    let help = Paragraph::new(CONTROLS)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[4]);
}

fn draw_table<S: SettingsStore>(frame: &mut ratatui::Frame, app: &App<S>, area: Rect) {
    let rows: Vec<Row> = app
        .screen
        .rows
        .iter()
        .map(|row| match row {
            TableRow::Header { section } => Row::new(vec![section.title().to_string()]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            TableRow::Coin(coin) => Row::new(vec![
                format!("  {}", coin.coin.label),
                format_weight(coin.coin.agw_ounces),
                format_currency(coin.melt_value),
            ]),
        })
        .collect();

    let header = Row::new(vec![
        "Coin".to_string(),
        "AGW oz".to_string(),
        app.screen.header.clone(),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let widths = [
        Constraint::Min(26),
        Constraint::Length(10),
        Constraint::Length(16),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(" Melt values ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn draw_pin_popup<S: SettingsStore>(frame: &mut ratatui::Frame, app: &App<S>) {
    let area = centered_rect(40, 8, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", app.pin_prompt()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Entry
            Constraint::Length(1), // Message
            Constraint::Min(0),    // Help
        ])
        .split(inner);

    let masked = "\u{2022}".repeat(app.pin_input.chars().count());
    let entry = Paragraph::new(masked).block(
        Block::default()
            .title(" PIN ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(entry, chunks[0]);

    if let Some(message) = app.pin_message {
        let style = if app.pin.is_unlocked() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };
        frame.render_widget(Paragraph::new(message).style(style), chunks[1]);
    }

    let help = Paragraph::new("Enter: unlock | Esc: quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
