// UI module for rendering the TUI.
// Draws the game header, roster, admin selects, alert line and status bar.

mod modal;

use ratatui::{prelude::*, widgets::*};

use crate::api::{Game, User};
use crate::app::{App, Focus, Modal};
use crate::panel::SelectList;

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Game header
            Constraint::Min(1),    // Roster and selects
            Constraint::Length(1), // Alert line
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    draw_roster(frame, app, body[0]);
    draw_selects(frame, app, body[1]);

    draw_alert_line(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    // Modals last, on top of everything
    match &app.modal {
        Some(Modal::Confirm { prompt, action }) => {
            modal::draw_confirm_modal(frame, action.title(), prompt)
        }
        Some(Modal::Dialog { message, reload }) => {
            modal::draw_dialog_modal(frame, message, *reload)
        }
        Some(Modal::Join { name }) => modal::draw_join_modal(frame, name),
        Some(Modal::Rules) => modal::draw_rules_modal(frame, app.panel.rules()),
        Some(Modal::Help) => modal::draw_help_overlay(frame),
        None => {}
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let context = app.panel.context();
    let mut spans = vec![
        Span::styled(" Spiel ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            context.game.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(context.identity.label()),
    ];

    if app.panel.is_admin() {
        spans.push(Span::styled("  ★ Admin", Style::default().fg(Color::Yellow)));
    }

    if let Some(game) = app.panel.game() {
        spans.push(Span::styled(
            format!("  {}", game.state.display()),
            Style::default().fg(Color::Green),
        ));
        spans.push(Span::styled(
            format!("  Stapel {}/{}", game.stack, game.stack_max),
            Style::default().fg(Color::DarkGray),
        ));
        if game.reveal_votes > 0 {
            spans.push(Span::styled(
                format!("  Aufdecken: {}", game.reveal_votes),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, area);
}

fn user_line<'a>(user: &'a User, game: &Game) -> Line<'a> {
    let mut spans = vec![Span::raw(user.name.as_str())];
    spans.push(Span::styled(
        format!("  {} Chips", user.chips),
        Style::default().fg(Color::DarkGray),
    ));
    if game.is_admin(user.id) {
        spans.push(Span::styled(" ★", Style::default().fg(Color::Yellow)));
    }
    if user.passive {
        spans.push(Span::styled(" passiv", Style::default().fg(Color::DarkGray)));
    }
    if user.leave_after_game {
        spans.push(Span::styled(" geht", Style::default().fg(Color::Magenta)));
    }
    if user.pending_join {
        spans.push(Span::styled(" wartet", Style::default().fg(Color::Blue)));
    }
    Line::from(spans)
}

fn draw_roster(frame: &mut Frame, app: &App, area: Rect) {
    let block = focus_block(Focus::Roster.title(), app.focus == Focus::Roster);

    let Some(game) = app.panel.game() else {
        let text = Paragraph::new("⏳ Lade Spiel...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        frame.render_widget(text, area);
        return;
    };

    let items: Vec<ListItem> = game
        .users
        .iter()
        .map(|user| ListItem::new(user_line(user, game)))
        .collect();

    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(app.roster_index));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn focus_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", title))
}

fn select_line<'a>(focus: Focus, list: &'a SelectList, app: &App) -> Line<'a> {
    let focused = app.focus == focus;
    let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let value = list
        .selected()
        .map(|option| option.label.as_str())
        .unwrap_or("-");

    Line::from(vec![
        Span::styled(format!(" {:<10}", focus.title()), label_style),
        Span::raw("◂ "),
        Span::styled(value, Style::default().fg(Color::White)),
        Span::raw(" ▸"),
    ])
}

fn draw_selects(frame: &mut Frame, app: &App, area: Rect) {
    let selects = &app.panel.selects;
    let mut lines = Vec::new();

    if app.panel.manual_correction_visible() {
        lines.push(Line::from(Span::styled(
            " Manuelle Korrektur",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(select_line(Focus::TransferSource, &selects.transfer_source, app));
        lines.push(select_line(Focus::StackCount, &selects.stack_count, app));
        lines.push(select_line(Focus::TransferTarget, &selects.transfer_target, app));
        lines.push(Line::from(vec![
            Span::styled("   Enter", Style::default().fg(Color::Yellow)),
            Span::styled(" = Chips verteilen", Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(""));
    }

    lines.push(select_line(Focus::DeleteTarget, &selects.delete_target, app));
    lines.push(select_line(Focus::AdminTarget, &selects.admin_target, app));
    lines.push(Line::from(""));

    let distribute_style = if app.panel.distribute_enabled() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(vec![
        Span::styled(" x", distribute_style),
        Span::styled(" Startchips verteilen", Style::default().fg(Color::DarkGray)),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Admin ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_alert_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(alert) = app.panel.alert() {
        Line::from(Span::styled(
            format!(" {}", alert),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(notice) = &app.notice {
        Line::from(Span::styled(
            format!(" {}", notice),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the status bar with keybinding hints.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut hints = vec![
        Span::raw(" ↑↓ "),
        Span::styled("Auswahl", Style::default().fg(Color::DarkGray)),
        Span::raw("  Tab "),
        Span::styled("Feld", Style::default().fg(Color::DarkGray)),
        Span::raw("  d "),
        Span::styled("Entfernen", Style::default().fg(Color::DarkGray)),
        Span::raw("  a "),
        Span::styled("Admin", Style::default().fg(Color::DarkGray)),
        Span::raw("  m "),
        Span::styled("Korrektur", Style::default().fg(Color::DarkGray)),
        Span::raw("  r "),
        Span::styled("Neu laden", Style::default().fg(Color::DarkGray)),
        Span::raw("  ? "),
        Span::styled("Hilfe", Style::default().fg(Color::DarkGray)),
        Span::raw("  q "),
        Span::styled("Beenden", Style::default().fg(Color::DarkGray)),
    ];

    if app.panel.join_enabled() {
        hints.push(Span::raw("  j "));
        hints.push(Span::styled("Beitreten", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}
