// Modal UI components.
// Confirmation, message dialog, join input, rules list and help overlay.

use ratatui::{prelude::*, widgets::*};

use crate::api::Rule;

/// Centered rectangle of at most `width` x `height` inside `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn modal_block(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn key_hint<'a>(key: &'a str, label: &'a str) -> [Span<'a>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Yellow)),
        Span::styled(label, Style::default().fg(Color::DarkGray)),
    ]
}

/// Ask the user to confirm an action.
pub fn draw_confirm_modal(frame: &mut Frame, title: &str, prompt: &str) {
    let modal_area = centered(frame.area(), 60, 8);
    frame.render_widget(Clear, modal_area);

    let mut hints = vec![Span::raw(" ")];
    hints.extend(key_hint("y/Enter", " = Ja  "));
    hints.extend(key_hint("n/Esc", " = Nein "));

    let text = vec![
        Line::from(prompt),
        Line::from(""),
        Line::from(hints).alignment(Alignment::Center),
    ];
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(modal_block(title, Color::Yellow));
    frame.render_widget(paragraph, modal_area);
}

/// Rows for a dialog showing `message`: its lines plus borders, spacer and hint.
fn dialog_height(message: &str) -> u16 {
    u16::try_from(message.lines().count())
        .unwrap_or(u16::MAX)
        .saturating_add(5)
}

/// Blocking message. Reload dialogs say that the panel starts over on close.
pub fn draw_dialog_modal(frame: &mut Frame, message: &str, reload: bool) {
    let modal_area = centered(frame.area(), 60, dialog_height(message));
    frame.render_widget(Clear, modal_area);

    let mut text: Vec<Line> = message.lines().map(Line::from).collect();
    text.push(Line::from(""));
    let mut hints = vec![Span::raw(" ")];
    hints.extend(key_hint("Enter", if reload { " = Neu laden" } else { " = OK" }));
    text.push(Line::from(hints).alignment(Alignment::Center));

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(modal_block("Hinweis", Color::Red));
    frame.render_widget(paragraph, modal_area);
}

/// Name input for joining the game.
pub fn draw_join_modal(frame: &mut Frame, input: &str) {
    let modal_area = centered(frame.area(), 50, 5);
    frame.render_widget(Clear, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Length(2), // Instructions
        ])
        .split(modal_area);

    let input_line = Line::from(vec![
        Span::styled("Name: ", Style::default().fg(Color::DarkGray)),
        Span::raw(input),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]);
    let input_widget = Paragraph::new(input_line).block(modal_block("Beitreten", Color::Cyan));
    frame.render_widget(input_widget, chunks[0]);

    let mut hints = vec![Span::raw(" ")];
    hints.extend(key_hint("Enter", " = Beitreten  "));
    hints.extend(key_hint("Esc", " = Abbrechen "));
    frame.render_widget(
        Paragraph::new(Line::from(hints)).alignment(Alignment::Center),
        chunks[1],
    );
}

/// Rules of the active ruleset.
pub fn draw_rules_modal(frame: &mut Frame, rules: &[Rule]) {
    let modal_area = centered(frame.area(), 50, rules.len() as u16 + 4);
    frame.render_widget(Clear, modal_area);
    let block = modal_block("Regeln", Color::Cyan);

    if rules.is_empty() {
        let empty = Paragraph::new("Keine Regeln")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, modal_area);
        return;
    }

    let items: Vec<ListItem> = rules
        .iter()
        .map(|rule| {
            let chips = if rule.is_schockaus() {
                "alle".to_string()
            } else {
                rule.chips.to_string()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {:<24}", rule.name), Style::default().fg(Color::White)),
                Span::styled(chips, Style::default().fg(Color::Yellow)),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), modal_area);
}

/// Draw the help overlay.
pub fn draw_help_overlay(frame: &mut Frame) {
    let popup_area = centered(frame.area(), 55, 20);
    frame.render_widget(Clear, popup_area);

    let entries = [
        ("  ↑/↓ ←/→       ", "Auswahl ändern"),
        ("  Tab/Shift-Tab ", "Nächstes / voriges Feld"),
        ("  Enter         ", "Chips verteilen (Korrektur)"),
        ("  d             ", "Spieler entfernen"),
        ("  a             ", "Zum Admin ernennen"),
        ("  b             ", "Zurück zum Warteraum"),
        ("  s             ", "Würfel sortieren"),
        ("  x             ", "Startchips verteilen"),
        ("  v             ", "Aufdecken"),
        ("  l / L         ", "Nach dem Spiel gehen / zur Lobby"),
        ("  j             ", "Beitreten"),
        ("  m             ", "Manuelle Korrektur ein/aus"),
        ("  i             ", "Regeln"),
        ("  r             ", "Neu laden"),
        ("  q             ", "Beenden"),
    ];

    let mut help_text = vec![
        Line::from(Span::styled(
            "Tastenbelegung",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    help_text.extend(entries.iter().map(|(keys, label)| {
        Line::from(vec![
            Span::styled(*keys, Style::default().fg(Color::Cyan)),
            Span::raw(*label),
        ])
    }));

    let help_paragraph = Paragraph::new(help_text)
        .block(modal_block("Hilfe", Color::Cyan))
        .alignment(Alignment::Left);
    frame.render_widget(help_paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_small_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered(area, 60, 8);
        assert_eq!(rect, Rect::new(0, 1, 40, 8));
    }

    #[test]
    fn test_centered_in_large_area() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered(area, 60, 20), Rect::new(20, 10, 60, 20));
    }

    #[test]
    fn test_dialog_height_saturates() {
        assert_eq!(dialog_height("Spiel beendet"), 6);
        assert_eq!(dialog_height(&"x\n".repeat(70_000)), u16::MAX);
    }

    #[test]
    fn test_draw_dialog_with_huge_message() {
        let backend = ratatui::backend::TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let message = "Zeile\n".repeat(70_000);
        terminal
            .draw(|frame| draw_dialog_modal(frame, &message, true))
            .unwrap();
    }
}
