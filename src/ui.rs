use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::layout::{PanelRow, RowKind};
use crate::panel::Panel;

const HELP_TEXT: &str = "q quit | Tab focus | \u{2191}/\u{2193} select | Enter attach | r resume | x kill";

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());
    let panel_area = chunks[0];

    if !app.panel.shown {
        app.regions.clear();
        draw_help_bar(frame, app, chunks[1]);
        return;
    }
    if panel_area.width < Panel::MIN_WIDTH || panel_area.height < Panel::MIN_HEIGHT {
        draw_too_small(frame, panel_area);
        app.regions.clear();
        return;
    }

    app.panel.x = panel_area.x;
    app.panel.y = panel_area.y;
    app.panel.width = panel_area.width;
    app.panel.height = panel_area.height;

    let rendered = app.panel.draw(&app.sessions, true, false);

    let border_style = if app.panel.focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" Agent Sessions ({}) ", app.sessions.len()));
    let inner = block.inner(panel_area);
    frame.render_widget(block, panel_area);

    let lines: Vec<Line> = rendered.rows.iter().map(row_line).collect();
    frame.render_widget(Paragraph::new(lines), inner);

    app.regions = rendered.regions;

    draw_help_bar(frame, app, chunks[1]);
}

fn draw_too_small(frame: &mut Frame, area: Rect) {
    let msg = format!(
        "Terminal too small (need {}x{})",
        Panel::MIN_WIDTH,
        Panel::MIN_HEIGHT
    );
    frame.render_widget(
        Paragraph::new(Span::styled(msg, Style::default().fg(Color::Yellow))),
        area,
    );
}

/// Style one panel row. Data rows get the status badge colored in place,
/// using the layout's status offset rather than re-parsing the text.
fn row_line(row: &PanelRow) -> Line<'static> {
    match &row.kind {
        RowKind::Header => Line::from(Span::styled(
            row.text.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        RowKind::EmptyNotice => Line::from(Span::styled(
            row.text.clone(),
            Style::default().fg(Color::DarkGray),
        )),
        RowKind::Blank => Line::from(row.text.clone()),
        RowKind::Data {
            selected,
            status,
            status_offset,
        } => {
            let base = if *selected {
                Style::default()
                    .bg(Color::Cyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let chars: Vec<char> = row.text.chars().collect();
            let start = (*status_offset).min(chars.len());
            let end = (start + status.chars().count()).min(chars.len());
            let head: String = chars[..start].iter().collect();
            let badge: String = chars[start..end].iter().collect();
            let tail: String = chars[end..].iter().collect();
            let badge_style = if *selected {
                base
            } else {
                base.fg(status_color(status))
            };
            Line::from(vec![
                Span::styled(head, base),
                Span::styled(badge, badge_style),
                Span::styled(tail, base),
            ])
        }
    }
}

fn status_color(status: &str) -> Color {
    match status {
        "Waiting" => Color::Green,
        "Running" => Color::Red,
        _ => Color::DarkGray,
    }
}

fn draw_help_bar(frame: &mut Frame, app: &App, area: Rect) {
    let text = app
        .status_message
        .clone()
        .unwrap_or_else(|| HELP_TEXT.to_string());
    frame.render_widget(
        Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_colors_distinguish_states() {
        assert_eq!(status_color("Waiting"), Color::Green);
        assert_eq!(status_color("Running"), Color::Red);
        assert_eq!(status_color("Stopped"), Color::DarkGray);
    }

    #[test]
    fn data_row_splits_around_status_badge() {
        let line = row_line(&PanelRow {
            y: 2,
            text: "agent-claude-1  claude Running 09:30:15".to_string(),
            kind: RowKind::Data {
                selected: false,
                status: "Running",
                status_offset: 23,
            },
        });
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[0].content, "agent-claude-1  claude ");
        assert_eq!(line.spans[1].content, "Running");
        assert_eq!(line.spans[1].style.fg, Some(Color::Red));
        assert_eq!(line.spans[2].content, " 09:30:15");
    }

    #[test]
    fn selected_row_keeps_highlight_over_status() {
        let line = row_line(&PanelRow {
            y: 2,
            text: "id Waiting rest".to_string(),
            kind: RowKind::Data {
                selected: true,
                status: "Waiting",
                status_offset: 3,
            },
        });
        for span in &line.spans {
            assert_eq!(span.style.bg, Some(Color::Cyan));
        }
        assert_eq!(line.spans[1].style.fg, Some(Color::Black));
    }

    #[test]
    fn status_offset_past_text_end_is_tolerated() {
        let line = row_line(&PanelRow {
            y: 2,
            text: "short".to_string(),
            kind: RowKind::Data {
                selected: false,
                status: "Running",
                status_offset: 40,
            },
        });
        assert_eq!(line.spans[0].content, "short");
        assert_eq!(line.spans[1].content, "");
    }

    #[test]
    fn header_row_is_bold() {
        let line = row_line(&PanelRow {
            y: 1,
            text: "Session: Status:".to_string(),
            kind: RowKind::Header,
        });
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }
}
