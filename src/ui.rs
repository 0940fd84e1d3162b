use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::app::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const CONFIRM_TEXT: &str = "Cancel this session? (y/n)";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(1), // padding
                Constraint::Length(3), // counters
                Constraint::Length(1), // padding
                Constraint::Length(1), // controls
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "Kick count",
            Style::default().patch(bold_style).fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(chunks[2]);

        let cells = [
            ("Time left", self.countdown.clone()),
            ("Movements", self.actual.to_string()),
            ("Effective", self.effective.to_string()),
        ];
        for ((title, value), column) in cells.into_iter().zip(columns.iter()) {
            Paragraph::new(Span::styled(value, bold_style))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title))
                .render(*column, buf);
        }

        let primary_style = if self.record_enabled {
            Style::default().patch(bold_style).fg(Color::Green)
        } else {
            dim_style
        };
        let cancel_style = if self.cancel_enabled {
            Style::default().fg(Color::Yellow)
        } else {
            dim_style
        };
        let controls = Line::from(vec![
            Span::styled(format!("(space) {}", self.start_label), primary_style),
            Span::raw("   "),
            Span::styled("(c)ancel", cancel_style),
            Span::raw("   "),
            Span::styled("(esc)ape", italic_style),
        ]);
        Paragraph::new(controls)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        if self.confirming_cancel {
            let popup = centered(area, CONFIRM_TEXT.len() as u16 + 4, 3);
            Clear.render(popup, buf);
            Paragraph::new(Span::styled(CONFIRM_TEXT, bold_style))
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Yellow)),
                )
                .render(popup, buf);
        }
    }
}

/// A `width` x `height` rect centred in `area`, clipped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
