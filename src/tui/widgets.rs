use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::{Duration, Instant};

use crate::theme::{get_border_style, get_title_style, ThemeColors};

const NOTICE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A one-line message under a page that goes away by itself.
#[derive(Debug, Default)]
pub struct Notice {
    current: Option<(String, NoticeKind, Instant)>,
}

impl Notice {
    pub fn success(&mut self, message: impl Into<String>) {
        self.current = Some((message.into(), NoticeKind::Success, Instant::now()));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.current = Some((message.into(), NoticeKind::Error, Instant::now()));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Drops the message once it has been shown long enough.
    pub fn expire(&mut self) {
        if let Some((_, _, shown_at)) = &self.current {
            if shown_at.elapsed() >= NOTICE_TIMEOUT {
                self.current = None;
            }
        }
    }

    pub fn text(&self) -> Option<(&str, NoticeKind)> {
        self.current.as_ref().map(|(text, kind, _)| (text.as_str(), *kind))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let Some((text, kind)) = self.text() else {
            return;
        };
        let (icon, color) = match kind {
            NoticeKind::Success => ("✅", theme.success),
            NoticeKind::Error => ("❌", theme.error),
        };
        let line = Paragraph::new(format!("{} {}", icon, text))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .wrap(Wrap { trim: true });
        frame.render_widget(line, area);
    }
}

pub enum FormAction {
    None,
    Submit,
    Cancel,
}

/// Small multi-field text form. Tab moves between fields, Enter on the last field submits.
pub struct Form {
    title: String,
    fields: Vec<FormField>,
    active: usize,
}

struct FormField {
    label: &'static str,
    value: String,
}

impl Form {
    pub fn new(title: impl Into<String>, labels: &[&'static str]) -> Self {
        Self {
            title: title.into(),
            fields: labels
                .iter()
                .map(|&label| FormField {
                    label,
                    value: String::new(),
                })
                .collect(),
            active: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.trim()).unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.active = (self.active + 1) % self.fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.active = (self.active + self.fields.len() - 1) % self.fields.len()
            }
            KeyCode::Enter => {
                if self.active + 1 == self.fields.len() {
                    return FormAction::Submit;
                }
                self.active += 1;
            }
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.active) {
                    field.value.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.active) {
                    field.value.push(c);
                }
            }
            _ => {}
        }
        FormAction::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let height = self.fields.len() as u16 * 3 + 4;
        let popup = centered_rect(60, height, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.accent))
            .title(format!(" {} ", self.title))
            .title_style(get_title_style(theme))
            .style(Style::default().bg(theme.container));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut constraints: Vec<Constraint> = self.fields.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Min(1));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (i, field) in self.fields.iter().enumerate() {
            frame.render_widget(input_box(field.label, &field.value, i == self.active, theme), rows[i]);
        }

        let hints = key_hints(&[("Tab", "Next field"), ("Enter", "Save"), ("Esc", "Cancel")], theme);
        frame.render_widget(Paragraph::new(hints), rows[self.fields.len()]);
    }
}

pub fn input_box<'a>(label: &'a str, value: &'a str, focused: bool, theme: &ThemeColors) -> Paragraph<'a> {
    let (text_style, border_style) = if focused {
        (
            Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
            Style::default().fg(theme.warning),
        )
    } else {
        (Style::default().fg(theme.text), get_border_style(theme))
    };

    Paragraph::new(value).style(text_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(label)
            .border_type(BorderType::Rounded)
            .border_style(border_style),
    )
}

/// Key/description pairs the way the footer shows them.
pub fn key_hints<'a>(shortcuts: &[(&'a str, &'a str)], theme: &ThemeColors) -> Line<'a> {
    let spans: Vec<Span> = shortcuts
        .iter()
        .enumerate()
        .flat_map(|(i, (key, desc))| {
            let mut spans = vec![
                Span::styled(*key, Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}", desc), Style::default().fg(theme.text_secondary)),
            ];
            if i < shortcuts.len() - 1 {
                spans.push(Span::raw("  "));
            }
            spans
        })
        .collect();
    Line::from(spans)
}

pub fn titled_block<'a>(title: impl Into<Line<'a>>, theme: &ThemeColors) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(get_border_style(theme))
        .title(title)
        .title_style(get_title_style(theme))
}

pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn form_fills_fields_in_order_and_submits_on_last() {
        let mut form = Form::new("Add voter", &["Phone", "Name"]);
        for c in "9876543210".chars() {
            form.handle_key(press(KeyCode::Char(c)));
        }
        assert!(matches!(form.handle_key(press(KeyCode::Enter)), FormAction::None));
        for c in "Asha ".chars() {
            form.handle_key(press(KeyCode::Char(c)));
        }
        assert!(matches!(form.handle_key(press(KeyCode::Enter)), FormAction::Submit));

        assert_eq!(form.value(0), "9876543210");
        assert_eq!(form.value(1), "Asha");
        assert_eq!(form.value(7), "");
    }

    #[test]
    fn notice_can_be_replaced_and_cleared() {
        let mut notice = Notice::default();
        notice.error("Failed to vote");
        notice.success("Saved");
        assert_eq!(notice.text(), Some(("Saved", NoticeKind::Success)));

        notice.expire();
        assert!(notice.text().is_some());
        notice.clear();
        assert_eq!(notice.text(), None);
    }
}
