use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::api::{Election, NtrovoteClient};
use crate::routing::{Navigator, Route};
use crate::theme::{get_list_item_style, ThemeColors};
use crate::tui::widgets::{key_hints, titled_block, Notice};

use super::format_window;

pub struct VoterHomePage {
    client: NtrovoteClient,
    navigator: Navigator,

    // Data
    elections: Vec<Election>,

    // UI State
    selected: usize,
    loading: bool,
    notice: Notice,
}

impl VoterHomePage {
    pub fn new(client: NtrovoteClient, navigator: Navigator) -> Self {
        Self {
            client,
            navigator,
            elections: Vec::new(),
            selected: 0,
            loading: false,
            notice: Notice::default(),
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.loading = true;
        match self.client.get_active_elections().await {
            Ok(elections) => {
                self.elections = elections;
                self.selected = self.selected.min(self.elections.len().saturating_sub(1));
            }
            Err(e) => {
                log::warn!("Failed to load active elections: {}", e);
                self.notice.error(e.user_message("Failed to load elections"));
            }
        }
        self.loading = false;
        Ok(())
    }

    pub fn update(&mut self) {
        self.notice.expire();
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.elections.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(election) = self.elections.get(self.selected) {
                    self.navigator.navigate(Route::Ballot(election.id));
                }
            }
            KeyCode::F(5) | KeyCode::Char('r') => self.refresh().await?,
            _ => {}
        }
        Ok(())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Elections
                Constraint::Length(1), // Notice
                Constraint::Length(1), // Hints
            ])
            .split(area);

        let title = match self.navigator.session().current().subject() {
            Some(phone) => format!(" 🗳️  Active elections for {} ", phone),
            None => " 🗳️  Active elections ".to_string(),
        };

        if self.elections.is_empty() {
            let text = if self.loading {
                "Loading elections..."
            } else {
                "There are no open elections right now."
            };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC))
                .alignment(Alignment::Center)
                .block(titled_block(title, theme));
            frame.render_widget(empty, chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .elections
                .iter()
                .enumerate()
                .map(|(i, election)| {
                    let style = get_list_item_style(theme, i == self.selected);
                    let mut lines = vec![Line::from(Span::styled(election.title.clone(), style))];
                    if let Some(description) = election.description.as_deref().filter(|d| !d.is_empty()) {
                        lines.push(Line::from(Span::styled(
                            format!("   {}", description),
                            Style::default().fg(theme.text_secondary),
                        )));
                    }
                    lines.push(Line::from(Span::styled(
                        format!("   {}", format_window(election)),
                        Style::default().fg(theme.text_secondary),
                    )));
                    ListItem::new(lines)
                })
                .collect();

            let mut state = ListState::default().with_selected(Some(self.selected));
            let list = List::new(items).block(titled_block(title, theme));
            frame.render_stateful_widget(list, chunks[0], &mut state);
        }

        self.notice.render(frame, chunks[1], theme);
        frame.render_widget(
            Paragraph::new(key_hints(&[("↑/↓", "Select"), ("Enter", "Vote"), ("r", "Refresh")], theme)),
            chunks[2],
        );
    }
}
