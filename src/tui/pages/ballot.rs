use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::sync::Arc;

use crate::api::{Election, NtrovoteClient};
use crate::routing::{Navigator, Route};
use crate::settings::ClientSettings;
use crate::theme::{get_list_item_style, ThemeColors};
use crate::tui::widgets::{centered_rect, key_hints, titled_block, Notice};
use crate::vote::{VotePhase, VoteWorkflow};

pub struct BallotPage {
    client: NtrovoteClient,
    navigator: Navigator,
    settings: ClientSettings,
    election_id: i64,

    // Data
    election: Option<Election>,

    // UI State
    cursor: usize,
    notice: Notice,
    workflow: Arc<VoteWorkflow<NtrovoteClient>>,
}

impl BallotPage {
    pub fn new(client: NtrovoteClient, navigator: Navigator, settings: ClientSettings, election_id: i64) -> Self {
        let workflow = Arc::new(VoteWorkflow::new(client.clone(), navigator.clone(), election_id));
        Self {
            client,
            navigator,
            settings,
            election_id,
            election: None,
            cursor: 0,
            notice: Notice::default(),
            workflow,
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        match self.client.get_election(self.election_id).await {
            Ok(election) => self.election = Some(election),
            Err(e) => {
                log::warn!("Failed to load election {}: {}", self.election_id, e);
                self.notice.error(e.user_message("Failed to load election"));
            }
        }
        Ok(())
    }

    pub fn update(&mut self) {
        self.notice.expire();
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        match self.workflow.phase() {
            VotePhase::Confirming => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.confirm(),
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.workflow.cancel();
                }
                _ => {}
            },
            VotePhase::Submitting | VotePhase::Succeeded => {}
            VotePhase::Selecting | VotePhase::Failed => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
                KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
                KeyCode::Char(' ') => {
                    // From a failed attempt this is the retry and returns to selecting.
                    if let Some(id) = self.highlighted() {
                        self.workflow.select(id);
                    }
                }
                KeyCode::Enter => self.cast(),
                KeyCode::Esc | KeyCode::Backspace => {
                    self.navigator.navigate(Route::VoterHome);
                }
                _ => {}
            },
        }
        Ok(())
    }

    fn move_cursor(&mut self, delta: isize) {
        let Some(election) = &self.election else {
            return;
        };
        if election.nominees.is_empty() {
            return;
        }
        let last = election.nominees.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    fn cast(&mut self) {
        let open = self.election.as_ref().is_some_and(Election::is_open);
        if !open {
            self.notice.error("This election is closed");
            return;
        }
        let Some(selected) = self.workflow.selected() else {
            self.notice.error("Select a nominee first (Space)");
            return;
        };
        if self.workflow.phase() == VotePhase::Failed {
            self.workflow.select(selected);
        }
        self.workflow.cast();
    }

    fn highlighted(&self) -> Option<i64> {
        self.election
            .as_ref()
            .and_then(|e| e.nominees.get(self.cursor))
            .map(|n| n.id)
    }

    fn confirm(&self) {
        let workflow = Arc::clone(&self.workflow);
        tokio::spawn(async move {
            workflow.confirm().await;
        });
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Election header
                Constraint::Min(5),    // Nominees
                Constraint::Length(2), // Status
                Constraint::Length(1), // Hints
            ])
            .split(area);

        let Some(election) = &self.election else {
            let loading = Paragraph::new("Loading ballot...")
                .alignment(Alignment::Center)
                .block(titled_block(" Ballot ", theme));
            frame.render_widget(loading, chunks[1]);
            self.notice.render(frame, chunks[2], theme);
            return;
        };

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                election.title.clone(),
                Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                election.description.clone().unwrap_or_default(),
                Style::default().fg(theme.text_secondary),
            )),
        ])
        .wrap(Wrap { trim: true })
        .block(titled_block(" 🗳️  Ballot ", theme));
        frame.render_widget(header, chunks[0]);

        let attempt = self.workflow.snapshot();
        let items: Vec<ListItem> = election
            .nominees
            .iter()
            .enumerate()
            .map(|(i, nominee)| {
                let marker = if attempt.selected == Some(nominee.id) { "(●)" } else { "( )" };
                let mut lines = vec![Line::from(Span::styled(
                    format!("{} {}", marker, nominee.name),
                    get_list_item_style(theme, i == self.cursor),
                ))];
                if let Some(details) = nominee.details.as_deref().filter(|d| !d.is_empty()) {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", details),
                        Style::default().fg(theme.text_secondary),
                    )));
                }
                if let Some(image) = nominee.image_url.as_deref() {
                    lines.push(Line::from(Span::styled(
                        format!("      🖼  {}", self.settings.asset_url(image)),
                        Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(
            List::new(items).block(titled_block(" Nominees ", theme)),
            chunks[1],
            &mut state,
        );

        let status = match (attempt.phase, attempt.message.as_deref()) {
            (VotePhase::Submitting, _) => Some(Span::styled("Submitting your vote...", Style::default().fg(theme.warning))),
            (VotePhase::Succeeded, Some(message)) => Some(Span::styled(
                format!("✅ {}", message),
                Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
            )),
            (VotePhase::Failed, Some(message)) => Some(Span::styled(
                format!("❌ {}", message),
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            )),
            _ => None,
        };
        match status {
            Some(span) => frame.render_widget(Paragraph::new(Line::from(span)), chunks[2]),
            None => self.notice.render(frame, chunks[2], theme),
        }

        let hints = if attempt.phase == VotePhase::Confirming {
            key_hints(&[("y", "Confirm"), ("n", "Cancel")], theme)
        } else {
            key_hints(&[("↑/↓", "Move"), ("Space", "Select"), ("Enter", "Cast vote"), ("Esc", "Back")], theme)
        };
        frame.render_widget(Paragraph::new(hints), chunks[3]);

        if attempt.phase == VotePhase::Confirming {
            let name = attempt
                .selected
                .and_then(|id| election.nominee(id))
                .map(|n| n.name.as_str())
                .unwrap_or("this nominee");
            let popup = centered_rect(50, 5, area);
            frame.render_widget(Clear, popup);
            let confirm = Paragraph::new(vec![
                Line::from(format!("Cast your vote for {}?", name)),
                Line::from(Span::styled("This cannot be undone.", Style::default().fg(theme.text_secondary))),
            ])
            .alignment(Alignment::Center)
            .style(Style::default().bg(theme.container).fg(theme.text))
            .block(titled_block(" Confirm vote ", theme));
            frame.render_widget(confirm, popup);
        }
    }
}

impl Drop for BallotPage {
    fn drop(&mut self) {
        self.workflow.teardown();
    }
}
