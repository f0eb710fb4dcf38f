use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::path::Path;

use crate::api::{Election, NewNominee, NomineeImage, NomineeResult, NtrovoteClient};
use crate::polling::{results_panel, PollManager};
use crate::routing::{Navigator, Route};
use crate::theme::{get_list_item_style, ThemeColors};
use crate::tui::widgets::{centered_rect, key_hints, titled_block, Form, FormAction, Notice};

use super::{format_window, panel_title, result_lines};

enum Mode {
    Browse,
    AddingNominee(Form),
    ConfirmDelete { nominee_id: i64, name: String },
}

pub struct ManageElectionPage {
    client: NtrovoteClient,
    navigator: Navigator,
    election_id: i64,

    // Data
    election: Option<Election>,
    results: PollManager<Vec<NomineeResult>>,

    // UI State
    selected: usize,
    mode: Mode,
    notice: Notice,
}

impl ManageElectionPage {
    pub fn new(client: NtrovoteClient, navigator: Navigator, election_id: i64) -> Self {
        let mut results = results_panel(&client);
        results.set_target(Some(election_id));
        results.set_visible(true);
        Self {
            client,
            navigator,
            election_id,
            election: None,
            results,
            selected: 0,
            mode: Mode::Browse,
            notice: Notice::default(),
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        match self.client.get_election(self.election_id).await {
            Ok(election) => {
                self.selected = self.selected.min(election.nominees.len().saturating_sub(1));
                self.election = Some(election);
            }
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

    pub fn captures_text(&self) -> bool {
        matches!(self.mode, Mode::AddingNominee(_))
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::AddingNominee(mut form) => match form.handle_key(key) {
                FormAction::Cancel => {}
                FormAction::Submit => self.add_nominee(form).await?,
                FormAction::None => self.mode = Mode::AddingNominee(form),
            },
            Mode::ConfirmDelete { nominee_id, name } => {
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
                    match self.client.delete_nominee(nominee_id).await {
                        Ok(()) => {
                            self.notice.success(format!("Removed {}", name));
                            self.refresh().await?;
                        }
                        Err(e) => self.notice.error(e.user_message("Failed to delete nominee")),
                    }
                }
            }
            Mode::Browse => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    let count = self.election.as_ref().map_or(0, |e| e.nominees.len());
                    if self.selected + 1 < count {
                        self.selected += 1;
                    }
                }
                KeyCode::Char('a') => {
                    let form = Form::new("Add nominee", &["Name", "Details", "Image file (optional)"]);
                    self.mode = Mode::AddingNominee(form);
                }
                KeyCode::Char('d') | KeyCode::Delete => {
                    if let Some(nominee) = self.election.as_ref().and_then(|e| e.nominees.get(self.selected)) {
                        self.mode = Mode::ConfirmDelete {
                            nominee_id: nominee.id,
                            name: nominee.name.clone(),
                        };
                    }
                }
                KeyCode::Char('r') => {
                    self.results.toggle();
                }
                KeyCode::F(5) => self.refresh().await?,
                KeyCode::Esc | KeyCode::Backspace => {
                    self.navigator.navigate(Route::AdminDashboard);
                }
                _ => {}
            },
        }
        Ok(())
    }

    async fn add_nominee(&mut self, form: Form) -> Result<()> {
        let image = match form.value(2) {
            "" => None,
            path => match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let file_name = Path::new(path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "image".to_string());
                    Some(NomineeImage { file_name, bytes })
                }
                Err(e) => {
                    log::warn!("Could not read nominee image {}: {}", path, e);
                    self.notice.error(format!("Could not read {}: {}", path, e));
                    self.mode = Mode::AddingNominee(form);
                    return Ok(());
                }
            },
        };

        let nominee = NewNominee {
            name: form.value(0).to_string(),
            details: form.value(1).to_string(),
            image,
        };
        match self.client.add_nominee(self.election_id, nominee).await {
            Ok(added) => {
                self.notice.success(format!("Added {}", added.name));
                self.refresh().await?;
            }
            Err(e) => self.notice.error(e.user_message("Failed to add nominee")),
        }
        Ok(())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Election
                Constraint::Min(6),    // Nominees and results
                Constraint::Length(1), // Notice
                Constraint::Length(1), // Hints
            ])
            .split(area);

        let header = match &self.election {
            Some(election) => Paragraph::new(vec![
                Line::from(vec![
                    Span::styled(
                        election.title.clone(),
                        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  [{}]", election.status.as_str()),
                        Style::default().fg(if election.is_open() { theme.success } else { theme.text_secondary }),
                    ),
                ]),
                Line::from(Span::styled(format_window(election), Style::default().fg(theme.text_secondary))),
            ]),
            None => Paragraph::new("Loading election..."),
        };
        frame.render_widget(
            header.wrap(Wrap { trim: true }).block(titled_block(" ⚙️  Manage election ", theme)),
            rows[0],
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        self.render_nominees(frame, columns[0], theme);
        self.render_results(frame, columns[1], theme);

        self.notice.render(frame, rows[2], theme);
        let hints = key_hints(
            &[("a", "Add nominee"), ("d", "Delete"), ("r", "Results"), ("F5", "Reload"), ("Esc", "Dashboard")],
            theme,
        );
        frame.render_widget(Paragraph::new(hints), rows[3]);

        match &self.mode {
            Mode::AddingNominee(form) => form.render(frame, area, theme),
            Mode::ConfirmDelete { name, .. } => {
                let popup = centered_rect(50, 5, area);
                frame.render_widget(Clear, popup);
                let confirm = Paragraph::new(vec![
                    Line::from(format!("Delete nominee {}?", name)),
                    Line::from(key_hints(&[("y", "Yes"), ("any other key", "No")], theme)),
                ])
                .alignment(Alignment::Center)
                .style(Style::default().bg(theme.container).fg(theme.text))
                .block(titled_block(" Confirm ", theme));
                frame.render_widget(confirm, popup);
            }
            Mode::Browse => {}
        }
    }

    fn render_nominees(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let nominees = self.election.as_ref().map(|e| e.nominees.as_slice()).unwrap_or_default();
        let winner = self.election.as_ref().and_then(|e| e.winner_id);
        let items: Vec<ListItem> = nominees
            .iter()
            .enumerate()
            .map(|(i, nominee)| {
                let crown = if winner == Some(nominee.id) { "🏆 " } else { "" };
                let mut lines = vec![Line::from(Span::styled(
                    format!("{}{}", crown, nominee.name),
                    get_list_item_style(theme, i == self.selected),
                ))];
                if let Some(details) = nominee.details.as_deref().filter(|d| !d.is_empty()) {
                    lines.push(Line::from(Span::styled(
                        format!("   {}", details),
                        Style::default().fg(theme.text_secondary),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let mut state = ListState::default().with_selected(Some(self.selected));
        let list = List::new(items).block(titled_block(format!(" Nominees ({}) ", nominees.len()), theme));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_results(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        if !self.results.is_visible() {
            let hidden = Paragraph::new("Live results hidden (r to show)")
                .style(Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC))
                .block(titled_block(" 🏁 Live results ", theme));
            frame.render_widget(hidden, area);
            return;
        }

        let snapshot = self.results.snapshot();
        let block = titled_block(panel_title("🏁 Live results", &snapshot), theme);
        let lines = match (&snapshot.data, &snapshot.last_error) {
            (Some(results), _) => result_lines(results, area.width.saturating_sub(30) as usize, theme),
            (None, Some(error)) => vec![Line::from(Span::styled(
                format!("❌ {}", error),
                Style::default().fg(theme.error),
            ))],
            (None, None) => vec![Line::from("Loading...")],
        };
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl Drop for ManageElectionPage {
    fn drop(&mut self) {
        self.results.teardown();
    }
}
