use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Gauge, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};

use crate::api::{local_datetime, Election, EligibleVoter, NewElection, NtrovoteClient};
use crate::polling::{AdminPanels, PanelSnapshot};
use crate::routing::{Navigator, Route};
use crate::theme::{get_list_item_style, ThemeColors};
use crate::tui::widgets::{centered_rect, key_hints, titled_block, Form, FormAction, Notice};

use super::{format_timestamp, format_window, panel_title, result_lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Elections,
    Voters,
}

enum FormKind {
    CreateElection,
    AddVoter,
}

#[derive(Debug, Clone)]
enum PendingAction {
    Reset { id: i64, title: String },
    Finalize { id: i64, title: String },
    DeleteElection { id: i64, title: String },
    RemoveVoter { phone: String },
}

impl PendingAction {
    fn question(&self) -> String {
        match self {
            Self::Reset { title, .. } => format!("Delete every vote cast in \"{}\"?", title),
            Self::Finalize { title, .. } => format!("Close \"{}\" and declare the winner?", title),
            Self::DeleteElection { title, .. } => format!("Delete \"{}\" with its nominees and votes?", title),
            Self::RemoveVoter { phone } => format!("Remove {} from the eligible voters?", phone),
        }
    }
}

enum Mode {
    Browse,
    Editing(FormKind, Form),
    Confirming(PendingAction),
}

pub struct AdminDashboardPage {
    client: NtrovoteClient,
    navigator: Navigator,

    // Data
    elections: Vec<Election>,
    voters: Vec<EligibleVoter>,
    panels: AdminPanels,

    // UI State
    focus: Focus,
    selected_election: usize,
    selected_voter: usize,
    mode: Mode,
    notice: Notice,
}

impl AdminDashboardPage {
    pub fn new(client: NtrovoteClient, navigator: Navigator) -> Self {
        let panels = AdminPanels::new(&client);
        Self {
            client,
            navigator,
            elections: Vec::new(),
            voters: Vec::new(),
            panels,
            focus: Focus::Elections,
            selected_election: 0,
            selected_voter: 0,
            mode: Mode::Browse,
            notice: Notice::default(),
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        match self.client.get_all_elections().await {
            Ok(elections) => {
                self.elections = elections;
                self.selected_election = self.selected_election.min(self.elections.len().saturating_sub(1));
            }
            Err(e) => {
                log::warn!("Failed to load elections: {}", e);
                self.notice.error(e.user_message("Failed to load elections"));
            }
        }
        match self.client.get_eligible_voters().await {
            Ok(voters) => {
                self.voters = voters;
                self.selected_voter = self.selected_voter.min(self.voters.len().saturating_sub(1));
            }
            Err(e) => {
                log::warn!("Failed to load eligible voters: {}", e);
                self.notice.error(e.user_message("Failed to load voters"));
            }
        }
        self.sync_panel_target();
        Ok(())
    }

    pub fn update(&mut self) {
        self.notice.expire();
    }

    pub fn captures_text(&self) -> bool {
        matches!(self.mode, Mode::Editing(..))
    }

    fn current_election(&self) -> Option<&Election> {
        self.elections.get(self.selected_election)
    }

    fn sync_panel_target(&mut self) {
        let target = self.current_election().map(|e| e.id);
        self.panels.select_election(target);
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Editing(kind, mut form) => match form.handle_key(key) {
                FormAction::Cancel => {}
                FormAction::Submit => self.submit_form(kind, form).await?,
                FormAction::None => self.mode = Mode::Editing(kind, form),
            },
            Mode::Confirming(action) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.run(action).await?,
                _ => {}
            },
            Mode::Browse => self.handle_browse_key(key).await?,
        }
        Ok(())
    }

    async fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Elections => Focus::Voters,
                    Focus::Voters => Focus::Elections,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Enter => {
                if let Some(election) = self.current_election() {
                    self.navigator.navigate(Route::ManageElection(election.id));
                }
            }
            KeyCode::Char('o') => {
                self.panels.otps.toggle();
            }
            KeyCode::Char('s') => {
                self.panels.stats.toggle();
            }
            KeyCode::Char('r') => {
                self.panels.results.toggle();
            }
            KeyCode::Char('t') => self.toggle_status().await?,
            KeyCode::Char('x') => {
                if let Some(e) = self.current_election() {
                    self.mode = Mode::Confirming(PendingAction::Reset { id: e.id, title: e.title.clone() });
                }
            }
            KeyCode::Char('f') => {
                if let Some(e) = self.current_election() {
                    self.mode = Mode::Confirming(PendingAction::Finalize { id: e.id, title: e.title.clone() });
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let action = match self.focus {
                    Focus::Elections => self
                        .current_election()
                        .map(|e| PendingAction::DeleteElection { id: e.id, title: e.title.clone() }),
                    Focus::Voters => self
                        .voters
                        .get(self.selected_voter)
                        .map(|v| PendingAction::RemoveVoter { phone: v.phone_number.clone() }),
                };
                if let Some(action) = action {
                    self.mode = Mode::Confirming(action);
                }
            }
            KeyCode::Char('c') => {
                let form = Form::new(
                    "New election",
                    &["Title", "Description", "Starts (YYYY-MM-DDTHH:MM)", "Ends (YYYY-MM-DDTHH:MM)"],
                );
                self.mode = Mode::Editing(FormKind::CreateElection, form);
            }
            KeyCode::Char('a') => {
                self.mode = Mode::Editing(FormKind::AddVoter, Form::new("Add eligible voter", &["Phone", "Name"]));
            }
            KeyCode::F(5) => self.refresh().await?,
            _ => {}
        }
        Ok(())
    }

    fn move_selection(&mut self, delta: isize) {
        match self.focus {
            Focus::Elections => {
                let last = self.elections.len().saturating_sub(1);
                self.selected_election = self.selected_election.saturating_add_signed(delta).min(last);
                self.sync_panel_target();
            }
            Focus::Voters => {
                let last = self.voters.len().saturating_sub(1);
                self.selected_voter = self.selected_voter.saturating_add_signed(delta).min(last);
            }
        }
    }

    async fn toggle_status(&mut self) -> Result<()> {
        let Some(election) = self.current_election() else {
            return Ok(());
        };
        let (id, next) = (election.id, election.status.toggled());
        match self.client.update_election_status(id, next).await {
            Ok(()) => {
                self.notice.success(format!("Election is now {}", next.as_str()));
                self.refresh().await?;
            }
            Err(e) => self.notice.error(e.user_message("Failed to update status")),
        }
        Ok(())
    }

    async fn run(&mut self, action: PendingAction) -> Result<()> {
        let outcome = match &action {
            PendingAction::Reset { id, .. } => self
                .client
                .reset_election(*id)
                .await
                .map(|()| "Votes reset".to_string()),
            PendingAction::Finalize { id, .. } => self.client.finalize_election(*id).await.map(|election| {
                match election.winner() {
                    Some(winner) => format!("Election closed, winner: {}", winner.name),
                    None => "Election closed".to_string(),
                }
            }),
            PendingAction::DeleteElection { id, .. } => self
                .client
                .delete_election(*id)
                .await
                .map(|()| "Election deleted".to_string()),
            PendingAction::RemoveVoter { phone } => self
                .client
                .remove_eligible_voter(phone)
                .await
                .map(|()| format!("Removed {}", phone)),
        };

        match outcome {
            Ok(message) => {
                self.notice.success(message);
                self.refresh().await?;
            }
            Err(e) => {
                log::warn!("{:?} failed: {}", action, e);
                self.notice.error(e.user_message("Action failed"));
            }
        }
        Ok(())
    }

    async fn submit_form(&mut self, kind: FormKind, form: Form) -> Result<()> {
        let outcome = match kind {
            FormKind::CreateElection => {
                let (start_at, end_at) = (form.value(2), form.value(3));
                let parsed_start = local_datetime::parse(start_at);
                let parsed_end = local_datetime::parse(end_at);
                if (!start_at.is_empty() && parsed_start.is_none()) || (!end_at.is_empty() && parsed_end.is_none()) {
                    self.notice.error("Dates must look like 2025-02-01T09:00");
                    self.mode = Mode::Editing(kind, form);
                    return Ok(());
                }
                let election = NewElection {
                    title: form.value(0).to_string(),
                    description: form.value(1).to_string(),
                    start_at: parsed_start,
                    end_at: parsed_end,
                };
                self.client
                    .create_election(&election)
                    .await
                    .map(|created| format!("Created \"{}\"", created.title))
            }
            FormKind::AddVoter => self
                .client
                .add_eligible_voter(form.value(0), form.value(1))
                .await
                .map(|voter| format!("{} can now vote", voter.phone_number)),
        };

        match outcome {
            Ok(message) => {
                self.notice.success(message);
                self.refresh().await?;
            }
            Err(e) => {
                log::warn!("Form submission failed: {}", e);
                self.notice.error(e.user_message("Failed to save"));
            }
        }
        Ok(())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),    // Lists and panels
                Constraint::Length(1), // Notice
                Constraint::Length(1), // Hints
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[0]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[0]);
        self.render_elections(frame, left[0], theme);
        self.render_voters(frame, left[1], theme);
        self.render_panels(frame, columns[1], theme);

        self.notice.render(frame, rows[1], theme);
        let hints = key_hints(
            &[
                ("Enter", "Manage"),
                ("c", "Create"),
                ("t", "Open/close"),
                ("x", "Reset"),
                ("f", "Finalize"),
                ("d", "Delete"),
                ("a", "Add voter"),
                ("o/s/r", "Panels"),
                ("Tab", "Focus"),
            ],
            theme,
        );
        frame.render_widget(Paragraph::new(hints), rows[2]);

        match &self.mode {
            Mode::Editing(_, form) => form.render(frame, area, theme),
            Mode::Confirming(action) => {
                let popup = centered_rect(60, 5, area);
                frame.render_widget(Clear, popup);
                let confirm = Paragraph::new(vec![
                    Line::from(action.question()),
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

    fn render_elections(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let focused = self.focus == Focus::Elections;
        let items: Vec<ListItem> = self
            .elections
            .iter()
            .enumerate()
            .map(|(i, election)| {
                let status_color = if election.is_open() { theme.success } else { theme.text_secondary };
                let mut spans = vec![
                    Span::styled(
                        format!("{:<7} ", election.status.as_str()),
                        Style::default().fg(status_color),
                    ),
                    Span::styled(
                        election.title.clone(),
                        get_list_item_style(theme, focused && i == self.selected_election),
                    ),
                ];
                if let Some(winner) = election.winner() {
                    spans.push(Span::styled(
                        format!("  🏆 {}", winner.name),
                        Style::default().fg(theme.warning),
                    ));
                }
                ListItem::new(vec![
                    Line::from(spans),
                    Line::from(Span::styled(
                        format!("        {}", format_window(election)),
                        Style::default().fg(theme.text_secondary),
                    )),
                ])
            })
            .collect();

        let mut state = ListState::default().with_selected(Some(self.selected_election));
        let list = List::new(items).block(titled_block(format!(" 📋 Elections ({}) ", self.elections.len()), theme));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_voters(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let focused = self.focus == Focus::Voters;
        let items: Vec<ListItem> = self
            .voters
            .iter()
            .enumerate()
            .map(|(i, voter)| {
                let name = voter.name.as_deref().unwrap_or("");
                ListItem::new(Line::from(Span::styled(
                    format!("{}  {}", voter.phone_number, name),
                    get_list_item_style(theme, focused && i == self.selected_voter),
                )))
            })
            .collect();

        let mut state = ListState::default().with_selected(Some(self.selected_voter));
        let list = List::new(items).block(titled_block(format!(" 👥 Eligible voters ({}) ", self.voters.len()), theme));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_panels(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let mut visible = Vec::new();
        if self.panels.otps.is_visible() {
            visible.push(0);
        }
        if self.panels.stats.is_visible() {
            visible.push(1);
        }
        if self.panels.results.is_visible() {
            visible.push(2);
        }

        if visible.is_empty() {
            let help = Paragraph::new(vec![
                Line::from("No live panels open."),
                Line::from(""),
                Line::from(key_hints(&[("o", "OTP codes"), ("s", "Voting statistics"), ("r", "Live results")], theme)),
            ])
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.text_secondary))
            .block(titled_block(" Live panels ", theme));
            frame.render_widget(help, area);
            return;
        }

        let constraints: Vec<Constraint> = visible
            .iter()
            .map(|_| Constraint::Ratio(1, visible.len() as u32))
            .collect();
        let areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (slot, panel) in visible.into_iter().enumerate() {
            match panel {
                0 => self.render_otps(frame, areas[slot], theme),
                1 => self.render_stats(frame, areas[slot], theme),
                _ => self.render_results(frame, areas[slot], theme),
            }
        }
    }

    fn render_otps(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let snapshot = self.panels.otps.snapshot();
        let block = titled_block(panel_title("🔑 OTP codes", &snapshot), theme);
        let rows: Vec<Row> = snapshot
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|otp| {
                let expires = otp.expires_at.map(|t| t.format("%H:%M:%S").to_string()).unwrap_or_default();
                Row::new(vec![otp.phone, otp.code, expires])
            })
            .collect();
        let table = Table::new(
            rows,
            [Constraint::Percentage(45), Constraint::Percentage(25), Constraint::Percentage(30)],
        )
        .header(
            Row::new(vec!["Phone", "Code", "Expires"])
                .style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        )
        .style(Style::default().fg(theme.text))
        .block(block);
        frame.render_widget(table, area);
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let snapshot = self.panels.stats.snapshot();
        let block = titled_block(panel_title("📊 Voting statistics", &snapshot), theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(stats) = snapshot.data else {
            frame.render_widget(waiting_text(&snapshot, self.panels.stats.target().is_some(), theme), inner);
            return;
        };

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme.primary).bg(theme.container))
            .ratio((stats.turnout_percent() / 100.0).clamp(0.0, 1.0))
            .label(format!(
                "{}/{} voted ({:.0}%)",
                stats.total_voted,
                stats.total_eligible,
                stats.turnout_percent()
            ));
        frame.render_widget(gauge, parts[0]);

        let pending: Vec<Line> = stats
            .not_voted
            .iter()
            .map(|v| {
                Line::from(Span::styled(
                    format!("⏳ {} {}", v.phone, v.name.as_deref().unwrap_or("")),
                    Style::default().fg(theme.text_secondary),
                ))
            })
            .chain(stats.voted.iter().map(|v| {
                Line::from(Span::styled(
                    format!("✔ {} {}", v.phone, v.name.as_deref().unwrap_or("")),
                    Style::default().fg(theme.success),
                ))
            }))
            .collect();
        frame.render_widget(Paragraph::new(pending), parts[1]);
    }

    fn render_results(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let snapshot = self.panels.results.snapshot();
        let block = titled_block(panel_title("🏁 Live results", &snapshot), theme);
        match &snapshot.data {
            Some(results) => {
                let width = area.width.saturating_sub(30) as usize;
                frame.render_widget(Paragraph::new(result_lines(results, width, theme)).block(block), area);
            }
            None => {
                let waiting = waiting_text(&snapshot, self.panels.results.target().is_some(), theme);
                frame.render_widget(waiting.block(block), area);
            }
        }
    }
}

fn waiting_text<'a, T>(snapshot: &PanelSnapshot<T>, has_target: bool, theme: &ThemeColors) -> Paragraph<'a> {
    let text = match (&snapshot.last_error, has_target) {
        (Some(error), _) => format!("❌ {}", error),
        (None, false) => "Select an election".to_string(),
        (None, true) => match snapshot.last_updated {
            Some(at) => format!("Updated {}", format_timestamp(at)),
            None => "Loading...".to_string(),
        },
    };
    Paragraph::new(text).style(Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC))
}

impl Drop for AdminDashboardPage {
    fn drop(&mut self) {
        self.panels.teardown();
    }
}
