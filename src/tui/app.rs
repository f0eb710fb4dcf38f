use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::pages::*;
use super::widgets::key_hints;
use crate::api::NtrovoteClient;
use crate::auth::{AuthManager, LoginMode, Session, SessionStore};
use crate::routing::{Location, Navigator, Route, View};
use crate::settings::ClientSettings;
use crate::theme::ThemeManager;

enum Screen {
    Pending,
    Login(LoginPage),
    VoterHome(VoterHomePage),
    Ballot(BallotPage),
    AdminDashboard(AdminDashboardPage),
    ManageElection(ManageElectionPage),
}

impl Screen {
    fn title(&self) -> &'static str {
        match self {
            Self::Pending => "Starting",
            Self::Login(_) => "Sign in",
            Self::VoterHome(_) => "Elections",
            Self::Ballot(_) => "Ballot",
            Self::AdminDashboard(_) => "Admin dashboard",
            Self::ManageElection(_) => "Manage election",
        }
    }

    fn captures_text(&self) -> bool {
        match self {
            Self::Login(page) => page.captures_text(),
            Self::AdminDashboard(page) => page.captures_text(),
            Self::ManageElection(page) => page.captures_text(),
            _ => false,
        }
    }
}

pub struct TuiApp {
    // Core state
    settings: ClientSettings,
    navigator: Navigator,
    client: NtrovoteClient,
    auth: AuthManager,
    location: watch::Receiver<Location>,
    session_watch: JoinHandle<()>,
    screen: Screen,
    should_quit: bool,

    // Theme management
    theme_manager: ThemeManager,

    // Animation
    animation_frame: usize,
    last_animation_update: Instant,
}

impl TuiApp {
    pub fn new(settings: ClientSettings, session: SessionStore, initial: Route) -> Self {
        let navigator = Navigator::new(session.clone(), initial);
        let session_watch = navigator.watch_session();
        let location = navigator.subscribe();

        let mut theme_manager = ThemeManager::new();
        if !ThemeManager::available_themes()
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&settings.theme))
        {
            log::warn!("Unknown theme {:?}, using Dark", settings.theme);
        }
        theme_manager.set_theme(&settings.theme);

        Self {
            client: NtrovoteClient::new(&settings, session),
            auth: AuthManager::new(&settings),
            settings,
            location,
            session_watch,
            navigator,
            screen: Screen::Pending,
            should_quit: false,
            theme_manager,
            animation_frame: 0,
            last_animation_update: Instant::now(),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Loads the stored session and moves to the page it leads to. A signed-in user who
    /// started on a login screen goes straight to their landing page.
    pub fn restore_session(&self) -> Session {
        let restored = self.navigator.session().restore();
        log::info!(
            "Session restored: {}",
            restored.role().map_or("signed out", |role| role.label())
        );

        match restored.role() {
            Some(role) if self.navigator.location().route.is_login() => {
                self.navigator.navigate(Route::landing(role));
            }
            _ => {
                self.navigator.regate();
            }
        }
        restored
    }

    /// Builds the screen for the current location.
    pub async fn initialize(&mut self) -> Result<()> {
        let location = *self.location.borrow_and_update();
        self.show(location).await
    }

    async fn show(&mut self, location: Location) -> Result<()> {
        let route = match location.view {
            View::Pending => {
                self.screen = Screen::Pending;
                return Ok(());
            }
            View::Show(route) => route,
        };
        log::debug!("Showing {}", route);

        // The old screen goes first so its pollers and timers stop before new ones start.
        self.screen = Screen::Pending;
        self.screen = match route {
            Route::Login => Screen::Login(LoginPage::new(self.auth.clone(), self.navigator.clone(), LoginMode::Voter)),
            Route::AdminLogin => {
                Screen::Login(LoginPage::new(self.auth.clone(), self.navigator.clone(), LoginMode::Admin))
            }
            Route::VoterHome => {
                let mut page = VoterHomePage::new(self.client.clone(), self.navigator.clone());
                page.initialize().await?;
                Screen::VoterHome(page)
            }
            Route::Ballot(id) => {
                let mut page = BallotPage::new(self.client.clone(), self.navigator.clone(), self.settings.clone(), id);
                page.initialize().await?;
                Screen::Ballot(page)
            }
            Route::AdminDashboard => {
                let mut page = AdminDashboardPage::new(self.client.clone(), self.navigator.clone());
                page.initialize().await?;
                Screen::AdminDashboard(page)
            }
            Route::ManageElection(id) => {
                let mut page = ManageElectionPage::new(self.client.clone(), self.navigator.clone(), id);
                page.initialize().await?;
                Screen::ManageElection(page)
            }
        };
        Ok(())
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // Global shortcuts
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                self.should_quit = true;
                return Ok(());
            }
            (KeyModifiers::NONE, KeyCode::Char('q')) if !self.screen.captures_text() => {
                self.should_quit = true;
                return Ok(());
            }
            (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
                self.navigator.session().logout();
                return Ok(());
            }
            _ => {}
        }

        // Forward input to active page
        match &mut self.screen {
            Screen::Pending => {}
            Screen::Login(page) => page.handle_input(key).await?,
            Screen::VoterHome(page) => page.handle_input(key).await?,
            Screen::Ballot(page) => page.handle_input(key).await?,
            Screen::AdminDashboard(page) => page.handle_input(key).await?,
            Screen::ManageElection(page) => page.handle_input(key).await?,
        }

        // Pages navigate directly; pick the change up before the next frame.
        self.follow_location().await
    }

    pub async fn update(&mut self) -> Result<()> {
        // Update animation
        if self.last_animation_update.elapsed() >= Duration::from_millis(150) {
            self.animation_frame = (self.animation_frame + 1) % SPINNER.len();
            self.last_animation_update = Instant::now();
        }

        self.follow_location().await?;

        match &mut self.screen {
            Screen::VoterHome(page) => page.update(),
            Screen::Ballot(page) => page.update(),
            Screen::AdminDashboard(page) => page.update(),
            Screen::ManageElection(page) => page.update(),
            Screen::Pending | Screen::Login(_) => {}
        }
        Ok(())
    }

    async fn follow_location(&mut self) -> Result<()> {
        if self.location.has_changed().unwrap_or(false) {
            let location = *self.location.borrow_and_update();
            self.show(location).await?;
        }
        Ok(())
    }

    pub fn render(&self, frame: &mut Frame) {
        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Content
                Constraint::Length(3), // Footer with shortcuts
            ])
            .split(frame.area());

        self.render_header(frame, main_layout[0]);

        let theme = self.theme_manager.get_colors();
        match &self.screen {
            Screen::Pending => self.render_pending(frame, main_layout[1]),
            Screen::Login(page) => page.render(frame, main_layout[1], theme),
            Screen::VoterHome(page) => page.render(frame, main_layout[1], theme),
            Screen::Ballot(page) => page.render(frame, main_layout[1], theme),
            Screen::AdminDashboard(page) => page.render(frame, main_layout[1], theme),
            Screen::ManageElection(page) => page.render(frame, main_layout[1], theme),
        }

        self.render_footer(frame, main_layout[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.get_colors();
        let session = self.navigator.session().current();
        let who = match (session.subject(), session.role()) {
            (Some(subject), Some(role)) => format!("{} ({})", subject, role.label()),
            _ => "not signed in".to_string(),
        };

        let header = Paragraph::new(Line::from(vec![
            Span::styled("🗳️  ntrovote", Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)),
            Span::styled(format!("  ·  {}", self.screen.title()), Style::default().fg(theme.text)),
            Span::styled(format!("  ·  {}", who), Style::default().fg(theme.text_secondary)),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.accent)),
        );
        frame.render_widget(header, area);
    }

    fn render_pending(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.get_colors();
        let text = format!("{} Restoring session...", SPINNER[self.animation_frame]);
        let pending = Paragraph::new(text)
            .style(Style::default().fg(theme.text_secondary).add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center);
        frame.render_widget(pending, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme_manager.get_colors();
        let mut shortcuts = vec![("Ctrl+C", "Quit")];
        if !self.screen.captures_text() {
            shortcuts.push(("q", "Quit"));
        }
        if self.navigator.session().current().is_authenticated() {
            shortcuts.push(("Ctrl+L", "Log out"));
        }

        let footer = Paragraph::new(key_hints(&shortcuts, theme))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme.border))
                    .title("🔧 Controls")
                    .title_style(Style::default().fg(theme.accent)),
            );
        frame.render_widget(footer, area);
    }
}

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

impl Drop for TuiApp {
    fn drop(&mut self) {
        self.session_watch.abort();
    }
}
