use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs, Wrap},
    Frame,
};

use crate::auth::{AuthManager, LoginFlow, LoginMode, LoginResult, LoginStep};
use crate::routing::Navigator;
use crate::theme::ThemeColors;
use crate::tui::widgets::{input_box, key_hints, titled_block};

pub struct LoginPage {
    flow: LoginFlow<AuthManager>,

    // Input fields
    phone_input: String,
    otp_input: String,
    username_input: String,
    password_input: String,

    // UI state
    admin_field: usize,
    show_password: bool,
    info_message: Option<String>,
}

impl LoginPage {
    pub fn new(auth: AuthManager, navigator: Navigator, mode: LoginMode) -> Self {
        Self {
            flow: LoginFlow::new(auth, navigator, mode),
            phone_input: String::new(),
            otp_input: String::new(),
            username_input: String::new(),
            password_input: String::new(),
            admin_field: 0,
            show_password: false,
            info_message: None,
        }
    }

    /// Every printable key goes into a field on this page.
    pub fn captures_text(&self) -> bool {
        true
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Left | KeyCode::Right => {
                let next = match self.flow.mode() {
                    LoginMode::Voter => LoginMode::Admin,
                    LoginMode::Admin => LoginMode::Voter,
                };
                self.switch_mode(next);
            }
            KeyCode::Enter => self.submit().await,
            KeyCode::Esc => {
                if self.flow.mode() == LoginMode::Voter && self.flow.voter.back() {
                    self.otp_input.clear();
                    self.info_message = None;
                }
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                if self.flow.mode() == LoginMode::Admin {
                    self.admin_field = 1 - self.admin_field;
                }
            }
            KeyCode::F(1) => self.show_password = !self.show_password,
            KeyCode::Backspace => {
                self.active_input().pop();
            }
            KeyCode::Char(c) => self.active_input().push(c),
            _ => {}
        }
        Ok(())
    }

    fn switch_mode(&mut self, mode: LoginMode) {
        self.flow.set_mode(mode);
        self.otp_input.clear();
        self.info_message = None;
    }

    async fn submit(&mut self) {
        let result = match (self.flow.mode(), self.flow.voter.step()) {
            (LoginMode::Voter, LoginStep::AwaitingPhone) => {
                self.flow.voter.submit_phone(self.phone_input.trim()).await
            }
            (LoginMode::Voter, LoginStep::AwaitingOtp) => {
                self.flow.voter.submit_otp(self.otp_input.trim()).await
            }
            (LoginMode::Admin, _) => {
                if self.admin_field == 0 && self.password_input.is_empty() {
                    self.admin_field = 1;
                    return;
                }
                self.flow
                    .admin
                    .submit(self.username_input.trim(), &self.password_input)
                    .await
            }
        };

        match result {
            LoginResult::OtpSent => {
                self.otp_input.clear();
                self.info_message = Some(format!("OTP sent to {}", self.phone_input.trim()));
            }
            LoginResult::Success { role, .. } => {
                log::info!("Login finished for a {} session", role.label());
                self.password_input.clear();
                self.otp_input.clear();
            }
            LoginResult::Error(_) => {
                self.info_message = None;
                if self.flow.mode() == LoginMode::Admin {
                    self.password_input.clear();
                }
            }
            LoginResult::Busy => {}
        }
    }

    fn active_input(&mut self) -> &mut String {
        match (self.flow.mode(), self.flow.voter.step()) {
            (LoginMode::Voter, LoginStep::AwaitingPhone) => &mut self.phone_input,
            (LoginMode::Voter, LoginStep::AwaitingOtp) => &mut self.otp_input,
            (LoginMode::Admin, _) if self.admin_field == 0 => &mut self.username_input,
            (LoginMode::Admin, _) => &mut self.password_input,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Min(10),   // Form
                Constraint::Length(3), // Help
            ])
            .split(area);

        let selected = match self.flow.mode() {
            LoginMode::Voter => 0,
            LoginMode::Admin => 1,
        };
        let tabs = Tabs::new(vec!["🗳️  Voter", "🔐 Admin"])
            .block(titled_block(" Sign in ", theme))
            .select(selected)
            .style(Style::default().fg(theme.text_secondary))
            .highlight_style(
                Style::default()
                    .fg(theme.primary)
                    .bg(theme.container)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        match self.flow.mode() {
            LoginMode::Voter => self.render_voter(frame, chunks[1], theme),
            LoginMode::Admin => self.render_admin(frame, chunks[1], theme),
        }

        let hints = match (self.flow.mode(), self.flow.voter.step()) {
            (LoginMode::Voter, LoginStep::AwaitingOtp) => {
                key_hints(&[("Enter", "Verify"), ("Esc", "Change number"), ("←/→", "Switch tab")], theme)
            }
            (LoginMode::Voter, _) => key_hints(&[("Enter", "Send OTP"), ("←/→", "Switch tab")], theme),
            (LoginMode::Admin, _) => key_hints(
                &[("Tab", "Switch field"), ("F1", "Show password"), ("Enter", "Login"), ("←/→", "Switch tab")],
                theme,
            ),
        };
        let help = Paragraph::new(hints)
            .alignment(Alignment::Center)
            .block(titled_block("Controls", theme));
        frame.render_widget(help, chunks[2]);
    }

    fn render_voter(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(2), // Instructions
                Constraint::Length(3), // Phone
                Constraint::Length(3), // OTP
                Constraint::Min(2),    // Messages
            ])
            .split(area);

        let on_otp = self.flow.voter.step() == LoginStep::AwaitingOtp;
        let instructions = if on_otp {
            "Enter the one-time code sent to your phone"
        } else {
            "Enter your 10-digit phone number to receive a one-time code"
        };
        frame.render_widget(
            Paragraph::new(instructions)
                .style(Style::default().fg(theme.primary))
                .alignment(Alignment::Center),
            chunks[0],
        );

        frame.render_widget(input_box("Phone number", &self.phone_input, !on_otp, theme), chunks[1]);
        if on_otp {
            frame.render_widget(input_box("OTP", &self.otp_input, true, theme), chunks[2]);
        }

        self.render_messages(frame, chunks[3], self.flow.voter.message(), self.flow.voter.is_busy(), theme);
    }

    fn render_admin(&self, frame: &mut Frame, area: Rect, theme: &ThemeColors) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(2), // Instructions
                Constraint::Length(3), // Username
                Constraint::Length(3), // Password
                Constraint::Min(2),    // Messages
            ])
            .split(area);

        frame.render_widget(
            Paragraph::new("Administrator login")
                .style(Style::default().fg(theme.primary))
                .alignment(Alignment::Center),
            chunks[0],
        );

        let password_display = if self.show_password {
            self.password_input.clone()
        } else {
            "*".repeat(self.password_input.chars().count())
        };
        frame.render_widget(
            input_box("Username", &self.username_input, self.admin_field == 0, theme),
            chunks[1],
        );
        frame.render_widget(
            input_box("Password", &password_display, self.admin_field == 1, theme),
            chunks[2],
        );

        self.render_messages(frame, chunks[3], self.flow.admin.message(), self.flow.admin.is_busy(), theme);
    }

    fn render_messages(
        &self,
        frame: &mut Frame,
        area: Rect,
        error: Option<String>,
        busy: bool,
        theme: &ThemeColors,
    ) {
        let mut lines = Vec::new();
        if busy {
            lines.push(Line::from(Span::styled("Please wait...", Style::default().fg(theme.warning))));
        }
        if let Some(error) = error {
            lines.push(Line::from(Span::styled(
                format!("❌ {}", error),
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            )));
        } else if let Some(info) = &self.info_message {
            lines.push(Line::from(Span::styled(
                format!("✅ {}", info),
                Style::default().fg(theme.success),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }
}
