pub mod admin_dashboard;
pub mod ballot;
pub mod login;
pub mod manage_election;
pub mod voter_home;

pub use admin_dashboard::AdminDashboardPage;
pub use ballot::BallotPage;
pub use login::LoginPage;
pub use manage_election::ManageElectionPage;
pub use voter_home::VoterHomePage;

use chrono::{DateTime, Local, NaiveDateTime};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::api::{Election, NomineeResult};
use crate::polling::PanelSnapshot;
use crate::theme::ThemeColors;

fn format_moment(moment: NaiveDateTime) -> String {
    moment.format("%d %b %Y %H:%M").to_string()
}

pub(crate) fn format_window(election: &Election) -> String {
    match (election.start_at, election.end_at) {
        (Some(start), Some(end)) => format!("{} → {}", format_moment(start), format_moment(end)),
        (Some(start), None) => format!("from {}", format_moment(start)),
        (None, Some(end)) => format!("until {}", format_moment(end)),
        (None, None) => "No schedule".to_string(),
    }
}

pub(crate) fn format_timestamp(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

pub(crate) fn panel_title<T>(name: &str, snapshot: &PanelSnapshot<T>) -> String {
    match (&snapshot.last_error, snapshot.last_updated) {
        (Some(_), _) => format!(" {} ⚠ ", name),
        (None, Some(at)) => format!(" {} · {} ", name, format_timestamp(at)),
        (None, None) => format!(" {} ", name),
    }
}

/// Results as horizontal bars, longest bar `width` cells, leader first.
pub(crate) fn result_lines(results: &[NomineeResult], width: usize, theme: &ThemeColors) -> Vec<Line<'static>> {
    let mut sorted: Vec<&NomineeResult> = results.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let top = sorted.first().map(|r| r.count).unwrap_or(0);
    let total: u64 = sorted.iter().map(|r| r.count).sum();
    if sorted.is_empty() {
        return vec![Line::from(Span::styled(
            "No nominees yet",
            Style::default().fg(theme.text_secondary),
        ))];
    }

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, result)| {
            let bar_len = if top == 0 { 0 } else { (result.count as usize * width) / top as usize };
            let share = if total == 0 { 0.0 } else { result.count as f64 * 100.0 / total as f64 };
            let name_style = if i == 0 && result.count > 0 {
                Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            Line::from(vec![
                Span::styled(format!("{:<16.16} ", result.name), name_style),
                Span::styled("█".repeat(bar_len), Style::default().fg(theme.primary)),
                Span::styled(
                    format!(" {} ({:.0}%)", result.count, share),
                    Style::default().fg(theme.text_secondary),
                ),
            ])
        })
        .collect()
}
