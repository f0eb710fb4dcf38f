use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElectionStatus {
    #[default]
    Ongoing,
    Closed,
}

impl ElectionStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ongoing => Self::Closed,
            Self::Closed => Self::Ongoing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ONGOING",
            Self::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "local_datetime")]
    pub start_at: Option<NaiveDateTime>,
    #[serde(default, with = "local_datetime")]
    pub end_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: ElectionStatus,
    #[serde(default)]
    pub winner_id: Option<i64>,
    #[serde(default)]
    pub nominees: Vec<Nominee>,
}

impl Election {
    pub fn is_open(&self) -> bool {
        self.status == ElectionStatus::Ongoing
    }

    pub fn nominee(&self, id: i64) -> Option<&Nominee> {
        self.nominees.iter().find(|n| n.id == id)
    }

    pub fn winner(&self) -> Option<&Nominee> {
        self.winner_id.and_then(|id| self.nominee(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nominee {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewElection {
    pub title: String,
    pub description: String,
    #[serde(with = "local_datetime")]
    pub start_at: Option<NaiveDateTime>,
    #[serde(with = "local_datetime")]
    pub end_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: ElectionStatus,
}

/// Vote count for one nominee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NomineeResult {
    pub nominee_id: i64,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterInfo {
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStats {
    pub total_eligible: u64,
    pub total_voted: u64,
    #[serde(default)]
    pub voted: Vec<VoterInfo>,
    #[serde(default)]
    pub not_voted: Vec<VoterInfo>,
}

impl VotingStats {
    /// Share of eligible voters that have voted, 0.0 to 100.0.
    pub fn turnout_percent(&self) -> f64 {
        if self.total_eligible == 0 {
            0.0
        } else {
            self.total_voted as f64 * 100.0 / self.total_eligible as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpEntry {
    pub phone: String,
    pub code: String,
    #[serde(default, with = "local_datetime")]
    pub expires_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleVoter {
    #[serde(default)]
    pub id: Option<i64>,
    pub phone_number: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVoter {
    pub phone: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub election_id: i64,
    pub nominee_id: i64,
}

/// Nominee to upload. The image, when present, is sent as-is; reading it is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct NewNominee {
    pub name: String,
    pub details: String,
    pub image: Option<NomineeImage>,
}

#[derive(Debug, Clone)]
pub struct NomineeImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `LocalDateTime` as the service writes it: ISO-8601 without offset, seconds omitted when
/// zero.
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value.trim(), format).ok())
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse(text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time {text:?}"))),
        }
    }
}
