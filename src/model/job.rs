// model/job.rs - Uploaded recording and its analysis lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server-reported job status. Unknown values are preserved verbatim; the
/// client never validates transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Uploaded,
    Processing,
    Done,
    Error,
    Other(String),
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "uploaded" => JobStatus::Uploaded,
            "processing" => JobStatus::Processing,
            "done" => JobStatus::Done,
            "error" => JobStatus::Error,
            _ => JobStatus::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Other(raw) => raw,
        }
    }

    /// Still being worked on by the backend; keeps the poller alive.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Uploaded | JobStatus::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Sent,
    Error,
}

/// Inline hint shown next to the latest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailHint {
    Sent,
    Failed,
    Pending,
}

impl EmailHint {
    pub fn label(&self) -> &'static str {
        match self {
            EmailHint::Sent => "Email sent",
            EmailHint::Failed => "Email error",
            EmailHint::Pending => "Email pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, rename = "originalname")]
    pub original_name: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub result_summary: Option<String>,
    /// Raw analysis payload, parsed on demand by [`Job::analysis`].
    #[serde(default)]
    pub analysis_json: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient_email_status")]
    pub email_status: Option<EmailStatus>,
    #[serde(default)]
    pub email_sent_at: Option<String>,
}

impl Job {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_done(&self) -> bool {
        self.status == JobStatus::Done
    }

    pub fn display_name(&self) -> &str {
        self.original_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.filename)
    }

    pub fn email_hint(&self) -> Option<EmailHint> {
        match self.email_status {
            Some(EmailStatus::Sent) => Some(EmailHint::Sent),
            Some(EmailStatus::Error) => Some(EmailHint::Failed),
            Some(EmailStatus::Pending) | None if self.is_done() => Some(EmailHint::Pending),
            _ => None,
        }
    }

    /// Parse the analysis payload. Malformed JSON is logged and yields `None`.
    pub fn analysis(&self) -> Option<ParsedAnalysis> {
        let raw = self.analysis_json.as_deref()?;
        match serde_json::from_str::<ParsedAnalysis>(raw) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::error!("Failed to parse analysis for job {}: {}", self.id, e);
                None
            }
        }
    }
}

/// Newest first. Jobs with unparsable timestamps sort last; ties keep server order.
pub fn sort_newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created().cmp(&a.created()));
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn lenient_email_status<'de, D>(deserializer: D) -> Result<Option<EmailStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or(None))
}

/// A field the analysis model emits either as prose or as a bullet list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    pub fn items(&self) -> Vec<&str> {
        match self {
            TextOrList::Text(text) => vec![text.as_str()],
            TextOrList::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedAnalysis {
    #[serde(rename = "CLIENT_NAME")]
    pub client_name: Option<String>,
    #[serde(rename = "CLIENT_INDUSTRY")]
    pub client_industry: Option<String>,
    #[serde(rename = "CLIENT_OVERVIEW")]
    pub client_overview: Option<String>,
    #[serde(rename = "TIME_EFFICIENCY")]
    pub time_efficiency: Option<String>,
    #[serde(rename = "COSTS_RESOURCES")]
    pub costs_resources: Option<String>,
    #[serde(rename = "RISK_QUALITY")]
    pub risk_quality: Option<String>,
    #[serde(rename = "REVENUE_GROWTH")]
    pub revenue_growth: Option<String>,
    #[serde(rename = "CUSTOMER_ENGAGEMENT")]
    pub customer_engagement: Option<String>,
    #[serde(rename = "DATA_SYSTEMS")]
    pub data_systems: Option<String>,
    #[serde(rename = "TOP_PRIORITY")]
    pub top_priority: Option<TextOrList>,
    #[serde(rename = "READINESS_CONSTRAINTS")]
    pub readiness_constraints: Option<String>,
    #[serde(rename = "COMPETITION_CAPACITY")]
    pub competition_capacity: Option<String>,
    #[serde(rename = "KEY_OUTCOMES")]
    pub key_outcomes: Option<String>,
    #[serde(rename = "AUTOMATIONS_LIST")]
    pub automations: Option<TextOrList>,
    #[serde(rename = "REVENUE_IDEAS")]
    pub revenue_ideas: Option<TextOrList>,
    #[serde(rename = "METRICS")]
    pub metrics: Option<TextOrList>,
    #[serde(rename = "RED_FLAGS")]
    pub red_flags: Option<TextOrList>,
    #[serde(rename = "NEXT_STEPS")]
    pub next_steps: Option<TextOrList>,
    #[serde(rename = "KEY_QUOTES")]
    pub key_quotes: Option<TextOrList>,
    #[serde(rename = "PLAN_LIST")]
    pub plan: Option<TextOrList>,
    #[serde(rename = "callSummary")]
    pub call_summary: Option<String>,
    #[serde(rename = "topPriorities")]
    pub top_priorities: Option<TextOrList>,
    #[serde(rename = "painPoints")]
    pub pain_points: Option<TextOrList>,
    #[serde(rename = "timelineUrgency")]
    pub timeline_urgency: Option<String>,
    #[serde(rename = "fullReport")]
    pub full_report: Option<String>,
}
