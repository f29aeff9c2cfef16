// model/precall.rs - Pre-call briefing, checklist and saved plans

use crate::decode::{lenient, lenient_list};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Importance {
    MustAsk,
    NiceToHave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionSource {
    Core,
    GoalSpecific,
}

/// One checklist entry. `checked` only exists on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecallQuestion {
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub question: String,
    pub importance: Importance,
    pub source: QuestionSource,
    #[serde(default, skip_serializing)]
    pub checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Briefing {
    pub client_overview: String,
    pub company_overview: String,
    pub meeting_focus: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CriticalTopic {
    pub title: String,
    pub why_it_matters: String,
    pub questions_to_cover: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanMetadata {
    pub version: u32,
    pub call_type: String,
}

impl Default for PlanMetadata {
    fn default() -> Self {
        Self {
            version: 1,
            call_type: "discovery".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanEmailStatus {
    Sent,
    Error,
    Skipped,
}

/// The plan currently shown in the pre-call panel, either freshly generated
/// or loaded from a saved plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecallResult {
    #[serde(default, alias = "id")]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub briefing: Briefing,
    #[serde(default, deserialize_with = "lenient_list")]
    pub question_checklist: Vec<PrecallQuestion>,
    #[serde(default, deserialize_with = "lenient")]
    pub email_status: Option<PlanEmailStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub coaching_notes: Vec<String>,
    #[serde(default)]
    pub metadata: PlanMetadata,
    #[serde(default, deserialize_with = "lenient")]
    pub meeting_success: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub critical_topics: Vec<CriticalTopic>,
}

impl PrecallResult {
    /// Reset every checklist item to unchecked, whatever the server sent.
    pub fn normalized(mut self) -> Self {
        for question in &mut self.question_checklist {
            question.checked = false;
        }
        self
    }

    pub fn checked_count(&self) -> usize {
        self.question_checklist.iter().filter(|q| q.checked).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub meeting_goal: Option<String>,
    #[serde(default)]
    pub offer_name: Option<String>,
    #[serde(default)]
    pub desired_outcome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetail {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub meeting_goal: Option<String>,
    #[serde(default)]
    pub offer_name: Option<String>,
    #[serde(default)]
    pub desired_outcome: Option<String>,
    #[serde(default)]
    pub briefing: Briefing,
    #[serde(default, deserialize_with = "lenient_list")]
    pub checklist: Vec<PrecallQuestion>,
    #[serde(default, deserialize_with = "lenient")]
    pub coaching: Option<Vec<String>>,
}

impl PlanDetail {
    pub fn to_result(&self) -> PrecallResult {
        PrecallResult {
            plan_id: Some(self.id.clone()),
            briefing: self.briefing.clone(),
            question_checklist: self.checklist.clone(),
            email_status: Some(PlanEmailStatus::Skipped),
            coaching_notes: self.coaching.clone().unwrap_or_default(),
            metadata: PlanMetadata::default(),
            meeting_success: String::new(),
            critical_topics: Vec::new(),
        }
        .normalized()
    }
}

pub const DEFAULT_MEETING_GOAL: &str = "sell_service";

/// Pre-call prep form, posted as-is to `/precall-prep`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecallForm {
    pub client_name: String,
    pub company_name: String,
    pub role: String,
    pub website_url: String,
    pub linkedin_url: String,
    pub send_to_email: String,
    pub notes: String,
    pub meeting_goal: String,
    pub goal_description: String,
    pub offer_name: String,
    pub offer_summary: String,
    pub desired_outcome: String,
}

impl Default for PrecallForm {
    fn default() -> Self {
        Self {
            client_name: String::new(),
            company_name: String::new(),
            role: String::new(),
            website_url: String::new(),
            linkedin_url: String::new(),
            send_to_email: String::new(),
            notes: String::new(),
            meeting_goal: DEFAULT_MEETING_GOAL.to_string(),
            goal_description: String::new(),
            offer_name: String::new(),
            offer_summary: String::new(),
            desired_outcome: String::new(),
        }
    }
}

impl PrecallForm {
    /// The form as submitted: the recipient address is trimmed.
    pub fn payload(&self) -> PrecallForm {
        PrecallForm {
            send_to_email: self.send_to_email.trim().to_string(),
            ..self.clone()
        }
    }

    /// Copy the saved plan's identifying fields into the form, keeping the
    /// current value wherever the plan has none.
    pub fn prefill_from(&mut self, detail: &PlanDetail) {
        fill(&mut self.client_name, &detail.client_name);
        fill(&mut self.company_name, &detail.company_name);
        fill(&mut self.meeting_goal, &detail.meeting_goal);
        fill(&mut self.desired_outcome, &detail.desired_outcome);
        fill(&mut self.offer_name, &detail.offer_name);
    }
}

fn fill(target: &mut String, source: &Option<String>) {
    if let Some(value) = source {
        *target = value.clone();
    }
}

/// Self-reported coverage of one checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageAnswer {
    pub id: String,
    pub asked: bool,
}
