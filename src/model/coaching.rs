use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunitySize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostCallCoaching {
    pub goal_summary: String,
    pub goal_achieved: bool,
    pub goal_comment: String,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub missed_questions: Vec<String>,
    pub coaching_tips: Vec<String>,
    pub follow_ups_for_client: Vec<String>,
    pub primary_next_action: String,
    pub next_action_steps: Vec<String>,
    pub risk_level: Option<RiskLevel>,
    pub opportunity_size: Option<OpportunitySize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Asked,
    PartiallyAsked,
    NotAsked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiCoverageQuestion {
    pub id: String,
    #[serde(default)]
    pub question: String,
    pub status: CoverageStatus,
    /// 0.0 - 1.0
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub rationale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coaching_decodes_with_missing_optional_fields() {
        let coaching: PostCallCoaching = serde_json::from_value(json!({
            "goalSummary": "Qualify the lead",
            "goalAchieved": true,
            "strengths": ["Rapport"],
            "riskLevel": "medium"
        }))
        .unwrap();
        assert!(coaching.goal_achieved);
        assert_eq!(coaching.risk_level, Some(RiskLevel::Medium));
        assert_eq!(coaching.opportunity_size, None);
        assert!(coaching.next_action_steps.is_empty());
    }

    #[test]
    fn coverage_status_uses_snake_case() {
        let question: AiCoverageQuestion = serde_json::from_value(json!({
            "id": "q3",
            "question": "Timeline?",
            "status": "partially_asked",
            "confidence": 0.4
        }))
        .unwrap();
        assert_eq!(question.status, CoverageStatus::PartiallyAsked);
        assert_eq!(question.rationale, None);
    }
}
