// model/mod.rs - Wire types shared by the stores

mod coaching;
mod job;
mod precall;
mod settings;

pub use coaching::{AiCoverageQuestion, CoverageStatus, OpportunitySize, PostCallCoaching, RiskLevel};
pub use job::{sort_newest_first, EmailHint, EmailStatus, Job, JobStatus, ParsedAnalysis, TextOrList};
pub use precall::{
    Briefing, CoverageAnswer, CriticalTopic, Importance, PlanDetail, PlanEmailStatus, PlanMetadata,
    PlanSummary, PrecallForm, PrecallQuestion, PrecallResult, QuestionSource, DEFAULT_MEETING_GOAL,
};
pub use settings::{Theme, UserSettings};
