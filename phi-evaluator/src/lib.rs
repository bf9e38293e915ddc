pub mod confusion;
pub mod efficiency;
pub mod latency;
pub mod matcher;
pub mod normalize;
pub mod report;
pub mod sample;

pub use confusion::ConfusionMatrix;
pub use efficiency::efficiency_score;
pub use latency::LatencyStats;
pub use matcher::{calculate_metrics, calculate_metrics_by_type, match_entities, MatchMode};
pub use normalize::normalize_phi_type;
pub use report::{evaluate, EfficiencyBudget, EvaluationCase, EvaluationReport, SampleConfusion};
pub use sample::PHISample;
