// Tax module - import tax stack, burden index and strategy recommendation

pub mod assessment;
pub mod burden;
pub mod recommendation;
pub mod scenarios;
pub mod stack;

pub use assessment::{evaluate_batch, Assessor, BatchOutcome};
pub use burden::{classify_severity, classify_value, index, BurdenAssessment, ClassificationTable};
pub use recommendation::{recommend, Recommendation, RecommendationRules};
pub use scenarios::{what_if, Scenario, ScenarioOutcome, ScenarioRules};
pub use stack::{compute, compute_with_rates, TaxRates, TaxStack};
