// Drawback module - import/export linking and recoverable duty estimates

pub mod matcher;
pub mod summary;

pub use matcher::{match_all, match_entity, DrawbackRules};
pub use summary::{summarize, DrawbackSummary};
