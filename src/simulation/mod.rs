// Simulation module - seeded synthetic imports and export legs

pub mod batch;
pub mod generator;
pub mod stats;

pub use batch::{record_rng, simulate, simulate_exports, ExecutionMode, SimulationRun};
pub use generator::generate;
pub use stats::{summarize, SimulationSummary};
