//! Decision fusion
//!
//! - [`weights`]: adaptive category weights behind a mutex
//! - [`merge`]: pure primary selection and merging
//! - [`history`]: bounded history and performance metrics
//! - [`engine`]: the concurrent fan-out and the decision cycle

pub mod engine;
pub mod history;
pub mod merge;
pub mod weights;

pub use engine::{DecisionFusionEngine, FusionState};
pub use history::{DecisionHistory, PerformanceMetrics};
pub use merge::{FusionMerger, MergedDecision, REASONING_DELIMITER};
pub use weights::{AdaptationPolicy, CategoryWeights, SharedWeights};
