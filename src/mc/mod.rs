//! Monte Carlo orchestration: the parallel replication engine and its
//! aggregation output types.

pub mod engine;

pub use engine::{
    EngineConfig, OutcomeDistribution, PathData, PathPercentile, RecommendationType, ReturnBucket,
    SimulationEngine, SimulationMeta, SimulationResult, SummaryStatistics,
};
