//! Post-simulation analytics over a path corpus.

pub mod premortem;
pub mod risk;
pub mod sensitivity;

pub use premortem::{
    CauseDirection, CriticalPeriod, FailureCause, FailureTrajectory, PremortemAnalyzer,
    PremortemResult, RegimeImpact, TrajectoryType,
};
pub use risk::{
    CvarResult, DrawdownAnalysis, RiskAnalysisResult, RiskAnalyzer, SurvivalAnalysis,
    TailAnalysis, UnderwaterAnalysis, VarResult,
};
pub use sensitivity::{
    CorrelationResult, OutputMetric, SensitivityAnalyzer, SensitivityResult, TornadoItem,
    VarianceContribution,
};
