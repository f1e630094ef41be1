//! Single-path simulation: business model, risk manager, path orchestration.

pub mod business_model;
pub mod path;
pub mod risk_manager;

pub use business_model::{BusinessModel, BusinessState, PipelineDeal};
pub use path::{simulate_path, PathResult, PathSimulatorInputs, RealizedParams};
pub use risk_manager::{ActiveShock, Channel, RiskEventConfig, RiskEventManager};
