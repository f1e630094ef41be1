//! Stochastic processes driving path simulation: arrivals, asset-style
//! dynamics, and the latent macro regime.

pub mod gbm;
pub mod jump_diffusion;
pub mod poisson;
pub mod regime;

pub use gbm::Gbm;
pub use jump_diffusion::JumpDiffusion;
pub use poisson::{CompoundPoisson, PoissonProcess};
pub use regime::{Regime, RegimeMultipliers, RegimeSwitchingModel};
