pub mod core;
pub mod error;
pub mod io;
pub mod metrics;
pub mod scheduler;
pub mod sim;

pub use crate::core::{ProcessDescriptor, ProcessState, Transition, TransitionLog};
pub use error::SimError;
pub use metrics::Metrics;
pub use scheduler::{Policy, PolicyKind};
pub use sim::{Sim, SimConfig, SimReport, simulate};
