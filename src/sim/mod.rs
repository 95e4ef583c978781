pub mod config;
pub mod driver;
pub mod job;
pub mod memory;

pub use config::{MemoryConfig, SimConfig};
pub use driver::{Sim, SimReport, simulate};
pub use job::ProcessRecord;
pub use memory::{FixedPartitions, MemoryModel, MemoryOracle, Unbounded};
