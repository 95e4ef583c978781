//! Collaborators around the simulation core: workload files, transition
//! tables and random workload generation.

pub mod generate;
pub mod trace;
pub mod workload;

pub use generate::{WorkloadParams, bernoulli_workload};
pub use trace::{parse_table, read_table, render_json, render_table, write_table};
pub use workload::{load_workload, parse_workload, render_workload};
