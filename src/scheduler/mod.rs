pub mod ep;
pub mod ep_rr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{
    core::state::{Pcb, ReadyQueue, ReadyRank, Ticks},
    sim::SimConfig,
};
pub use ep::ExternalPriority;
pub use ep_rr::ExternalPriorityRoundRobin;

pub const DEFAULT_QUANTUM: Ticks = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// External priority, no preemption
    Ep,
    /// External priority with priority and quantum preemption
    EpRr,
}

impl PolicyKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ep => "EP",
            Self::EpRr => "EP_RR",
        }
    }
}

/// Why a running process was pushed back onto the ready queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preemption {
    HigherPriority,
    QuantumExpired,
}

/// Scheduling strategy plugged into the shared simulation engine.
///
/// A policy only decides ordering and preemption; every state change is
/// carried out by [`crate::core::SchedCore`].
pub trait Policy {
    fn init(config: &SimConfig) -> Self
    where
        Self: Sized;

    fn name(&self) -> &'static str;

    /// Ordering key for the ready queue; the smallest rank is dispatched next.
    fn ready_rank(&self, pcb: &Pcb) -> ReadyRank;

    fn compare_ready(&self, a: &Pcb, b: &Pcb) -> Ordering {
        self.ready_rank(a).cmp(&self.ready_rank(b))
    }

    /// Called after I/O and termination checks for a process that keeps the CPU.
    fn check_preemption(&self, _running: &Pcb, _ready: &ReadyQueue) -> Option<Preemption> {
        None
    }

    /// Whether `time_in_quantum` is advanced while running.
    fn tracks_quantum(&self) -> bool {
        false
    }
}
