use average::{Estimate, Mean};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

use crate::{
    core::{Pid, ProcessState, Ticks, Transition},
    error::{Result, SimError},
};

/// Per-process timing reconstructed from a transition log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessTimes {
    pub pid: Pid,
    pub admitted: Ticks,
    pub first_run: Option<Ticks>,
    pub finished: Option<Ticks>,
    /// Total ticks spent READY
    pub waiting: Ticks,
}

// Hand-edited tables may put a row before the admission; those clamp to zero
impl ProcessTimes {
    pub fn turnaround(&self) -> Option<Ticks> {
        self.finished.map(|t| t.saturating_sub(self.admitted))
    }

    pub fn response(&self) -> Option<Ticks> {
        self.first_run.map(|t| t.saturating_sub(self.admitted))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    /// Processes per ms, up to the last termination
    pub throughput: f64,
    pub avg_wait_time: f64,
    pub avg_turnaround: f64,
    pub avg_response: f64,
    pub processes: Vec<ProcessTimes>,
}

impl Metrics {
    pub fn from_transitions(transitions: &[Transition]) -> Result<Self> {
        let mut order: Vec<Pid> = Vec::new();
        let mut times: FxHashMap<Pid, ProcessTimes> = FxHashMap::default();
        let mut ready_since: FxHashMap<Pid, Ticks> = FxHashMap::default();

        for t in transitions {
            if t.from == ProcessState::New && t.to == ProcessState::Ready {
                order.push(t.pid);
                times.insert(
                    t.pid,
                    ProcessTimes {
                        pid: t.pid,
                        admitted: t.time,
                        ..ProcessTimes::default()
                    },
                );
            }
            // Logs may start mid-run; ignore processes never seen admitted
            let Some(entry) = times.get_mut(&t.pid) else {
                continue;
            };

            match t.to {
                ProcessState::Ready => {
                    ready_since.insert(t.pid, t.time);
                }
                ProcessState::Running => {
                    entry.first_run.get_or_insert(t.time);
                    if let Some(since) = ready_since.remove(&t.pid) {
                        entry.waiting += t.time.saturating_sub(since);
                    }
                }
                ProcessState::Terminated => entry.finished = Some(t.time),
                _ => {}
            }
        }

        let last_finish = times
            .values()
            .filter_map(|p| p.finished)
            .max()
            .ok_or(SimError::NoCompletedProcesses)?;

        let processes: Vec<ProcessTimes> = order
            .iter()
            .filter_map(|pid| times.remove(pid))
            .collect();
        let n = processes.len();

        Ok(Self {
            throughput: if last_finish > 0 {
                n as f64 / last_finish as f64
            } else {
                0.0
            },
            avg_wait_time: average(processes.iter().map(|p| p.waiting), n),
            avg_turnaround: average(processes.iter().filter_map(ProcessTimes::turnaround), n),
            avg_response: average(processes.iter().filter_map(ProcessTimes::response), n),
            processes,
        })
    }
}

/// Mean over `admitted` processes; those contributing no value count as zero.
fn average(values: impl Iterator<Item = Ticks>, admitted: usize) -> f64 {
    let mean: Mean = values.map(|v| v as f64).collect();
    if mean.is_empty() || admitted == 0 {
        return 0.0;
    }
    mean.estimate() * mean.len() as f64 / admitted as f64
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Throughput:        {:.4} processes/ms", self.throughput)?;
        writeln!(f, "Avg Wait Time:     {:.2} ms", self.avg_wait_time)?;
        writeln!(f, "Avg Turnaround:    {:.2} ms", self.avg_turnaround)?;
        write!(f, "Avg Response Time: {:.2} ms", self.avg_response)
    }
}
