use log::{info, trace, warn};
use rustc_hash::FxHashSet;
use serde::Serialize;

use super::{
    config::SimConfig,
    job::ProcessRecord,
    memory::{MemoryModel, MemoryOracle},
};
use crate::{
    core::{Pcb, ProcessDescriptor, SchedCore, Ticks, Transition, TransitionLog},
    error::{Result, SimError},
    scheduler::{ExternalPriority, ExternalPriorityRoundRobin, Policy, PolicyKind},
};

pub struct Sim<P: Policy, M: MemoryOracle> {
    pub core: SchedCore<P>,
    // Not yet admitted, kept in input order
    pending: Vec<Pcb>,
    memory: M,
    max_ticks: Option<Ticks>,
    drain_late_arrivals: bool,
    total: usize,
}

impl<P: Policy, M: MemoryOracle> Sim<P, M> {
    pub fn new(workload: Vec<ProcessDescriptor>, config: &SimConfig, memory: M) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_policy(workload, P::init(config), memory)?
            .with_tick_limit(config.max_ticks)
            .draining_late_arrivals(config.drain_late_arrivals))
    }

    pub fn with_policy(workload: Vec<ProcessDescriptor>, policy: P, memory: M) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for desc in &workload {
            if !seen.insert(desc.pid) {
                return Err(SimError::DuplicatePid(desc.pid));
            }
        }

        Ok(Self {
            core: SchedCore::with_policy(policy),
            total: workload.len(),
            pending: workload.into_iter().map(Pcb::new).collect(),
            memory,
            max_ticks: None,
            drain_late_arrivals: false,
        })
    }

    pub fn with_tick_limit(mut self, max_ticks: Option<Ticks>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn draining_late_arrivals(mut self, drain: bool) -> Self {
        self.drain_late_arrivals = drain;
        self
    }

    /// Run one tick and return the transitions it produced.
    pub fn step(&mut self) -> &[Transition] {
        let mark = self.core.ctx.log.len();

        self.handle_arrivals();
        for pid in self.core.tick() {
            self.memory.release(pid);
        }
        self.core.ctx.advance_time(1);

        self.core.ctx.log.since(mark)
    }

    fn handle_arrivals(&mut self) {
        let now = self.core.now();
        let mut index = 0;
        while index < self.pending.len() {
            let desc = &self.pending[index].desc;
            if desc.arrival_time > now {
                index += 1;
                continue;
            }

            if self.memory.grant(desc) {
                let pcb = self.pending.remove(index);
                self.core.admit(pcb);
            } else {
                trace!("t={} pid={} admission denied", now, desc.pid);
                index += 1;
            }
        }
    }

    /// At least one process was admitted and every admitted one has
    /// terminated. Processes still pending only hold the run open when
    /// draining late arrivals.
    pub fn is_finished(&self) -> bool {
        if self.total == 0 {
            return true;
        }
        self.core.ctx.all_terminated() && (!self.drain_late_arrivals || self.pending.is_empty())
    }

    pub fn unfinished(&self) -> usize {
        self.pending.len() + self.core.ctx.unfinished()
    }

    pub fn now(&self) -> Ticks {
        self.core.now()
    }

    pub fn run(mut self) -> Result<SimReport> {
        info!(
            "{} run started with {} process(es)",
            self.core.policy.name(),
            self.total
        );

        while !self.is_finished() {
            if let Some(limit) = self.max_ticks {
                if self.now() >= limit {
                    let unfinished = self.unfinished();
                    warn!(
                        "tick limit {} reached, {} process(es) unfinished",
                        limit, unfinished
                    );
                    return Err(SimError::TickLimitExceeded { limit, unfinished });
                }
            }
            self.step();
        }

        let report = self.into_report();
        info!(
            "{} run finished at t={} with {} transitions",
            report.policy,
            report.end_time,
            report.transitions.len()
        );
        Ok(report)
    }

    pub fn into_report(self) -> SimReport {
        let observer = self.core.observer();
        let mut processes: Vec<_> = self
            .core
            .ctx
            .pcbs
            .values()
            .map(ProcessRecord::admitted)
            .chain(self.pending.iter().map(ProcessRecord::never_admitted))
            .collect();
        processes.sort_by_key(ProcessRecord::pid);

        SimReport {
            policy: self.core.policy.name(),
            end_time: self.core.now(),
            busy_ticks: observer.busy_ticks(),
            cpu_utilization: observer.utilization(),
            max_ready_len: observer.max_ready_len(),
            processes,
            transitions: self.core.ctx.log,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub policy: &'static str,
    pub end_time: Ticks,
    pub busy_ticks: Ticks,
    pub cpu_utilization: f64,
    pub max_ready_len: usize,
    pub processes: Vec<ProcessRecord>,
    pub transitions: TransitionLog,
}

/// Run `workload` under the policy named by `kind`, with the memory model from `config`.
pub fn simulate(
    kind: PolicyKind,
    workload: Vec<ProcessDescriptor>,
    config: &SimConfig,
) -> Result<SimReport> {
    let memory = MemoryModel::from(&config.memory);
    match kind {
        PolicyKind::Ep => Sim::<ExternalPriority, _>::new(workload, config, memory)?.run(),
        PolicyKind::EpRr => {
            Sim::<ExternalPriorityRoundRobin, _>::new(workload, config, memory)?.run()
        }
    }
}
