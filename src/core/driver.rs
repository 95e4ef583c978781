use log::trace;

use super::{
    observer::Observer,
    state::{Pcb, PcbKey, Pid, ProcessState, SchedCtx, Ticks},
};
use crate::{
    scheduler::{Policy, Preemption},
    sim::SimConfig,
};

pub struct SchedCore<P: Policy> {
    pub ctx: SchedCtx,
    pub policy: P,
    observer: Observer,
}

// What the execution step decided for the running process this tick
enum RunOutcome {
    Continue,
    RequestIo,
    Terminate,
}

impl<P: Policy> SchedCore<P> {
    pub fn new(config: &SimConfig) -> Self {
        Self::with_policy(P::init(config))
    }

    pub fn with_policy(policy: P) -> Self {
        Self {
            ctx: SchedCtx::new(),
            policy,
            observer: Observer::new(),
        }
    }

    /// Admit a not-yet-assigned process: it joins the job list and the ready queue.
    pub fn admit(&mut self, mut pcb: Pcb) -> PcbKey {
        debug_assert_eq!(
            pcb.state,
            ProcessState::NotAssigned,
            "Only unassigned processes can be admitted"
        );
        pcb.cpu_since_last_io = 0;
        pcb.io_remaining = 0;
        pcb.time_in_quantum = 0;
        pcb.state = ProcessState::New;

        let key = self.ctx.insert_pcb(pcb);
        self.ctx.set_state(key, ProcessState::Ready);
        self.enqueue_ready(key);
        key
    }

    /// Wait queue, execution step and dispatch for the current tick. Time is
    /// not advanced here. Returns the PIDs that terminated during this tick.
    pub fn tick(&mut self) -> Vec<Pid> {
        self.service_wait_queue();
        let busy = !self.ctx.cpu_is_idle();
        let completed = self.execute_running();
        self.dispatch();
        self.observer.observe(&self.ctx, busy);
        completed.into_iter().collect()
    }

    fn enqueue_ready(&mut self, key: PcbKey) {
        self.ctx.take_ready_seq(key);
        let rank = self.policy.ready_rank(self.ctx.pcb(key));
        self.ctx.ready.push(key, rank);
    }

    // Every waiting process loses one ms of outstanding I/O
    fn service_wait_queue(&mut self) {
        let mut still_waiting = Vec::with_capacity(self.ctx.waiting.len());
        while let Some(key) = self.ctx.waiting.pop_front() {
            let pcb = self.ctx.pcb_mut(key);
            pcb.io_remaining = pcb.io_remaining.saturating_sub(1);

            if pcb.io_remaining > 0 {
                still_waiting.push(key);
                continue;
            }

            pcb.time_in_quantum = 0;
            pcb.cpu_since_last_io = 0;
            self.ctx.set_state(key, ProcessState::Ready);
            self.enqueue_ready(key);
        }
        self.ctx.waiting.extend(still_waiting);
    }

    // One simulated millisecond of the running process
    fn execute_running(&mut self) -> Option<Pid> {
        let key = self.ctx.running?;
        let tracks_quantum = self.policy.tracks_quantum();

        // In its own block so the PCB borrow ends before state changes
        let outcome = {
            let pcb = self.ctx.pcb_mut(key);
            debug_assert_eq!(pcb.state, ProcessState::Running);

            pcb.remaining_time = pcb.remaining_time.saturating_sub(1);
            if tracks_quantum {
                pcb.time_in_quantum += 1;
            }

            let uses_io = pcb.desc.uses_io();
            if uses_io {
                pcb.cpu_since_last_io += 1;
            }

            // A process finishing on this tick terminates instead of blocking
            if uses_io && pcb.cpu_since_last_io >= pcb.desc.io_frequency && pcb.remaining_time > 0
            {
                RunOutcome::RequestIo
            } else if pcb.remaining_time == 0 {
                RunOutcome::Terminate
            } else {
                RunOutcome::Continue
            }
        };

        match outcome {
            RunOutcome::RequestIo => {
                self.block_on_io(key);
                None
            }
            RunOutcome::Terminate => Some(self.terminate(key)),
            RunOutcome::Continue => {
                if let Some(reason) = self
                    .policy
                    .check_preemption(self.ctx.pcb(key), &self.ctx.ready)
                {
                    self.preempt(key, reason);
                }
                None
            }
        }
    }

    fn block_on_io(&mut self, key: PcbKey) {
        let pcb = self.ctx.pcb_mut(key);
        pcb.io_remaining = pcb.desc.io_duration;
        pcb.cpu_since_last_io = 0;
        pcb.time_in_quantum = 0;

        self.ctx.set_state(key, ProcessState::Waiting);
        self.ctx.waiting.push_back(key);
        self.ctx.clear_cpu();
    }

    fn terminate(&mut self, key: PcbKey) -> Pid {
        let now = self.ctx.now;
        let pcb = self.ctx.pcb_mut(key);
        pcb.completion_time = Some(now);
        let pid = pcb.pid();

        self.ctx.set_state(key, ProcessState::Terminated);
        self.ctx.clear_cpu();
        pid
    }

    fn preempt(&mut self, key: PcbKey, reason: Preemption) {
        trace!(
            "t={} pid={} preempted: {:?}",
            self.ctx.now,
            self.ctx.pcb(key).pid(),
            reason
        );
        self.ctx.pcb_mut(key).time_in_quantum = 0;
        self.ctx.set_state(key, ProcessState::Ready);
        self.enqueue_ready(key);
        self.ctx.clear_cpu();
    }

    // Promote the best ready process when the CPU is free
    fn dispatch(&mut self) {
        if !self.ctx.cpu_is_idle() {
            return;
        }
        let Some(key) = self.ctx.ready.pop() else {
            return;
        };

        let now = self.ctx.now;
        let pcb = self.ctx.pcb_mut(key);
        pcb.time_in_quantum = 0;
        pcb.start_time.get_or_insert(now);

        self.ctx.set_state(key, ProcessState::Running);
        self.ctx.running = Some(key);
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::ProcessDescriptor,
        scheduler::{ExternalPriority, ExternalPriorityRoundRobin},
    };

    fn run_ticks<P: Policy>(core: &mut SchedCore<P>, ticks: Ticks) {
        for _ in 0..ticks {
            core.tick();
            core.ctx.advance_time(1);
        }
    }

    #[test]
    fn termination_wins_over_io_request() {
        // The fifth CPU ms is both the I/O point and the last ms of service
        let mut core = SchedCore::with_policy(ExternalPriority);
        let key = core.admit(Pcb::new(ProcessDescriptor::new(1, 0, 5, 1).with_io(5, 3)));
        run_ticks(&mut core, 6);

        let pcb = core.ctx.pcb(key);
        assert_eq!(pcb.state, ProcessState::Terminated);
        assert_eq!(pcb.completion_time, Some(5));
        assert!(core.ctx.waiting.is_empty());
        assert!(
            core.ctx
                .log
                .entries()
                .iter()
                .all(|t| t.to != ProcessState::Waiting)
        );
    }

    #[test]
    fn wait_queue_counts_down_once_per_tick() {
        let mut core = SchedCore::with_policy(ExternalPriority);
        let key = core.admit(Pcb::new(ProcessDescriptor::new(1, 0, 10, 1).with_io(2, 4)));

        // Dispatched at 0, I/O requested at 2
        run_ticks(&mut core, 3);
        assert_eq!(core.ctx.pcb(key).state, ProcessState::Waiting);
        assert_eq!(core.ctx.pcb(key).io_remaining, 4);

        for expected in [3, 2, 1] {
            run_ticks(&mut core, 1);
            assert_eq!(core.ctx.pcb(key).io_remaining, expected);
            assert_eq!(core.ctx.pcb(key).state, ProcessState::Waiting);
        }

        // Reaches zero at tick 6, becomes ready and is dispatched the same tick
        run_ticks(&mut core, 1);
        let pcb = core.ctx.pcb(key);
        assert_eq!(pcb.io_remaining, 0);
        assert_eq!(pcb.state, ProcessState::Running);
        assert_eq!(pcb.cpu_since_last_io, 0);
    }

    #[test]
    fn quantum_expiry_requeues_behind_lower_pid() {
        let mut core = SchedCore::with_policy(ExternalPriorityRoundRobin::with_quantum(2));
        let a = core.admit(Pcb::new(ProcessDescriptor::new(1, 0, 6, 1)));
        let b = core.admit(Pcb::new(ProcessDescriptor::new(2, 0, 6, 1)));
        run_ticks(&mut core, 5);

        // Equal priority ties go to the lower PID, so PID 1 wins every round
        assert_eq!(core.ctx.pcb(a).start_time, Some(0));
        assert_eq!(core.ctx.pcb(b).start_time, None);
        assert_eq!(core.ctx.running, Some(a));

        let times: Vec<_> = core
            .ctx
            .log
            .for_pid(1)
            .map(|t| (t.time, t.to))
            .collect();
        assert_eq!(
            times,
            vec![
                (0, ProcessState::Ready),
                (0, ProcessState::Running),
                (2, ProcessState::Ready),
                (2, ProcessState::Running),
                (4, ProcessState::Ready),
                (4, ProcessState::Running),
            ]
        );
    }

    #[test]
    fn idle_cpu_with_empty_ready_queue_is_a_no_op() {
        let mut core = SchedCore::with_policy(ExternalPriority);
        assert!(core.tick().is_empty());
        assert!(core.ctx.log.is_empty());
        assert_eq!(core.observer().idle_ticks(), 1);
    }
}
