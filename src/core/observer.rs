use super::state::{ProcessState, SchedCtx, Ticks};

/// Checks queue/state invariants after every tick and keeps CPU usage counters.
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
    busy_ticks: Ticks,
    max_ready_len: usize,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, ctx: &SchedCtx, busy: bool) {
        self.step += 1;
        if busy {
            self.busy_ticks += 1;
        }
        self.max_ready_len = self.max_ready_len.max(ctx.ready.len());

        if let Some(key) = ctx.running {
            let pcb = ctx.pcb(key);
            debug_assert_eq!(
                pcb.state,
                ProcessState::Running,
                "running slot holds PID {} in state {}",
                pcb.pid(),
                pcb.state
            );
            debug_assert!(
                !ctx.ready.contains(key) && !ctx.waiting.contains(&key),
                "Running PID {} must not appear in any queue",
                pcb.pid()
            );
        }

        for key in ctx.ready.keys() {
            let pcb = ctx.pcb(key);
            debug_assert_eq!(
                pcb.state,
                ProcessState::Ready,
                "PID {} on ready queue in state {}",
                pcb.pid(),
                pcb.state
            );
        }

        for &key in &ctx.waiting {
            let pcb = ctx.pcb(key);
            debug_assert_eq!(
                pcb.state,
                ProcessState::Waiting,
                "PID {} on wait queue in state {}",
                pcb.pid(),
                pcb.state
            );
            debug_assert!(
                pcb.io_remaining > 0,
                "Waiting PID {} has no outstanding I/O",
                pcb.pid()
            );
        }

        // Every admitted, unfinished process sits in exactly one place
        let placed = ctx.ready.len() + ctx.waiting.len() + usize::from(ctx.running.is_some());
        debug_assert_eq!(
            placed,
            ctx.unfinished(),
            "Queue membership does not cover the job list"
        );
        debug_assert_eq!(ctx.pid_index.len(), ctx.pcbs.len(), "PID index out of sync");
    }

    pub fn busy_ticks(&self) -> Ticks {
        self.busy_ticks
    }

    pub fn idle_ticks(&self) -> Ticks {
        self.step - self.busy_ticks
    }

    pub fn max_ready_len(&self) -> usize {
        self.max_ready_len
    }

    /// Fraction of observed ticks in which a process consumed CPU time.
    pub fn utilization(&self) -> f64 {
        if self.step == 0 {
            0.0
        } else {
            self.busy_ticks as f64 / self.step as f64
        }
    }
}
