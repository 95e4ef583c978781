use super::{Pcb, Policy, Preemption, ReadyQueue, ReadyRank, SimConfig, Ticks};

/// External priority with round robin inside a time quantum. A running
/// process yields to any strictly more urgent ready process, and to its
/// peers once the quantum is used up.
#[derive(Debug, Clone, Copy)]
pub struct ExternalPriorityRoundRobin {
    quantum: Ticks,
}

impl ExternalPriorityRoundRobin {
    pub fn with_quantum(quantum: Ticks) -> Self {
        Self { quantum }
    }
}

impl Policy for ExternalPriorityRoundRobin {
    fn init(config: &SimConfig) -> Self {
        Self::with_quantum(config.quantum)
    }

    fn name(&self) -> &'static str {
        "EP+RR"
    }

    fn ready_rank(&self, pcb: &Pcb) -> ReadyRank {
        ReadyRank {
            priority: pcb.priority(),
            tiebreak: u64::from(pcb.pid()),
        }
    }

    fn check_preemption(&self, running: &Pcb, ready: &ReadyQueue) -> Option<Preemption> {
        if ready
            .best_priority()
            .is_some_and(|best| best < running.priority())
        {
            return Some(Preemption::HigherPriority);
        }

        if running.time_in_quantum >= self.quantum {
            return Some(Preemption::QuantumExpired);
        }

        None
    }

    fn tracks_quantum(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;
    use crate::core::{ProcessDescriptor, SchedCtx};

    fn pcb(pid: u32, priority: u32) -> Pcb {
        Pcb::new(ProcessDescriptor::new(pid, 0, 10, priority))
    }

    #[test]
    fn ties_break_on_pid_not_queue_order() {
        let rr = ExternalPriorityRoundRobin::with_quantum(100);
        let mut low_pid = pcb(2, 3);
        low_pid.ready_seq = 40;
        let mut high_pid = pcb(5, 3);
        high_pid.ready_seq = 1;
        assert_eq!(rr.compare_ready(&low_pid, &high_pid), Ordering::Less);
        assert_eq!(rr.compare_ready(&pcb(9, 1), &low_pid), Ordering::Less);
    }

    #[test]
    fn strictly_better_priority_preempts_before_quantum() {
        let rr = ExternalPriorityRoundRobin::with_quantum(100);
        let mut ctx = SchedCtx::new();
        let equal = ctx.insert_pcb(pcb(2, 5));
        let better = ctx.insert_pcb(pcb(3, 1));

        let mut running = pcb(1, 5);
        running.time_in_quantum = 100;

        let mut ready = ReadyQueue::new();
        ready.push(equal, rr.ready_rank(ctx.pcb(equal)));
        assert_eq!(
            rr.check_preemption(&running, &ready),
            Some(Preemption::QuantumExpired)
        );

        ready.push(better, rr.ready_rank(ctx.pcb(better)));
        assert_eq!(
            rr.check_preemption(&running, &ready),
            Some(Preemption::HigherPriority)
        );
    }

    #[test]
    fn keeps_running_inside_quantum_against_equal_priority() {
        let rr = ExternalPriorityRoundRobin::with_quantum(100);
        let mut ctx = SchedCtx::new();
        let peer = ctx.insert_pcb(pcb(2, 5));
        let mut ready = ReadyQueue::new();
        ready.push(peer, rr.ready_rank(ctx.pcb(peer)));

        let mut running = pcb(1, 5);
        running.time_in_quantum = 99;
        assert_eq!(rr.check_preemption(&running, &ready), None);
    }
}
