use super::{Pcb, Policy, ReadyRank, SimConfig};

/// Non-preemptive external priority: lowest priority value wins, equal
/// priorities keep ready-queue order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalPriority;

impl Policy for ExternalPriority {
    fn init(_config: &SimConfig) -> Self {
        Self
    }

    fn name(&self) -> &'static str {
        "EP"
    }

    fn ready_rank(&self, pcb: &Pcb) -> ReadyRank {
        ReadyRank {
            priority: pcb.priority(),
            tiebreak: pcb.ready_seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;
    use crate::core::{ProcessDescriptor, ReadyQueue};

    fn pcb(pid: u32, priority: u32, ready_seq: u64) -> Pcb {
        let mut pcb = Pcb::new(ProcessDescriptor::new(pid, 0, 10, priority));
        pcb.ready_seq = ready_seq;
        pcb
    }

    #[test]
    fn equal_priorities_keep_queue_order() {
        let ep = ExternalPriority;
        // Higher PID queued first still goes first
        let early = pcb(9, 2, 0);
        let late = pcb(1, 2, 1);
        assert_eq!(ep.compare_ready(&early, &late), Ordering::Less);
        assert_eq!(ep.compare_ready(&pcb(9, 1, 5), &early), Ordering::Less);
    }

    #[test]
    fn never_preempts() {
        let ep = ExternalPriority;
        let mut running = pcb(1, 10, 0);
        running.time_in_quantum = 10_000;
        let ready = ReadyQueue::new();
        assert_eq!(ep.check_preemption(&running, &ready), None);
        assert!(!ep.tracks_quantum());
    }
}
