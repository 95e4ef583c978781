use keyed_priority_queue::KeyedPriorityQueue;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use std::{cmp::Reverse, collections::VecDeque, fmt, str::FromStr};

use super::event::{Transition, TransitionLog};

pub type Pid = u32;
pub type Ticks = u64;
pub type Priority = u32;

new_key_type! {
    pub struct PcbKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    NotAssigned,
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

impl ProcessState {
    pub fn label(self) -> &'static str {
        match self {
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::New => "NEW",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Waiting => "WAITING",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for ProcessState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_ASSIGNED" => Ok(Self::NotAssigned),
            "NEW" => Ok(Self::New),
            "READY" => Ok(Self::Ready),
            "RUNNING" => Ok(Self::Running),
            "WAITING" => Ok(Self::Waiting),
            "TERMINATED" => Ok(Self::Terminated),
            other => Err(format!("unknown process state `{other}`")),
        }
    }
}

/// Static description of one process, as handed over by the workload source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub pid: Pid,
    pub arrival_time: Ticks,
    pub service_time: Ticks,
    pub priority: Priority,
    /// CPU ms between I/O requests; 0 disables I/O.
    pub io_frequency: Ticks,
    pub io_duration: Ticks,
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
}

fn default_memory_size() -> u32 {
    1
}

impl ProcessDescriptor {
    pub fn new(pid: Pid, arrival_time: Ticks, service_time: Ticks, priority: Priority) -> Self {
        Self {
            pid,
            arrival_time,
            service_time,
            priority,
            io_frequency: 0,
            io_duration: 0,
            memory_size: default_memory_size(),
        }
    }

    pub fn with_io(mut self, io_frequency: Ticks, io_duration: Ticks) -> Self {
        self.io_frequency = io_frequency;
        self.io_duration = io_duration;
        self
    }

    pub fn with_memory(mut self, memory_size: u32) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn uses_io(&self) -> bool {
        self.io_frequency > 0 && self.io_duration > 0
    }
}

/// Process control block: the mutable simulation record of one process.
#[derive(Debug, Clone)]
pub struct Pcb {
    pub desc: ProcessDescriptor,
    pub state: ProcessState,
    pub remaining_time: Ticks,
    pub cpu_since_last_io: Ticks,
    pub io_remaining: Ticks,
    pub time_in_quantum: Ticks,
    pub start_time: Option<Ticks>,
    pub completion_time: Option<Ticks>,
    // Stamp taken on every entry to the ready queue
    pub ready_seq: u64,
}

impl Pcb {
    pub fn new(desc: ProcessDescriptor) -> Self {
        Self {
            remaining_time: desc.service_time,
            desc,
            state: ProcessState::NotAssigned,
            cpu_since_last_io: 0,
            io_remaining: 0,
            time_in_quantum: 0,
            start_time: None,
            completion_time: None,
            ready_seq: 0,
        }
    }

    pub fn pid(&self) -> Pid {
        self.desc.pid
    }

    pub fn priority(&self) -> Priority {
        self.desc.priority
    }
}

/// Dispatch order key. Smaller ranks are dispatched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadyRank {
    pub priority: Priority,
    pub tiebreak: u64,
}

#[derive(Debug)]
pub struct ReadyQueue {
    // KeyedPriorityQueue is a max-heap, so ranks go in reversed
    entries: KeyedPriorityQueue<PcbKey, Reverse<ReadyRank>>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self {
            entries: KeyedPriorityQueue::new(),
        }
    }

    pub fn push(&mut self, key: PcbKey, rank: ReadyRank) {
        let replaced = self.entries.push(key, Reverse(rank));
        debug_assert!(replaced.is_none(), "PCB {key:?} enqueued twice on ready queue");
    }

    pub fn pop(&mut self) -> Option<PcbKey> {
        self.entries.pop().map(|(key, _)| key)
    }

    pub fn peek_rank(&self) -> Option<ReadyRank> {
        self.entries.peek().map(|(_, rank)| rank.0)
    }

    /// Highest-urgency priority value currently ready.
    pub fn best_priority(&self) -> Option<Priority> {
        self.peek_rank().map(|rank| rank.priority)
    }

    pub fn contains(&self, key: PcbKey) -> bool {
        self.entries.get_priority(&key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = PcbKey> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// All state of one simulation run. Admitted PCBs live only in `pcbs`; the
/// queues and the running slot refer to them by key.
#[derive(Debug)]
pub struct SchedCtx {
    pub now: Ticks,
    pub pcbs: SlotMap<PcbKey, Pcb>,
    pub pid_index: FxHashMap<Pid, PcbKey>,
    pub ready: ReadyQueue,
    pub waiting: VecDeque<PcbKey>,
    pub running: Option<PcbKey>,
    pub log: TransitionLog,

    // Increment upon each ready-queue entry
    next_ready_seq: u64,
}

impl SchedCtx {
    pub fn new() -> Self {
        Self {
            now: 0,
            pcbs: SlotMap::with_key(),
            pid_index: FxHashMap::default(),
            ready: ReadyQueue::new(),
            waiting: VecDeque::new(),
            running: None,
            log: TransitionLog::new(),
            next_ready_seq: 0,
        }
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    /// Insert a freshly admitted PCB into the job list.
    pub fn insert_pcb(&mut self, pcb: Pcb) -> PcbKey {
        let pid = pcb.pid();
        debug_assert!(
            !self.pid_index.contains_key(&pid),
            "PID {pid} admitted twice"
        );
        let key = self.pcbs.insert(pcb);
        self.pid_index.insert(pid, key);
        key
    }

    pub fn pcb(&self, key: PcbKey) -> &Pcb {
        &self.pcbs[key]
    }

    pub fn pcb_mut(&mut self, key: PcbKey) -> &mut Pcb {
        &mut self.pcbs[key]
    }

    /// Stamp the PCB as entering the ready queue now and return the stamp.
    pub fn take_ready_seq(&mut self, key: PcbKey) -> u64 {
        let seq = self.next_ready_seq;
        self.next_ready_seq += 1;
        self.pcbs[key].ready_seq = seq;
        seq
    }

    /// Move the PCB into `to` and append the matching log entry.
    pub fn set_state(&mut self, key: PcbKey, to: ProcessState) {
        let now = self.now;
        let pcb = &mut self.pcbs[key];
        let (pid, from) = (pcb.desc.pid, pcb.state);
        pcb.state = to;
        self.record(Transition::new(now, pid, from, to));
    }

    pub fn record(&mut self, transition: Transition) {
        debug!(
            "t={} pid={} {} -> {}",
            transition.time, transition.pid, transition.from, transition.to
        );
        self.log.push(transition);
    }

    pub fn cpu_is_idle(&self) -> bool {
        self.running.is_none()
    }

    pub fn clear_cpu(&mut self) {
        self.running = None;
    }

    /// True once something was admitted and every admitted PCB is terminated.
    pub fn all_terminated(&self) -> bool {
        !self.pcbs.is_empty()
            && self
                .pcbs
                .values()
                .all(|pcb| pcb.state == ProcessState::Terminated)
    }

    pub fn unfinished(&self) -> usize {
        self.pcbs
            .values()
            .filter(|pcb| pcb.state != ProcessState::Terminated)
            .count()
    }
}

impl Default for SchedCtx {
    fn default() -> Self {
        Self::new()
    }
}
