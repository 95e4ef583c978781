use serde::{Deserialize, Serialize};

use crate::core::{Pid, ProcessState, Ticks};

/// One logged state change of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub time: Ticks,
    pub pid: Pid,
    pub from: ProcessState,
    pub to: ProcessState,
}

impl Transition {
    pub fn new(time: Ticks, pid: Pid, from: ProcessState, to: ProcessState) -> Self {
        Self {
            time,
            pid,
            from,
            to,
        }
    }
}

// Append-only; nothing hands out mutable access to recorded entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionLog {
    entries: Vec<Transition>,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transition: Transition) {
        debug_assert!(
            self.entries.last().is_none_or(|last| last.time <= transition.time),
            "Transition log must stay chronological"
        );
        self.entries.push(transition);
    }

    pub fn entries(&self) -> &[Transition] {
        &self.entries
    }

    /// Entries recorded at or after position `from`.
    pub fn since(&self, from: usize) -> &[Transition] {
        &self.entries[from.min(self.entries.len())..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_pid(&self, pid: Pid) -> impl Iterator<Item = &Transition> + '_ {
        self.entries.iter().filter(move |t| t.pid == pid)
    }
}

impl From<Vec<Transition>> for TransitionLog {
    fn from(entries: Vec<Transition>) -> Self {
        Self { entries }
    }
}
