use serde::Serialize;

use crate::core::{Pcb, Pid, ProcessDescriptor, ProcessState, Ticks};

/// Final per-process outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRecord {
    pub desc: ProcessDescriptor,
    pub final_state: ProcessState,
    pub admitted: bool,
    pub start_time: Option<Ticks>,
    pub completion_time: Option<Ticks>,
}

impl ProcessRecord {
    pub fn admitted(pcb: &Pcb) -> Self {
        Self {
            desc: pcb.desc.clone(),
            final_state: pcb.state,
            admitted: true,
            start_time: pcb.start_time,
            completion_time: pcb.completion_time,
        }
    }

    pub fn never_admitted(pcb: &Pcb) -> Self {
        Self {
            admitted: false,
            ..Self::admitted(pcb)
        }
    }

    pub fn pid(&self) -> Pid {
        self.desc.pid
    }
}
