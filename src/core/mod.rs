pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::SchedCore;
pub use event::{Transition, TransitionLog};
pub use observer::Observer;
pub use state::{
    Pcb, PcbKey, Pid, Priority, ProcessDescriptor, ProcessState, ReadyQueue, ReadyRank, SchedCtx,
    Ticks,
};
