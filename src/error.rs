use std::{fmt, io};

use crate::core::{Pid, Ticks};

#[derive(Debug)]
pub enum SimError {
    /// Reading or writing a workload/trace file failed
    Io(io::Error),

    /// Malformed input line (1-based line number)
    Parse { line: usize, message: String },

    /// The same PID appears twice in one workload
    DuplicatePid(Pid),

    InvalidConfig(String),

    /// The run hit its tick ceiling with processes still unfinished
    TickLimitExceeded { limit: Ticks, unfinished: usize },

    /// Metrics requested for a log without any TERMINATED transition
    NoCompletedProcesses,

    Json(serde_json::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io(err) => write!(f, "I/O error: {}", err),
            SimError::Parse { line, message } => write!(f, "line {}: {}", line, message),
            SimError::DuplicatePid(pid) => write!(f, "duplicate PID {} in workload", pid),
            SimError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            SimError::TickLimitExceeded { limit, unfinished } => write!(
                f,
                "tick limit of {} reached with {} process(es) unfinished",
                limit, unfinished
            ),
            SimError::NoCompletedProcesses => {
                write!(f, "no TERMINATED transitions found in log")
            }
            SimError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(err) => Some(err),
            SimError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        SimError::Io(err)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
