use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    core::Ticks,
    error::{Result, SimError},
    scheduler::DEFAULT_QUANTUM,
};

/// Partition sizes in MB used when none are given.
pub const DEFAULT_PARTITIONS: [u32; 6] = [40, 25, 15, 10, 8, 2];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryConfig {
    #[default]
    Unbounded,
    Partitions { sizes: Vec<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// EP+RR time slice in ms
    pub quantum: Ticks,
    /// Stop with an error after this many ticks; `None` runs until done
    pub max_ticks: Option<Ticks>,
    pub memory: MemoryConfig,
    /// Keep running until every input process has been admitted and finished,
    /// instead of stopping once all admitted processes have terminated
    pub drain_late_arrivals: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            max_ticks: None,
            memory: MemoryConfig::default(),
            drain_late_arrivals: false,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantum == 0 {
            return Err(SimError::InvalidConfig(
                "quantum must be at least 1 ms".to_string(),
            ));
        }
        if let MemoryConfig::Partitions { sizes } = &self.memory {
            if sizes.is_empty() {
                return Err(SimError::InvalidConfig(
                    "partition table is empty".to_string(),
                ));
            }
            if sizes.contains(&0) {
                return Err(SimError::InvalidConfig(
                    "partition sizes must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}
