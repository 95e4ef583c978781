use log::trace;

use super::config::MemoryConfig;
use crate::core::{Pid, ProcessDescriptor};

/// Decides whether an arrived process may be admitted this tick.
pub trait MemoryOracle {
    fn grant(&mut self, desc: &ProcessDescriptor) -> bool;

    /// The process terminated; anything it held can be reused.
    fn release(&mut self, _pid: Pid) {}
}

impl<F> MemoryOracle for F
where
    F: FnMut(&ProcessDescriptor) -> bool,
{
    fn grant(&mut self, desc: &ProcessDescriptor) -> bool {
        self(desc)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl MemoryOracle for Unbounded {
    fn grant(&mut self, _desc: &ProcessDescriptor) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub size: u32,
    pub occupant: Option<Pid>,
}

/// Fixed partition table, first fit in table order.
#[derive(Debug, Clone)]
pub struct FixedPartitions {
    partitions: Vec<Partition>,
}

impl FixedPartitions {
    pub fn new(sizes: &[u32]) -> Self {
        Self {
            partitions: sizes
                .iter()
                .map(|&size| Partition {
                    size,
                    occupant: None,
                })
                .collect(),
        }
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn free_memory(&self) -> u32 {
        self.partitions
            .iter()
            .filter(|p| p.occupant.is_none())
            .map(|p| p.size)
            .sum()
    }
}

impl MemoryOracle for FixedPartitions {
    fn grant(&mut self, desc: &ProcessDescriptor) -> bool {
        let slot = self
            .partitions
            .iter_mut()
            .find(|p| p.occupant.is_none() && p.size >= desc.memory_size);

        match slot {
            Some(partition) => {
                partition.occupant = Some(desc.pid);
                true
            }
            None => {
                trace!(
                    "no free partition for pid={} ({} MB)",
                    desc.pid, desc.memory_size
                );
                false
            }
        }
    }

    fn release(&mut self, pid: Pid) {
        for partition in &mut self.partitions {
            if partition.occupant == Some(pid) {
                partition.occupant = None;
            }
        }
    }
}

/// Oracle selected by [`MemoryConfig`].
#[derive(Debug, Clone)]
pub enum MemoryModel {
    Unbounded(Unbounded),
    Partitions(FixedPartitions),
}

impl From<&MemoryConfig> for MemoryModel {
    fn from(config: &MemoryConfig) -> Self {
        match config {
            MemoryConfig::Unbounded => Self::Unbounded(Unbounded),
            MemoryConfig::Partitions { sizes } => Self::Partitions(FixedPartitions::new(sizes)),
        }
    }
}

impl MemoryOracle for MemoryModel {
    fn grant(&mut self, desc: &ProcessDescriptor) -> bool {
        match self {
            Self::Unbounded(oracle) => oracle.grant(desc),
            Self::Partitions(oracle) => oracle.grant(desc),
        }
    }

    fn release(&mut self, pid: Pid) {
        match self {
            Self::Unbounded(oracle) => oracle.release(pid),
            Self::Partitions(oracle) => oracle.release(pid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(pid: Pid, memory_size: u32) -> ProcessDescriptor {
        ProcessDescriptor::new(pid, 0, 1, 1).with_memory(memory_size)
    }

    #[test]
    fn first_fit_in_table_order() {
        let mut memory = FixedPartitions::new(&[10, 40, 25]);
        assert!(memory.grant(&desc(1, 20)));
        assert!(memory.grant(&desc(2, 5)));
        assert!(memory.grant(&desc(3, 25)));
        assert!(!memory.grant(&desc(4, 1)));

        let owners: Vec<_> = memory.partitions().iter().map(|p| p.occupant).collect();
        assert_eq!(owners, vec![Some(2), Some(1), Some(3)]);
    }

    #[test]
    fn release_frees_the_owned_partition() {
        let mut memory = FixedPartitions::new(&[8, 2]);
        assert!(memory.grant(&desc(1, 8)));
        assert!(!memory.grant(&desc(2, 8)));
        assert_eq!(memory.free_memory(), 2);

        memory.release(1);
        assert!(memory.grant(&desc(2, 8)));
    }

    #[test]
    fn closures_act_as_oracles() {
        let mut calls = 0;
        let mut oracle = |_: &ProcessDescriptor| {
            calls += 1;
            calls > 2
        };
        assert!(!oracle.grant(&desc(1, 1)));
        assert!(!oracle.grant(&desc(1, 1)));
        assert!(oracle.grant(&desc(1, 1)));
    }
}
