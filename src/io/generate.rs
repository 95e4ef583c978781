use rand::prelude::*;

use crate::core::{Pid, Priority, ProcessDescriptor, Ticks};

/// Shape of a random workload. One Bernoulli arrival trial per tick.
#[derive(Debug, Clone)]
pub struct WorkloadParams {
    pub ticks: Ticks,
    pub p_arrival: f64,
    pub p_short: f64,
    pub short_ticks: Ticks,
    pub long_ticks: Ticks,
    pub max_priority: Priority,
    /// Chance that a process does I/O at all
    pub p_io: f64,
    pub io_frequency: Ticks,
    pub io_duration: Ticks,
    pub max_memory: u32,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            ticks: 500,
            p_arrival: 0.05,
            p_short: 0.3,
            short_ticks: 20,
            long_ticks: 200,
            max_priority: 5,
            p_io: 0.5,
            io_frequency: 25,
            io_duration: 10,
            max_memory: 40,
        }
    }
}

pub fn bernoulli_workload(params: &WorkloadParams, seed: u64) -> Vec<ProcessDescriptor> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut workload = Vec::new();

    for t in 0..params.ticks {
        if rng.random::<f64>() >= params.p_arrival {
            continue;
        }

        let service_time = if rng.random::<f64>() < params.p_short {
            params.short_ticks
        } else {
            params.long_ticks
        };
        let priority = rng.random_range(0..=params.max_priority);
        let memory_size = rng.random_range(1..=params.max_memory.max(1));

        let mut desc = ProcessDescriptor::new(
            workload.len() as Pid + 1,
            t,
            service_time.max(1),
            priority,
        )
        .with_memory(memory_size);
        if rng.random::<f64>() < params.p_io {
            desc = desc.with_io(params.io_frequency, params.io_duration);
        }
        workload.push(desc);
    }

    workload
}
