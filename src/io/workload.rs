use std::{fs, path::Path, str::FromStr};

use crate::{
    core::ProcessDescriptor,
    error::{Result, SimError},
};

const FIELDS: [&str; 7] = [
    "pid",
    "arrival_time",
    "service_time",
    "priority",
    "io_frequency",
    "io_duration",
    "memory_size",
];

/// Parse a workload file: one process per line,
/// `pid, arrival, service, priority, io_frequency, io_duration[, memory_size]`.
/// Blank lines and `#` comments are skipped.
pub fn parse_workload(text: &str) -> Result<Vec<ProcessDescriptor>> {
    let mut workload = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if !(FIELDS.len() - 1..=FIELDS.len()).contains(&fields.len()) {
            return Err(SimError::Parse {
                line,
                message: format!(
                    "expected {} or {} comma-separated fields, found {}",
                    FIELDS.len() - 1,
                    FIELDS.len(),
                    fields.len()
                ),
            });
        }

        let mut desc = ProcessDescriptor::new(
            field(&fields, 0, line)?,
            field(&fields, 1, line)?,
            field(&fields, 2, line)?,
            field(&fields, 3, line)?,
        )
        .with_io(field(&fields, 4, line)?, field(&fields, 5, line)?);
        if fields.len() == FIELDS.len() {
            desc = desc.with_memory(field(&fields, 6, line)?);
        }
        workload.push(desc);
    }

    Ok(workload)
}

fn field<T: FromStr>(fields: &[&str], index: usize, line: usize) -> Result<T> {
    fields[index].parse().map_err(|_| SimError::Parse {
        line,
        message: format!("invalid {} `{}`", FIELDS[index], fields[index]),
    })
}

pub fn load_workload(path: impl AsRef<Path>) -> Result<Vec<ProcessDescriptor>> {
    parse_workload(&fs::read_to_string(path)?)
}

/// Inverse of [`parse_workload`], memory size always included.
pub fn render_workload(workload: &[ProcessDescriptor]) -> String {
    let mut out = String::from("# pid, arrival, service, priority, io_frequency, io_duration, memory\n");
    for desc in workload {
        out.push_str(&format!(
            "{}, {}, {}, {}, {}, {}, {}\n",
            desc.pid,
            desc.arrival_time,
            desc.service_time,
            desc.priority,
            desc.io_frequency,
            desc.io_duration,
            desc.memory_size
        ));
    }
    out
}
