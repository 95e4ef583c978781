use std::{fs, path::Path};

use crate::{
    core::{Transition, TransitionLog},
    error::{Result, SimError},
};

const BORDER: &str = "+------------------------------------------------+";
const HEADER: &str = "|Time of Transition |PID | Old State | New State |";

pub fn render_header() -> String {
    format!("{BORDER}\n{HEADER}\n{BORDER}\n")
}

pub fn render_footer() -> String {
    format!("{BORDER}\n")
}

pub fn render_row(t: &Transition) -> String {
    format!(
        "|{:>18} |{:>3} |{:>10} |{:>10} |\n",
        t.time, t.pid, t.from, t.to
    )
}

/// Fixed-width transition table, framed by header and footer borders.
pub fn render_table(transitions: &[Transition]) -> String {
    let mut out = render_header();
    for t in transitions {
        out.push_str(&render_row(t));
    }
    out.push_str(&render_footer());
    out
}

/// Read a table produced by [`render_table`]. Borders, the header row and
/// any non-table text are skipped.
pub fn parse_table(text: &str) -> Result<TransitionLog> {
    let mut transitions = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let row = raw.trim();
        if !row.starts_with('|') {
            continue;
        }

        let cols: Vec<&str> = row.split('|').map(str::trim).collect();
        // ['', time, pid, old, new, '']
        if cols.len() < 5 || cols[1].starts_with("Time") {
            continue;
        }

        let parse_err = |message: String| SimError::Parse { line, message };
        transitions.push(Transition::new(
            cols[1]
                .parse()
                .map_err(|_| parse_err(format!("invalid time `{}`", cols[1])))?,
            cols[2]
                .parse()
                .map_err(|_| parse_err(format!("invalid PID `{}`", cols[2])))?,
            cols[3].parse().map_err(parse_err)?,
            cols[4].parse().map_err(parse_err)?,
        ));
    }

    Ok(transitions.into())
}

pub fn write_table(path: impl AsRef<Path>, transitions: &[Transition]) -> Result<()> {
    fs::write(path, render_table(transitions))?;
    Ok(())
}

pub fn read_table(path: impl AsRef<Path>) -> Result<TransitionLog> {
    parse_table(&fs::read_to_string(path)?)
}

pub fn render_json(transitions: &TransitionLog) -> Result<String> {
    let mut out = serde_json::to_string_pretty(transitions)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProcessState::*;

    fn sample() -> Vec<Transition> {
        vec![
            Transition::new(0, 1, New, Ready),
            Transition::new(0, 1, Ready, Running),
            Transition::new(1234, 42, Running, Terminated),
        ]
    }

    #[test]
    fn renders_fixed_width_rows() {
        let table = render_table(&sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], BORDER);
        assert_eq!(lines[1], HEADER);
        assert_eq!(lines[3], "|                 0 |  1 |       NEW |     READY |");
        assert_eq!(lines[5], "|              1234 | 42 |   RUNNING |TERMINATED |");
        assert_eq!(lines.last(), Some(&BORDER));
        assert!(lines.iter().all(|l| l.len() == BORDER.len()));
    }

    #[test]
    fn parse_then_render_is_a_fixed_point() {
        let table = render_table(&sample());
        let parsed = parse_table(&table).unwrap();
        assert_eq!(parsed.entries(), sample().as_slice());
        assert_eq!(render_table(parsed.entries()), table);
    }

    #[test]
    fn bad_state_reports_line() {
        let text = format!("{}|                 3 |  1 |     READY |  SLEEPING |\n", render_header());
        assert!(matches!(
            parse_table(&text),
            Err(SimError::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn json_uses_state_labels() {
        let log = TransitionLog::from(sample());
        let json = render_json(&log).unwrap();
        assert!(json.contains("\"TERMINATED\""), "{json}");
        assert!(json.ends_with("]\n"));
        let back: Vec<Transition> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
