//! Process table with filtering and sorting.

use backend::{ProcessRecord, Snapshot};
use clap::ValueEnum;
use std::fmt::Write;

// Filter processes based on search text
fn filter_processes<'a>(processes: &'a Snapshot, search_text: &str) -> Vec<&'a ProcessRecord> {
    if search_text.is_empty() {
        return processes.iter().collect();
    }

    let search_lower = search_text.to_lowercase();
    processes
        .iter()
        .filter(|p| {
            p.name().to_lowercase().contains(&search_lower)
                || p.id().to_string().contains(&search_lower)
        })
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, ValueEnum)]
pub enum SortColumn {
    /// Keep the order the OS reported.
    #[default]
    None,
    Pid,
    Name,
}

#[derive(Debug, Default)]
pub struct ProcessTable {
    pub sort_column: SortColumn,
    pub sort_descending: bool,
    pub search_text: String,
}

impl ProcessTable {
    /// Filtered and sorted rows, in display order.
    pub fn rows<'a>(&self, processes: &'a Snapshot) -> Vec<&'a ProcessRecord> {
        let mut rows = filter_processes(processes, &self.search_text);

        match self.sort_column {
            SortColumn::None => {}
            SortColumn::Pid => rows.sort_by_key(|p| p.id()),
            SortColumn::Name => rows.sort_by(|a, b| {
                a.name()
                    .to_lowercase()
                    .cmp(&b.name().to_lowercase())
                    .then(a.id().cmp(&b.id()))
            }),
        }
        if self.sort_descending {
            rows.reverse();
        }
        rows
    }

    /// Render the table; returns the text and the number of rows shown.
    pub fn render(&self, processes: &Snapshot) -> (String, usize) {
        let rows = self.rows(processes);
        let mut out = String::new();

        let _ = writeln!(out, "{:>8}  {}", "PID", "NAME");
        for p in &rows {
            let _ = writeln!(out, "{:>8}  {}", p.id(), p.name());
        }

        (out, rows.len())
    }
}
