//! Class balance statistics of a row table.

use crate::core::{Label, OutputRow};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Per-class counts of one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub children: usize,
    pub rows: usize,
    pub videos: usize,
}

/// Balance summary of a row table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassStatistics {
    pub asd: ClassCounts,
    pub neurotypical: ClassCounts,
}

impl ClassStatistics {
    pub fn from_rows(rows: &[OutputRow]) -> Self {
        Self {
            asd: counts(rows, Label::Asd),
            neurotypical: counts(rows, Label::Neurotypical),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.asd.rows + self.neurotypical.rows
    }

    /// ASD rows per NT row, `None` without NT rows.
    pub fn row_ratio(&self) -> Option<f64> {
        if self.neurotypical.rows == 0 {
            None
        } else {
            Some(self.asd.rows as f64 / self.neurotypical.rows as f64)
        }
    }
}

fn counts(rows: &[OutputRow], label: Label) -> ClassCounts {
    let mut children = HashSet::new();
    let mut videos = HashSet::new();
    let mut count = 0;

    for row in rows.iter().filter(|r| r.label == label) {
        children.insert(row.child_id.as_str());
        videos.insert(row.video_key.as_str());
        count += 1;
    }

    ClassCounts {
        children: children.len(),
        rows: count,
        videos: videos.len(),
    }
}

impl fmt::Display for ClassStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Class Statistics:")?;
        for (label, c) in [
            (Label::Asd, &self.asd),
            (Label::Neurotypical, &self.neurotypical),
        ] {
            writeln!(
                f,
                "  {label:<4} children: {:>5}  videos: {:>6}  rows: {:>6}",
                c.children, c.videos, c.rows
            )?;
        }
        match self.row_ratio() {
            Some(ratio) => write!(f, "  ASD/NT row ratio: {ratio:.2}"),
            None => write!(f, "  ASD/NT row ratio: n/a"),
        }
    }
}
