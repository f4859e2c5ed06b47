//! Table rendering for report rows using tabled
//!
//! Rows are pushed through the `Builder` API since every report carries its
//! own column set.

use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Columns, object::Rows, width::Width},
};

use super::ReportRow;

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Placeholder printed for a report without rows
pub const EMPTY_RESULT: &str = "(no results)";

/// Table formatter for report rows
pub struct TableFormatter {
    /// Maximum column width, longer cells wrap
    max_column_width: usize,
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    pub fn new() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }

    /// Set maximum column width
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Render rows under their report's headers
    pub fn format<T: ReportRow>(&self, rows: &[T]) -> String {
        if rows.is_empty() {
            return EMPTY_RESULT.to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(T::HEADERS.iter().map(|h| h.to_string()));
        for row in rows {
            builder.push_record(row.cells());
        }

        let mut table = builder.build();
        table.with(Style::modern());

        for i in 0..T::HEADERS.len() {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}
