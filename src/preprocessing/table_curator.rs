use std::collections::HashSet;
use rayon::prelude::*;
use tracing::{debug, trace};
use crate::namespace::ComponentKind;
use crate::pipeline::clamp_table_range;
use crate::preprocessing::{BaseComponent, Curator};
use crate::types::{Config, CurationReport, Document, PreprocessError, SourceKind, Table, TableConfig};

/// Tidies table cells and shape, then drops tables that are too small.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableCurator;

impl TableCurator {
    pub fn from_config(config: &Config) -> Result<Self, PreprocessError> {
        config.table.validate().map_err(|reason| PreprocessError::InvalidConfig {
            component: "table_curator",
            reason,
        })?;
        Ok(Self)
    }

    fn normalize_cell(cell: &str) -> String {
        cell.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn curate_table(table: &Table, config: &TableConfig) -> Option<Table> {
        let mut header: Option<Vec<String>> = table
            .header
            .as_ref()
            .map(|h| h.iter().map(|c| Self::normalize_cell(c)).collect());
        let mut rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(|c| Self::normalize_cell(c)).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .collect();

        // Pad ragged rows so columns line up
        let width = rows
            .iter()
            .map(|r| r.len())
            .chain(header.iter().map(|h| h.len()))
            .max()
            .unwrap_or(0);
        for row in rows.iter_mut().chain(header.iter_mut()) {
            row.resize(width, String::new());
        }

        let keep: Vec<usize> = (0..width)
            .filter(|&col| {
                rows.iter().chain(header.iter()).any(|row| !row[col].is_empty())
            })
            .collect();
        if keep.len() < width {
            for row in rows.iter_mut().chain(header.iter_mut()) {
                let kept: Vec<String> = keep.iter().map(|&col| std::mem::take(&mut row[col])).collect();
                *row = kept;
            }
        }

        if header.is_none() && config.infer_header && rows.len() > 1 {
            header = Some(rows.remove(0));
        }

        let (max_rows, max_cols) = clamp_table_range(rows.len(), keep.len(), config);
        rows.truncate(max_rows);
        for row in rows.iter_mut().chain(header.iter_mut()) {
            row.truncate(max_cols);
        }

        if rows.len() < config.min_rows || max_cols < config.min_cols {
            trace!("Dropping {}x{} table", rows.len(), max_cols);
            return None;
        }

        Some(Table {
            page: table.page,
            header,
            rows,
        })
    }
}

impl Curator for TableCurator {
    fn curate(&self, document: &mut Document, config: &Config) -> Result<CurationReport, PreprocessError> {
        let before = document.tables.len();

        let curated: Vec<Table> = document
            .tables
            .par_iter()
            .filter_map(|table| Self::curate_table(table, &config.table))
            .collect();

        let mut seen = HashSet::new();
        document.tables = curated
            .into_iter()
            .filter(|table| seen.insert((table.header.clone(), table.rows.clone())))
            .collect();

        let report = CurationReport::new(before, document.tables.len());
        debug!("Table curation kept {} of {} tables", report.kept, before);
        Ok(report)
    }
}

impl BaseComponent for TableCurator {
    fn name(&self) -> &'static str {
        "table_curator"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::TableCurator
    }

    fn accepts(&self) -> Vec<SourceKind> {
        vec![SourceKind::Pdf, SourceKind::NaturalQuestions]
    }
}
