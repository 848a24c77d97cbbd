use std::path::Path;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};
use crate::namespace::ComponentKind;
use crate::pipeline::read_pdf_pages;
use crate::preprocessing::{BaseComponent, Extractor};
use crate::types::{Config, Document, PreprocessError, SourceKind, Table, TableConfig};

lazy_static! {
    static ref CELL_SEPARATOR_RE: Regex = Regex::new(r"\s{2,}|\t|\|").unwrap();
}

/// Finds column-aligned blocks of lines in PDF page text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PDFTableExtractor;

impl PDFTableExtractor {
    pub fn from_config(config: &Config) -> Result<Self, PreprocessError> {
        config.table.validate().map_err(|reason| PreprocessError::InvalidConfig {
            component: "pdf_table_extractor",
            reason,
        })?;
        if config.pdf.max_pages == Some(0) {
            return Err(PreprocessError::InvalidConfig {
                component: "pdf_table_extractor",
                reason: "pdf.max_pages must be at least 1".to_string(),
            });
        }
        Ok(Self)
    }

    fn split_row(line: &str, min_cols: usize) -> Option<Vec<String>> {
        let line = line.trim().trim_matches('|');
        if line.is_empty() {
            return None;
        }
        let cells: Vec<String> = CELL_SEPARATOR_RE
            .split(line)
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect();
        if cells.len() >= min_cols {
            Some(cells)
        } else {
            None
        }
    }

    fn find_tables(text: &str, page: u32, config: &TableConfig) -> Vec<Table> {
        let mut tables = Vec::new();
        let mut block: Vec<Vec<String>> = Vec::new();

        let mut flush = |block: &mut Vec<Vec<String>>| {
            if block.len() >= config.min_rows {
                tables.push(Table {
                    page: Some(page),
                    header: None,
                    rows: std::mem::take(block),
                });
            } else {
                block.clear();
            }
        };

        for line in text.lines() {
            match Self::split_row(line, config.min_cols) {
                Some(cells) => {
                    if block.first().is_some_and(|first| first.len() != cells.len()) {
                        flush(&mut block);
                    }
                    block.push(cells);
                }
                None => flush(&mut block),
            }
        }
        flush(&mut block);

        tables
    }
}

#[async_trait]
impl Extractor for PDFTableExtractor {
    async fn extract(&self, document: &mut Document, config: &Config) -> Result<(), PreprocessError> {
        debug!("Starting PDF table extraction for file: {}", document.source);
        let pages = read_pdf_pages(Path::new(&document.source), &config.pdf)?;

        for (page_num, raw) in &pages.pages {
            let tables = Self::find_tables(raw, *page_num, &config.table);
            trace!("Page {}: {} tables", page_num, tables.len());
            document.tables.extend(tables);
        }
        for error in pages.errors {
            document.push_error(format!("{}: {}", self.name(), error));
        }

        Ok(())
    }
}

impl BaseComponent for PDFTableExtractor {
    fn name(&self) -> &'static str {
        "pdf_table_extractor"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::PDFTableExtractor
    }

    fn accepts(&self) -> Vec<SourceKind> {
        vec![SourceKind::Pdf]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_row() {
        assert_eq!(
            PDFTableExtractor::split_row("Name   Age    City", 2),
            Some(vec!["Name".to_string(), "Age".to_string(), "City".to_string()])
        );
        assert_eq!(
            PDFTableExtractor::split_row("| a | b |", 2),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(PDFTableExtractor::split_row("An ordinary sentence of prose.", 2), None);
        assert_eq!(PDFTableExtractor::split_row("   ", 2), None);
    }

    #[test]
    fn test_find_tables_groups_aligned_rows() {
        let text = "Quarterly results\n\
                    Region   Q1    Q2\n\
                    North    10    12\n\
                    South    7     9\n\
                    Totals are unaudited.\n\
                    Key    Value\n";
        let tables = PDFTableExtractor::find_tables(text, 3, &TableConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, Some(3));
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].rows[0], vec!["Region", "Q1", "Q2"]);
        assert!(tables[0].header.is_none());
    }

    #[test]
    fn test_width_change_splits_blocks() {
        let text = "a  b\nc  d\ne  f  g\nh  i  j\n";
        let tables = PDFTableExtractor::find_tables(text, 1, &TableConfig::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[1].rows[0].len(), 3);
    }

    #[test]
    fn test_invalid_table_config() {
        let mut config = Config::default();
        config.table.min_cols = 200;
        assert!(PDFTableExtractor::from_config(&config).is_err());
    }
}
