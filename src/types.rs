use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub threads: usize,
    pub pdf: PdfConfig,
    pub text: TextConfig,
    pub table: TableConfig,
    pub nq: NqConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            pdf: PdfConfig::default(),
            text: TextConfig::default(),
            table: TableConfig::default(),
            nq: NqConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Only read the first `max_pages` pages
    pub max_pages: Option<u32>,
    /// Read the first two and last two pages of long documents
    pub sample_pages: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            sample_pages: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub min_chars: usize,
    pub max_chars: usize,
    pub quality_filter: bool,
    pub dedupe: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            min_chars: 20,
            max_chars: 20_000,
            quality_filter: true,
            dedupe: true,
        }
    }
}

impl TextConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chars == 0 {
            return Err("text.max_chars must be at least 1".to_string());
        }
        if self.min_chars > self.max_chars {
            return Err(format!("text.min_chars ({}) exceeds text.max_chars ({})", self.min_chars, self.max_chars));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub min_rows: usize,
    pub min_cols: usize,
    pub max_rows: usize,
    pub max_cols: usize,
    pub infer_header: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_cols: 2,
            max_rows: 1000,
            max_cols: 100,
            infer_header: true,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_rows == 0 || self.min_cols == 0 {
            return Err("table.min_rows and table.min_cols must be at least 1".to_string());
        }
        if self.min_rows > self.max_rows {
            return Err(format!("table.min_rows ({}) exceeds table.max_rows ({})", self.min_rows, self.max_rows));
        }
        if self.min_cols > self.max_cols {
            return Err(format!("table.min_cols ({}) exceeds table.max_cols ({})", self.min_cols, self.max_cols));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NqConfig {
    pub max_examples: Option<usize>,
    pub extract_candidates: bool,
    pub require_long_answer: bool,
    pub max_long_answer_tokens: usize,
}

impl Default for NqConfig {
    fn default() -> Self {
        Self {
            max_examples: None,
            extract_candidates: true,
            require_long_answer: true,
            max_long_answer_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pdf,
    NaturalQuestions,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::NaturalQuestions => write!(f, "natural_questions"),
        }
    }
}

impl SourceKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "jsonl" | "json" => Some(SourceKind::NaturalQuestions),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("Failed to extract content: {0}")]
    ExtractionFailed(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid configuration for {component}: {reason}")]
    InvalidConfig {
        component: &'static str,
        reason: String,
    },
    #[error("Module unavailable: {module}")]
    ModuleUnavailable {
        module: &'static str,
        #[source]
        source: Box<PreprocessError>,
    },
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passage {
    pub page: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    pub page: Option<u32>,
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Widest row, header included
    pub fn width(&self) -> usize {
        let header = self.header.as_ref().map(|h| h.len()).unwrap_or(0);
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0).max(header)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YesNoAnswer {
    Yes,
    No,
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NqExample {
    pub example_id: String,
    pub question: String,
    pub document_url: String,
    pub document_title: Option<String>,
    pub long_answer: Option<String>,
    pub short_answers: Vec<String>,
    pub yes_no_answer: YesNoAnswer,
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub source: String,
    pub kind: SourceKind,
    pub passages: Vec<Passage>,
    pub tables: Vec<Table>,
    pub examples: Vec<NqExample>,
    pub metadata: Option<DocumentMetadata>,
}

impl Document {
    pub fn new(source: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            kind,
            passages: Vec::new(),
            tables: Vec::new(),
            examples: Vec::new(),
            metadata: None,
        }
    }

    /// Records a non-fatal problem if the document carries metadata
    pub fn push_error(&mut self, error: impl Into<String>) {
        if let Some(metadata) = &mut self.metadata {
            metadata.errors.push(error.into());
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentMetadata {
    pub started_at: i64,
    pub completed_at: i64,
    pub total_duration_ms: i64,
    pub original_file_size: u64,
    pub errors: Vec<String>,
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub duration_ms: i64,
    pub kept: Option<usize>,
    pub dropped: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CurationReport {
    pub kept: usize,
    pub dropped: usize,
}

impl CurationReport {
    pub fn new(before: usize, after: usize) -> Self {
        Self {
            kept: after,
            dropped: before.saturating_sub(after),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_from_extension() {
        assert_eq!(SourceKind::from_extension("PDF"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_extension("jsonl"), Some(SourceKind::NaturalQuestions));
        assert_eq!(SourceKind::from_extension("docx"), None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[table]\nmin_rows = 3\n").unwrap();
        assert_eq!(config.table.min_rows, 3);
        assert_eq!(config.table.max_cols, 100);
        assert_eq!(config.text.min_chars, 20);
        assert!(config.nq.require_long_answer);
    }

    #[test]
    fn test_table_width_counts_header() {
        let table = Table {
            page: None,
            header: Some(vec!["a".into(), "b".into(), "c".into()]),
            rows: vec![vec!["1".into()]],
        };
        assert_eq!(table.width(), 3);
    }

    #[test]
    fn test_module_unavailable_keeps_source() {
        let err = PreprocessError::ModuleUnavailable {
            module: "table_curator",
            source: Box::new(PreprocessError::InvalidFormat("bad".to_string())),
        };
        assert_eq!(err.to_string(), "Module unavailable: table_curator");
        assert!(std::error::Error::source(&err).is_some());
    }
}
