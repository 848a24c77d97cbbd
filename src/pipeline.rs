use std::path::Path;
use std::time::{Duration, Instant};
use chrono::Utc;
use futures::future::try_join_all;
use lazy_static::lazy_static;
use lopdf::Document as PdfDocument;
use regex::Regex;
use tracing::{debug, info, trace, warn};
use crate::namespace::Components;
use crate::preprocessing::{BaseComponent, Curator, Extractor};
use crate::types::{
    Config, CurationReport, Document, DocumentMetadata, PdfConfig, PreprocessError, SourceKind,
    StepRecord, TableConfig,
};

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref REPEATED_CHARS_RE: Regex = Regex::new(r"[|Iil]{3,}").unwrap();
    static ref REPEATED_DOTS_RE: Regex = Regex::new(r"[.:]{3,}").unwrap();
    static ref REPEATED_DASHES_RE: Regex = Regex::new(r"[_-]{2,}").unwrap();
    static ref MULTIPLE_NEWLINES_RE: Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref WORD_LIKE_RE: Regex = Regex::new(r"^[A-Za-z]+$").unwrap();
}

/// Clean and normalize text content
pub fn clean_text(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    // Normalize line endings
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let text = text
        .split('\n')
        .map(|line| line.trim())
        .filter(|line| line.chars().count() > 1)
        .collect::<Vec<_>>()
        .join("\n");

    // Extraction artifacts
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = REPEATED_CHARS_RE.replace_all(&text, "");
    let text = REPEATED_DOTS_RE.replace_all(&text, "...");
    let text = REPEATED_DASHES_RE.replace_all(&text, "--");
    let text = MULTIPLE_NEWLINES_RE.replace_all(&text, "\n\n");

    text.trim().to_string()
}

fn is_plain_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | ';' | ':' | '\'' | '"' | '(' | ')' | '-' | '?' | '!')
}

/// Heuristic check for text that is not worth keeping: too short, too
/// noisy, or not made of word-like tokens.
pub fn is_mostly_garbage(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        trace!("quality filter: rejected - empty text");
        return true;
    }

    let total = text.chars().count();
    if total < 10 {
        trace!("quality filter: rejected - too short (length: {})", total);
        return true;
    }

    let valid_chars = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || is_plain_punctuation(*c))
        .count();
    let valid_char_ratio = valid_chars as f32 / total as f32;
    if valid_char_ratio < 0.8 {
        trace!("quality filter: rejected - low valid char ratio ({:.1}%)", valid_char_ratio * 100.0);
        return true;
    }

    // Runs of five identical characters, excluding x, X and 0
    let has_repeats = text
        .chars()
        .collect::<Vec<_>>()
        .windows(5)
        .any(|w| w[0] != 'x' && w[0] != 'X' && w[0] != '0' && !w[0].is_whitespace() && w.iter().all(|&c| c == w[0]));
    if has_repeats {
        trace!("quality filter: rejected - repeated characters");
        return true;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 3 {
        trace!("quality filter: rejected - too few words (count: {})", words.len());
        return true;
    }

    let long_words = words.iter().filter(|w| w.chars().count() > 20).count();
    let long_ratio = long_words as f32 / words.len() as f32;
    if long_ratio > 0.08 {
        trace!("quality filter: rejected - too many long words ({:.1}%)", long_ratio * 100.0);
        return true;
    }

    let avg_word_length =
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f32 / words.len() as f32;
    if !(2.0..=15.0).contains(&avg_word_length) {
        trace!("quality filter: rejected - unusual avg word length ({:.1})", avg_word_length);
        return true;
    }

    let single_char_words = words.iter().filter(|w| w.chars().count() == 1).count();
    let single_char_ratio = single_char_words as f32 / words.len() as f32;
    if single_char_ratio > 0.3 {
        trace!("quality filter: rejected - too many single-char words ({:.1}%)", single_char_ratio * 100.0);
        return true;
    }

    let word_like_count = words
        .iter()
        .map(|w| w.trim_matches(is_plain_punctuation))
        .filter(|w| w.len() > 1 && WORD_LIKE_RE.is_match(w))
        .count();
    let word_like_ratio = word_like_count as f32 / words.len() as f32;
    if word_like_ratio < 0.4 {
        trace!("quality filter: rejected - too few word-like tokens ({:.1}%)", word_like_ratio * 100.0);
        return true;
    }

    false
}

pub fn is_meaningful_text(text: &str) -> bool {
    !is_mostly_garbage(text)
}

/// Select which 1-based PDF page numbers to read
pub fn select_pages(total_pages: u32, config: &PdfConfig) -> Vec<u32> {
    let mut pages: Vec<u32> = if config.sample_pages && total_pages > 4 {
        // First 2 and last 2 pages
        vec![1, 2, total_pages - 1, total_pages]
    } else {
        (1..=total_pages).collect()
    };
    if let Some(max_pages) = config.max_pages {
        pages.truncate(max_pages as usize);
    }
    pages
}

/// Clamp a table's extent to the configured maximum
pub fn clamp_table_range(rows: usize, cols: usize, config: &TableConfig) -> (usize, usize) {
    (rows.min(config.max_rows), cols.min(config.max_cols))
}

/// Raw text of the selected pages of a PDF
#[derive(Debug, Default)]
pub struct PdfPages {
    pub pages: Vec<(u32, String)>,
    pub errors: Vec<String>,
}

pub fn read_pdf_pages(path: &Path, config: &PdfConfig) -> Result<PdfPages, PreprocessError> {
    let doc = PdfDocument::load(path)
        .map_err(|e| PreprocessError::ExtractionFailed(format!("{}: {}", path.display(), e)))?;
    if doc.is_encrypted() {
        return Err(PreprocessError::ExtractionFailed(format!("{}: document is encrypted", path.display())));
    }

    let total_pages = doc.get_pages().len() as u32;
    let selected = select_pages(total_pages, config);
    debug!("Reading {} of {} pages from {}", selected.len(), total_pages, path.display());

    let mut result = PdfPages::default();
    for page_num in selected {
        match doc.extract_text(&[page_num]) {
            Ok(text) => result.pages.push((page_num, text)),
            Err(e) => {
                warn!("Failed to read page {} of {}: {}", page_num, path.display(), e);
                result.errors.push(format!("page {}: {}", page_num, e));
            }
        }
    }
    Ok(result)
}

pub struct Pipeline {
    config: Config,
    extractors: Vec<Box<dyn Extractor>>,
    curators: Vec<Box<dyn Curator>>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            extractors: Vec::new(),
            curators: Vec::new(),
        }
    }

    /// Pipeline with every loaded component, in load order
    pub fn from_components(config: Config, components: &Components) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.add_extractor(components.pdf_table_extractor);
        pipeline.add_extractor(components.pdf_text_extractor);
        pipeline.add_extractor(components.nq_extractor);
        pipeline.add_curator(components.nq_curator);
        pipeline.add_curator(components.text_curator);
        pipeline.add_curator(components.table_curator);
        pipeline
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn add_extractor<T: Extractor + 'static>(&mut self, extractor: T) {
        self.extractors.push(Box::new(extractor));
    }

    pub fn add_curator<T: Curator + 'static>(&mut self, curator: T) {
        self.curators.push(Box::new(curator));
    }

    pub async fn run(&self, path: &Path) -> Result<Document, PreprocessError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| PreprocessError::UnsupportedFile("No file extension".to_string()))?;
        let kind = SourceKind::from_extension(extension)
            .ok_or_else(|| PreprocessError::UnsupportedFile(extension.to_string()))?;

        let started = Instant::now();
        let mut document = Document::new(path.to_string_lossy(), kind);
        document.metadata = Some(DocumentMetadata {
            started_at: Utc::now().timestamp_millis(),
            original_file_size: std::fs::metadata(path)?.len(),
            ..Default::default()
        });
        info!("Processing {} as {}", path.display(), kind);

        let active: Vec<&dyn Extractor> = self
            .extractors
            .iter()
            .filter(|e| e.accepts().contains(&kind))
            .map(|e| e.as_ref())
            .collect();
        if active.is_empty() {
            return Err(PreprocessError::UnsupportedFile(format!("no extractor registered for {}", kind)));
        }

        // Extractors run concurrently on their own copy, merged in registration order
        let template = document.clone();
        let config = &self.config;
        let runs = active.iter().map(|extractor| {
            let mut partial = template.clone();
            async move {
                let step_started = Instant::now();
                extractor.extract(&mut partial, config).await?;
                Ok::<_, PreprocessError>((partial, step_started.elapsed()))
            }
        });
        let outputs = try_join_all(runs).await?;

        for (extractor, (partial, elapsed)) in active.iter().zip(outputs) {
            debug!(
                "{} produced {} passages, {} tables, {} examples",
                extractor.name(),
                partial.passages.len(),
                partial.tables.len(),
                partial.examples.len()
            );
            document.passages.extend(partial.passages);
            document.tables.extend(partial.tables);
            document.examples.extend(partial.examples);
            if let Some(metadata) = partial.metadata {
                for error in metadata.errors {
                    document.push_error(error);
                }
            }
            record_step(&mut document, extractor.name(), elapsed, None);
        }

        for curator in self.curators.iter().filter(|c| c.accepts().contains(&kind)) {
            let step_started = Instant::now();
            let report = curator.curate(&mut document, &self.config)?;
            debug!("{} kept {} and dropped {}", curator.name(), report.kept, report.dropped);
            record_step(&mut document, curator.name(), step_started.elapsed(), Some(report));
        }

        if let Some(metadata) = &mut document.metadata {
            metadata.completed_at = Utc::now().timestamp_millis();
            metadata.total_duration_ms = started.elapsed().as_millis() as i64;
        }

        Ok(document)
    }
}

fn record_step(document: &mut Document, name: &str, elapsed: Duration, report: Option<CurationReport>) {
    if let Some(metadata) = &mut document.metadata {
        metadata.steps.push(StepRecord {
            name: name.to_string(),
            duration_ms: elapsed.as_millis() as i64,
            kept: report.map(|r| r.kept),
            dropped: report.map(|r| r.dropped),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::namespace::ComponentKind;

    /// Reads nothing but reports an unreadable page, like a damaged PDF would
    struct DamagedPageExtractor;

    impl BaseComponent for DamagedPageExtractor {
        fn name(&self) -> &'static str {
            "damaged_page_extractor"
        }

        fn kind(&self) -> ComponentKind {
            ComponentKind::PDFTextExtractor
        }

        fn accepts(&self) -> Vec<SourceKind> {
            vec![SourceKind::Pdf]
        }
    }

    #[async_trait]
    impl Extractor for DamagedPageExtractor {
        async fn extract(&self, document: &mut Document, _config: &Config) -> Result<(), PreprocessError> {
            document.passages.push(crate::types::Passage {
                page: Some(1),
                text: "Readable first page".to_string(),
            });
            document.push_error("page 2: invalid content stream");
            Ok(())
        }
    }

    #[test]
    fn test_clean_text_normalizes_artifacts() {
        let input = "  Title  \r\n\r\n\r\nSome   text.......here\n-----\nx\n";
        let cleaned = clean_text(input);
        assert_eq!(cleaned, "Title\nSome text...here\n--");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text("   \n\t "), "");
    }

    #[test]
    fn test_garbage_detection() {
        assert!(is_mostly_garbage(""));
        assert!(is_mostly_garbage("short"));
        assert!(is_mostly_garbage("@@#$%^&*()!~`<>{}[]"));
        assert!(is_mostly_garbage("aaaaaaa bbbbbbb ccccccc"));
        assert!(!is_mostly_garbage("The quick brown fox jumps over the lazy dog."));
        assert!(is_meaningful_text("Natural language text with several ordinary words."));
    }

    #[test]
    fn test_select_pages() {
        let all = PdfConfig::default();
        assert_eq!(select_pages(3, &all), vec![1, 2, 3]);
        assert_eq!(select_pages(0, &all), Vec::<u32>::new());

        let sampled = PdfConfig { sample_pages: true, max_pages: None };
        assert_eq!(select_pages(4, &sampled), vec![1, 2, 3, 4]);
        assert_eq!(select_pages(10, &sampled), vec![1, 2, 9, 10]);

        let capped = PdfConfig { sample_pages: false, max_pages: Some(2) };
        assert_eq!(select_pages(10, &capped), vec![1, 2]);
    }

    #[test]
    fn test_clamp_table_range() {
        let config = TableConfig { max_rows: 5, max_cols: 3, ..Default::default() };
        assert_eq!(clamp_table_range(10, 2, &config), (5, 2));
        assert_eq!(clamp_table_range(4, 8, &config), (4, 3));
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_extension() {
        let pipeline = Pipeline::new(Config::default());
        let result = pipeline.run(Path::new("notes.docx")).await;
        assert!(matches!(result, Err(PreprocessError::UnsupportedFile(_))));
    }

    #[tokio::test]
    async fn test_run_without_extractors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jsonl");
        std::fs::write(&path, "").unwrap();

        let pipeline = Pipeline::new(Config::default());
        let result = pipeline.run(&path).await;
        assert!(matches!(result, Err(PreprocessError::UnsupportedFile(_))));
    }

    #[tokio::test]
    async fn test_page_errors_reach_merged_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("damaged.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        let mut pipeline = Pipeline::new(Config::default());
        pipeline.add_extractor(DamagedPageExtractor);
        let document = pipeline.run(&path).await.unwrap();

        assert_eq!(document.passages.len(), 1);
        let metadata = document.metadata.expect("Should have metadata");
        assert_eq!(metadata.errors, vec!["page 2: invalid content stream".to_string()]);
        assert_eq!(metadata.steps[0].name, "damaged_page_extractor");
    }
}
