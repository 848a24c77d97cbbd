use std::path::Path;
use async_trait::async_trait;
use tracing::{debug, trace};
use crate::namespace::ComponentKind;
use crate::pipeline::{clean_text, read_pdf_pages};
use crate::preprocessing::{BaseComponent, Extractor};
use crate::types::{Config, Document, Passage, PreprocessError, SourceKind};

/// One passage per non-empty PDF page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PDFTextExtractor;

impl PDFTextExtractor {
    pub fn from_config(config: &Config) -> Result<Self, PreprocessError> {
        if config.pdf.max_pages == Some(0) {
            return Err(PreprocessError::InvalidConfig {
                component: "pdf_text_extractor",
                reason: "pdf.max_pages must be at least 1".to_string(),
            });
        }
        Ok(Self)
    }
}

#[async_trait]
impl Extractor for PDFTextExtractor {
    async fn extract(&self, document: &mut Document, config: &Config) -> Result<(), PreprocessError> {
        debug!("Starting PDF text extraction for file: {}", document.source);
        let pages = read_pdf_pages(Path::new(&document.source), &config.pdf)?;

        for (page_num, raw) in pages.pages {
            let text = clean_text(&raw);
            if text.is_empty() {
                trace!("Page {} has no text", page_num);
                continue;
            }
            document.passages.push(Passage {
                page: Some(page_num),
                text,
            });
        }
        for error in pages.errors {
            document.push_error(format!("{}: {}", self.name(), error));
        }

        trace!("Extracted {} passages", document.passages.len());
        Ok(())
    }
}

impl BaseComponent for PDFTextExtractor {
    fn name(&self) -> &'static str {
        "pdf_text_extractor"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::PDFTextExtractor
    }

    fn accepts(&self) -> Vec<SourceKind> {
        vec![SourceKind::Pdf]
    }
}
