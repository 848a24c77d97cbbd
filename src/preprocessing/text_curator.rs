use std::collections::HashSet;
use rayon::prelude::*;
use tracing::{debug, trace};
use crate::namespace::ComponentKind;
use crate::pipeline::{clean_text, is_meaningful_text};
use crate::preprocessing::{BaseComponent, Curator};
use crate::types::{Config, CurationReport, Document, Passage, PreprocessError, SourceKind, TextConfig};

/// Normalizes passages and drops short, noisy or repeated ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCurator;

impl TextCurator {
    pub fn from_config(config: &Config) -> Result<Self, PreprocessError> {
        config.text.validate().map_err(|reason| PreprocessError::InvalidConfig {
            component: "text_curator",
            reason,
        })?;
        Ok(Self)
    }

    fn curate_passage(passage: &Passage, config: &TextConfig) -> Option<Passage> {
        let mut text = clean_text(&passage.text);
        if text.chars().count() < config.min_chars {
            trace!("Dropping short passage ({} chars)", text.chars().count());
            return None;
        }
        if let Some((cut, _)) = text.char_indices().nth(config.max_chars) {
            text.truncate(cut);
        }
        if config.quality_filter && !is_meaningful_text(&text) {
            return None;
        }
        Some(Passage {
            page: passage.page,
            text,
        })
    }
}

impl Curator for TextCurator {
    fn curate(&self, document: &mut Document, config: &Config) -> Result<CurationReport, PreprocessError> {
        let before = document.passages.len();

        let curated: Vec<Passage> = document
            .passages
            .par_iter()
            .filter_map(|passage| Self::curate_passage(passage, &config.text))
            .collect();

        let curated = if config.text.dedupe {
            let mut seen = HashSet::new();
            curated
                .into_iter()
                .filter(|passage| seen.insert(passage.text.clone()))
                .collect()
        } else {
            curated
        };

        document.passages = curated;
        let report = CurationReport::new(before, document.passages.len());
        debug!("Text curation kept {} of {} passages", report.kept, before);
        Ok(report)
    }
}

impl BaseComponent for TextCurator {
    fn name(&self) -> &'static str {
        "text_curator"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::TextCurator
    }

    fn accepts(&self) -> Vec<SourceKind> {
        vec![SourceKind::Pdf, SourceKind::NaturalQuestions]
    }
}
