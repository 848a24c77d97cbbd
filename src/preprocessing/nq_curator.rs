use std::collections::HashSet;
use tracing::{debug, trace};
use crate::namespace::ComponentKind;
use crate::preprocessing::{BaseComponent, Curator};
use crate::types::{Config, CurationReport, Document, NqExample, NqConfig, PreprocessError, SourceKind};

/// Keeps answerable, reasonably sized, unique NQ examples.
#[derive(Debug, Clone, Copy, Default)]
pub struct NQCurator;

impl NQCurator {
    pub fn from_config(config: &Config) -> Result<Self, PreprocessError> {
        if config.nq.max_long_answer_tokens == 0 {
            return Err(PreprocessError::InvalidConfig {
                component: "nq_curator",
                reason: "nq.max_long_answer_tokens must be at least 1".to_string(),
            });
        }
        Ok(Self)
    }

    fn keep(example: &mut NqExample, config: &NqConfig) -> bool {
        example.question = example.question.split_whitespace().collect::<Vec<_>>().join(" ");
        if example.question.is_empty() {
            trace!("Dropping {}: empty question", example.example_id);
            return false;
        }
        match &example.long_answer {
            None if config.require_long_answer => {
                trace!("Dropping {}: no long answer", example.example_id);
                false
            }
            Some(answer) if answer.split_whitespace().count() > config.max_long_answer_tokens => {
                trace!("Dropping {}: long answer too long", example.example_id);
                false
            }
            _ => true,
        }
    }
}

impl Curator for NQCurator {
    fn curate(&self, document: &mut Document, config: &Config) -> Result<CurationReport, PreprocessError> {
        let before = document.examples.len();
        let mut seen = HashSet::new();

        document.examples.retain_mut(|example| {
            Self::keep(example, &config.nq) && seen.insert(example.example_id.clone())
        });

        let report = CurationReport::new(before, document.examples.len());
        debug!("NQ curation kept {} of {} examples", report.kept, before);
        Ok(report)
    }
}

impl BaseComponent for NQCurator {
    fn name(&self) -> &'static str {
        "nq_curator"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::NQCurator
    }

    fn accepts(&self) -> Vec<SourceKind> {
        vec![SourceKind::NaturalQuestions]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::YesNoAnswer;

    fn example(id: &str, question: &str, long_answer: Option<&str>) -> NqExample {
        NqExample {
            example_id: id.to_string(),
            question: question.to_string(),
            document_url: String::new(),
            document_title: None,
            long_answer: long_answer.map(str::to_string),
            short_answers: Vec::new(),
            yes_no_answer: YesNoAnswer::None,
        }
    }

    #[test]
    fn test_curate_examples() {
        let mut document = Document::new("nq.jsonl", SourceKind::NaturalQuestions);
        document.examples = vec![
            example("1", "  when   was the bridge built ", Some("The bridge opened in 1932 .")),
            example("2", "   ", Some("An answer without a question .")),
            example("3", "who painted the ceiling", None),
            example("1", "when was the bridge built", Some("The bridge opened in 1932 .")),
            example("4", "how long is the river", Some("one two three four five six seven")),
        ];
        let mut config = Config::default();
        config.nq.max_long_answer_tokens = 6;

        let report = NQCurator.curate(&mut document, &config).unwrap();

        assert_eq!(report, CurationReport { kept: 1, dropped: 4 });
        assert_eq!(document.examples[0].question, "when was the bridge built");
    }

    #[test]
    fn test_unanswered_examples_kept_when_allowed() {
        let mut document = Document::new("nq.jsonl", SourceKind::NaturalQuestions);
        document.examples = vec![example("9", "is the sky blue", None)];
        let mut config = Config::default();
        config.nq.require_long_answer = false;

        let report = NQCurator.curate(&mut document, &config).unwrap();
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn test_zero_token_limit_is_invalid() {
        let mut config = Config::default();
        config.nq.max_long_answer_tokens = 0;
        assert!(NQCurator::from_config(&config).is_err());
    }
}
