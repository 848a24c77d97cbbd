use std::fs::File;
use std::io::{BufRead, BufReader};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, trace};
use crate::namespace::ComponentKind;
use crate::preprocessing::{BaseComponent, Extractor};
use crate::types::{
    Config, Document, NqExample, Passage, PreprocessError, SourceKind, Table, YesNoAnswer,
};

lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"^</?[A-Za-z][^>]*>$").unwrap();
}

#[derive(Debug, Deserialize)]
struct RawExample {
    example_id: serde_json::Value,
    question_text: String,
    #[serde(default)]
    document_text: Option<String>,
    #[serde(default)]
    document_tokens: Vec<RawToken>,
    #[serde(default)]
    document_url: String,
    #[serde(default)]
    document_title: Option<String>,
    #[serde(default)]
    long_answer_candidates: Vec<RawSpan>,
    #[serde(default)]
    annotations: Vec<RawAnnotation>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    start_token: i64,
    end_token: i64,
    #[serde(default)]
    top_level: bool,
}

#[derive(Debug, Deserialize)]
struct RawLongAnswer {
    start_token: i64,
    end_token: i64,
    #[serde(default = "no_candidate")]
    candidate_index: i64,
}

fn no_candidate() -> i64 {
    -1
}

impl Default for RawLongAnswer {
    fn default() -> Self {
        Self {
            start_token: -1,
            end_token: -1,
            candidate_index: -1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAnnotation {
    #[serde(default)]
    long_answer: RawLongAnswer,
    #[serde(default)]
    short_answers: Vec<RawSpan>,
    #[serde(default)]
    yes_no_answer: YesNoAnswer,
}

/// Natural Questions JSONL reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct NQExtractor;

impl NQExtractor {
    pub fn from_config(config: &Config) -> Result<Self, PreprocessError> {
        if config.nq.max_examples == Some(0) {
            return Err(PreprocessError::InvalidConfig {
                component: "nq_extractor",
                reason: "nq.max_examples must be at least 1".to_string(),
            });
        }
        Ok(Self)
    }

    fn is_html_tag(token: &str) -> bool {
        HTML_TAG_RE.is_match(token)
    }

    /// Token range checked against the document; negative bounds mean absent
    fn span<'a>(
        tokens: &'a [&'a str],
        start: i64,
        end: i64,
        line: usize,
    ) -> Result<Option<&'a [&'a str]>, PreprocessError> {
        if start < 0 || end < 0 {
            return Ok(None);
        }
        let (start, end) = (start as usize, end as usize);
        if start > end || end > tokens.len() {
            return Err(PreprocessError::InvalidFormat(format!(
                "line {}: span {}..{} outside document of {} tokens",
                line,
                start,
                end,
                tokens.len()
            )));
        }
        Ok(Some(&tokens[start..end]))
    }

    fn plain_text(tokens: &[&str]) -> Option<String> {
        let text = tokens
            .iter()
            .filter(|t| !Self::is_html_tag(t))
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn parse_table(tokens: &[&str]) -> Table {
        let mut header = None;
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut row: Option<(Vec<String>, bool)> = None;
        let mut cell: Option<Vec<&str>> = None;

        for &token in tokens {
            let tag = token.to_ascii_lowercase();
            match tag.as_str() {
                "<tr>" => row = Some((Vec::new(), true)),
                "</tr>" => {
                    if let Some((cells, all_th)) = row.take() {
                        if cells.is_empty() {
                            continue;
                        }
                        if all_th && header.is_none() && rows.is_empty() {
                            header = Some(cells);
                        } else {
                            rows.push(cells);
                        }
                    }
                }
                "<td>" | "<th>" => {
                    if let Some((_, all_th)) = &mut row {
                        *all_th &= tag == "<th>";
                    }
                    cell = Some(Vec::new());
                }
                "</td>" | "</th>" => {
                    if let (Some(words), Some((cells, _))) = (cell.take(), &mut row) {
                        cells.push(words.join(" "));
                    }
                }
                _ if Self::is_html_tag(token) => {}
                _ => {
                    if let Some(words) = &mut cell {
                        words.push(token);
                    }
                }
            }
        }

        Table {
            page: None,
            header,
            rows,
        }
    }

    fn parse_example(raw: RawExample, line: usize, config: &Config, document: &mut Document) -> Result<NqExample, PreprocessError> {
        let text = match raw.document_text {
            Some(text) => text,
            None => raw
                .document_tokens
                .iter()
                .map(|t| t.token.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        };
        let tokens: Vec<&str> = text.split_whitespace().collect();

        let annotation = raw
            .annotations
            .iter()
            .find(|a| a.long_answer.candidate_index >= 0)
            .or_else(|| raw.annotations.first());

        let mut long_answer = None;
        let mut short_answers = Vec::new();
        let mut yes_no_answer = YesNoAnswer::None;
        if let Some(annotation) = annotation {
            let la = &annotation.long_answer;
            if la.candidate_index >= 0 {
                long_answer = Self::span(&tokens, la.start_token, la.end_token, line)?
                    .and_then(Self::plain_text);
            }
            for short in &annotation.short_answers {
                if let Some(answer) = Self::span(&tokens, short.start_token, short.end_token, line)?
                    .and_then(Self::plain_text)
                {
                    short_answers.push(answer);
                }
            }
            yes_no_answer = annotation.yes_no_answer;
        }

        if config.nq.extract_candidates {
            for candidate in raw.long_answer_candidates.iter().filter(|c| c.top_level) {
                let Some(span) = Self::span(&tokens, candidate.start_token, candidate.end_token, line)? else {
                    continue;
                };
                match span.first().map(|t| t.to_ascii_lowercase()).as_deref() {
                    Some("<p>") => {
                        if let Some(text) = Self::plain_text(span) {
                            document.passages.push(Passage { page: None, text });
                        }
                    }
                    Some("<table>") => document.tables.push(Self::parse_table(span)),
                    _ => {}
                }
            }
        }

        let example_id = match raw.example_id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        };

        Ok(NqExample {
            example_id,
            question: raw.question_text,
            document_url: raw.document_url,
            document_title: raw.document_title,
            long_answer,
            short_answers,
            yes_no_answer,
        })
    }
}

#[async_trait]
impl Extractor for NQExtractor {
    async fn extract(&self, document: &mut Document, config: &Config) -> Result<(), PreprocessError> {
        debug!("Starting NQ extraction for file: {}", document.source);
        let file = File::open(&document.source)
            .map_err(|e| PreprocessError::ExtractionFailed(format!("{}: {}", document.source, e)))?;

        for (index, line) in BufReader::new(file).lines().enumerate() {
            if config.nq.max_examples.is_some_and(|max| document.examples.len() >= max) {
                debug!("Reached nq.max_examples, stopping");
                break;
            }
            let line_number = index + 1;
            let line = line
                .map_err(|e| PreprocessError::InvalidFormat(format!("line {}: {}", line_number, e)))?;
            if line.trim().is_empty() {
                continue;
            }
            let raw: RawExample = serde_json::from_str(&line)
                .map_err(|e| PreprocessError::InvalidFormat(format!("line {}: {}", line_number, e)))?;
            let example = Self::parse_example(raw, line_number, config, document)?;
            trace!("Parsed example {}", example.example_id);
            document.examples.push(example);
        }

        debug!(
            "Extracted {} examples, {} passages, {} tables",
            document.examples.len(),
            document.passages.len(),
            document.tables.len()
        );
        Ok(())
    }
}

impl BaseComponent for NQExtractor {
    fn name(&self) -> &'static str {
        "nq_extractor"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::NQExtractor
    }

    fn accepts(&self) -> Vec<SourceKind> {
        vec![SourceKind::NaturalQuestions]
    }
}
