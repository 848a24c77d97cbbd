//! Runtime view of the `preprocessing` namespace.
//!
//! Components are loaded in a fixed order from configuration. Loading is
//! all-or-nothing and the process-wide namespace is initialized at most once.

use std::fmt;
use std::sync::OnceLock;
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::preprocessing::{
    Curator, Extractor, NQCurator, NQExtractor, PDFTableExtractor, PDFTextExtractor, TableCurator,
    TextCurator,
};
use crate::types::{Config, PreprocessError};

/// Names exported by [`crate::preprocessing`], in load order.
pub const EXPORTED_NAMES: [&str; 9] = [
    "BaseComponent",
    "PDFTableExtractor",
    "PDFTextExtractor",
    "Extractor",
    "NQExtractor",
    "NQCurator",
    "Curator",
    "TextCurator",
    "TableCurator",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComponentKind {
    BaseComponent,
    PDFTableExtractor,
    PDFTextExtractor,
    Extractor,
    NQExtractor,
    NQCurator,
    Curator,
    TextCurator,
    TableCurator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Abstract,
    Extractor,
    Curator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Abstract => write!(f, "abstract"),
            Role::Extractor => write!(f, "extractor"),
            Role::Curator => write!(f, "curator"),
        }
    }
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 9] = [
        ComponentKind::BaseComponent,
        ComponentKind::PDFTableExtractor,
        ComponentKind::PDFTextExtractor,
        ComponentKind::Extractor,
        ComponentKind::NQExtractor,
        ComponentKind::NQCurator,
        ComponentKind::Curator,
        ComponentKind::TextCurator,
        ComponentKind::TableCurator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::BaseComponent => "BaseComponent",
            ComponentKind::PDFTableExtractor => "PDFTableExtractor",
            ComponentKind::PDFTextExtractor => "PDFTextExtractor",
            ComponentKind::Extractor => "Extractor",
            ComponentKind::NQExtractor => "NQExtractor",
            ComponentKind::NQCurator => "NQCurator",
            ComponentKind::Curator => "Curator",
            ComponentKind::TextCurator => "TextCurator",
            ComponentKind::TableCurator => "TableCurator",
        }
    }

    /// Sibling module defining the component
    pub fn module(&self) -> &'static str {
        match self {
            ComponentKind::BaseComponent => "base_component",
            ComponentKind::PDFTableExtractor => "pdf_table_extractor",
            ComponentKind::PDFTextExtractor => "pdf_text_extractor",
            ComponentKind::Extractor => "extractor",
            ComponentKind::NQExtractor => "nq_extractor",
            ComponentKind::NQCurator => "nq_curator",
            ComponentKind::Curator => "curator",
            ComponentKind::TextCurator => "text_curator",
            ComponentKind::TableCurator => "table_curator",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ComponentKind::BaseComponent | ComponentKind::Extractor | ComponentKind::Curator => Role::Abstract,
            ComponentKind::PDFTableExtractor | ComponentKind::PDFTextExtractor | ComponentKind::NQExtractor => {
                Role::Extractor
            }
            ComponentKind::NQCurator | ComponentKind::TextCurator | ComponentKind::TableCurator => Role::Curator,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every concrete component, built and validated against one configuration.
#[derive(Debug, Clone)]
pub struct Components {
    pub pdf_table_extractor: PDFTableExtractor,
    pub pdf_text_extractor: PDFTextExtractor,
    pub nq_extractor: NQExtractor,
    pub nq_curator: NQCurator,
    pub text_curator: TextCurator,
    pub table_curator: TableCurator,
}

/// Loads one component, tagging any failure with its module.
fn load_step<T>(
    kind: ComponentKind,
    build: impl FnOnce() -> Result<T, PreprocessError>,
) -> Result<T, PreprocessError> {
    let component = build().map_err(|source| {
        warn!("Failed to load {}: {}", kind, source);
        PreprocessError::ModuleUnavailable {
            module: kind.module(),
            source: Box::new(source),
        }
    })?;
    debug!("Loaded {} from {}", kind, kind.module());
    Ok(component)
}

impl Components {
    /// Builds every component in [`ComponentKind::ALL`] order, failing on
    /// the first error.
    pub fn load(config: &Config) -> Result<Self, PreprocessError> {
        load_step(ComponentKind::BaseComponent, || Ok(()))?;
        let pdf_table_extractor = load_step(ComponentKind::PDFTableExtractor, || PDFTableExtractor::from_config(config))?;
        let pdf_text_extractor = load_step(ComponentKind::PDFTextExtractor, || PDFTextExtractor::from_config(config))?;
        load_step(ComponentKind::Extractor, || Ok(()))?;
        let nq_extractor = load_step(ComponentKind::NQExtractor, || NQExtractor::from_config(config))?;
        let nq_curator = load_step(ComponentKind::NQCurator, || NQCurator::from_config(config))?;
        load_step(ComponentKind::Curator, || Ok(()))?;
        let text_curator = load_step(ComponentKind::TextCurator, || TextCurator::from_config(config))?;
        let table_curator = load_step(ComponentKind::TableCurator, || TableCurator::from_config(config))?;

        Ok(Self {
            pdf_table_extractor,
            pdf_text_extractor,
            nq_extractor,
            nq_curator,
            text_curator,
            table_curator,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        ComponentKind::ALL.into_iter().map(|kind| kind.name())
    }

    pub fn extractors(&self) -> Vec<&dyn Extractor> {
        vec![
            &self.pdf_table_extractor as &dyn Extractor,
            &self.pdf_text_extractor as &dyn Extractor,
            &self.nq_extractor as &dyn Extractor,
        ]
    }

    pub fn curators(&self) -> Vec<&dyn Curator> {
        vec![
            &self.nq_curator as &dyn Curator,
            &self.text_curator as &dyn Curator,
            &self.table_curator as &dyn Curator,
        ]
    }
}

static NAMESPACE: OnceLock<Components> = OnceLock::new();

/// Loads the process-wide namespace on first success and returns it.
///
/// Later calls return the same instance and ignore `config`. A failed load
/// leaves the namespace unloaded.
pub fn namespace(config: &Config) -> Result<&'static Components, PreprocessError> {
    if let Some(components) = NAMESPACE.get() {
        return Ok(components);
    }
    let components = Components::load(config)?;
    Ok(NAMESPACE.get_or_init(|| {
        info!("Preprocessing namespace loaded ({} names)", EXPORTED_NAMES.len());
        components
    }))
}

/// The process-wide namespace, if it has been loaded.
pub fn loaded() -> Option<&'static Components> {
    NAMESPACE.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::preprocessing::BaseComponent;

    #[test]
    fn test_kinds_match_exported_names() {
        let names: Vec<&str> = ComponentKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, EXPORTED_NAMES);
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn test_roles() {
        let abstract_kinds: Vec<ComponentKind> = ComponentKind::ALL
            .into_iter()
            .filter(|k| k.role() == Role::Abstract)
            .collect();
        assert_eq!(
            abstract_kinds,
            vec![ComponentKind::BaseComponent, ComponentKind::Extractor, ComponentKind::Curator]
        );
        assert_eq!(ComponentKind::TableCurator.module(), "table_curator");
    }

    #[test]
    fn test_load_exposes_all_names() {
        let components = Components::load(&Config::default()).unwrap();
        assert_eq!(components.names().collect::<Vec<_>>(), EXPORTED_NAMES);

        let extractor_kinds: Vec<ComponentKind> = components.extractors().iter().map(|e| e.kind()).collect();
        assert_eq!(
            extractor_kinds,
            vec![ComponentKind::PDFTableExtractor, ComponentKind::PDFTextExtractor, ComponentKind::NQExtractor]
        );
        assert!(components.curators().iter().all(|c| c.kind().role() == Role::Curator));
    }

    #[test]
    fn test_load_is_all_or_nothing() {
        let mut config = Config::default();
        config.text.max_chars = 0;

        match Components::load(&config) {
            Err(PreprocessError::ModuleUnavailable { module, source }) => {
                assert_eq!(module, "text_curator");
                assert!(matches!(*source, PreprocessError::InvalidConfig { component: "text_curator", .. }));
            }
            other => panic!("expected module failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_first_failure_in_load_order_wins() {
        let mut config = Config::default();
        config.table.min_rows = 0;
        config.nq.max_long_answer_tokens = 0;

        let err = Components::load(&config).unwrap_err();
        assert!(matches!(err, PreprocessError::ModuleUnavailable { module: "pdf_table_extractor", .. }));
    }
}
