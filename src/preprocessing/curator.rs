use crate::preprocessing::BaseComponent;
use crate::types::{Config, CurationReport, Document, PreprocessError};

/// Filters and normalizes extracted content in place.
pub trait Curator: BaseComponent {
    fn curate(&self, document: &mut Document, config: &Config) -> Result<CurationReport, PreprocessError>;
}
