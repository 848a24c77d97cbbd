use async_trait::async_trait;
use crate::preprocessing::BaseComponent;
use crate::types::{Config, Document, PreprocessError};

/// Reads `document.source` and appends what it finds to the document.
#[async_trait]
pub trait Extractor: BaseComponent {
    async fn extract(&self, document: &mut Document, config: &Config) -> Result<(), PreprocessError>;
}
