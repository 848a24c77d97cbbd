//! Preprocessing components.

mod base_component;
mod pdf_table_extractor;
mod pdf_text_extractor;
mod extractor;
mod nq_extractor;
mod nq_curator;
mod curator;
mod text_curator;
mod table_curator;

pub use base_component::BaseComponent;
pub use pdf_table_extractor::PDFTableExtractor;
pub use pdf_text_extractor::PDFTextExtractor;
pub use extractor::Extractor;
pub use nq_extractor::NQExtractor;
pub use nq_curator::NQCurator;
pub use curator::Curator;
pub use text_curator::TextCurator;
pub use table_curator::TableCurator;
