pub mod types;
pub mod pipeline;
pub mod namespace;
pub mod preprocessing;

// Re-export commonly used types
pub use types::{Config, Document, PreprocessError, SourceKind};
pub use pipeline::Pipeline;
pub use namespace::{namespace, Components, ComponentKind, EXPORTED_NAMES};
pub use preprocessing::*;
