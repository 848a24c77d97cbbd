use crate::namespace::ComponentKind;
use crate::types::SourceKind;

/// Common surface of every preprocessing component.
pub trait BaseComponent: Send + Sync {
    /// Snake-case name used in logs and step records
    fn name(&self) -> &'static str;

    fn kind(&self) -> ComponentKind;

    /// Source kinds this component runs for
    fn accepts(&self) -> Vec<SourceKind>;
}
