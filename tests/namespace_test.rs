use std::collections::HashSet;
use std::thread;
use preprocessing_rs::namespace::{loaded, namespace, ComponentKind, Components, EXPORTED_NAMES};
use preprocessing_rs::preprocessing::{
    BaseComponent, Curator, Extractor, NQCurator, NQExtractor, PDFTableExtractor, PDFTextExtractor,
    TableCurator, TextCurator,
};
use preprocessing_rs::{Config, PreprocessError};

fn assert_extractor<T: Extractor>(_: &T) {}
fn assert_curator<T: Curator>(_: &T) {}

#[test]
fn test_exported_names_resolve_to_components() {
    let components: Vec<&dyn BaseComponent> = vec![
        &PDFTableExtractor as &dyn BaseComponent,
        &PDFTextExtractor as &dyn BaseComponent,
        &NQExtractor as &dyn BaseComponent,
        &NQCurator as &dyn BaseComponent,
        &TextCurator as &dyn BaseComponent,
        &TableCurator as &dyn BaseComponent,
    ];
    for component in components {
        assert!(EXPORTED_NAMES.contains(&component.kind().name()));
    }

    assert_extractor(&PDFTableExtractor);
    assert_extractor(&PDFTextExtractor);
    assert_extractor(&NQExtractor);
    assert_curator(&NQCurator);
    assert_curator(&TextCurator);
    assert_curator(&TableCurator);

    let expected: HashSet<&str> = [
        "BaseComponent",
        "PDFTableExtractor",
        "PDFTextExtractor",
        "Extractor",
        "NQExtractor",
        "NQCurator",
        "Curator",
        "TextCurator",
        "TableCurator",
    ]
    .into_iter()
    .collect();
    let exported: HashSet<&str> = EXPORTED_NAMES.into_iter().collect();
    assert_eq!(exported, expected);
    assert_eq!(ComponentKind::ALL.len(), EXPORTED_NAMES.len());
}

// The process-wide namespace can only be loaded once per test binary, so the
// whole lifecycle is checked in a single test.
#[test]
fn test_namespace_lifecycle() {
    assert!(loaded().is_none());

    let mut broken = Config::default();
    broken.table.max_rows = 0;

    let err = namespace(&broken).unwrap_err();
    assert!(matches!(err, PreprocessError::ModuleUnavailable { module: "pdf_table_extractor", .. }));
    assert!(loaded().is_none(), "Failed load must not expose any component");
    assert!(Components::load(&broken).is_err());

    let first = namespace(&Config::default()).unwrap();
    assert_eq!(first.names().collect::<Vec<_>>(), EXPORTED_NAMES);

    // Already loaded, so the broken config is never looked at
    let second = namespace(&broken).unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(std::ptr::eq(loaded().unwrap(), first));

    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(|| namespace(&Config::default()).unwrap() as *const Components as usize))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), first as *const Components as usize);
    }
}
