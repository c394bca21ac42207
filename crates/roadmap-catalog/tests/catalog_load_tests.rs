use roadmap_catalog::{Catalog, CatalogError, Priority, Status};
use std::io::Write;

const DOC: &str = r#"
[[phases]]
id = "one"
title = "Phase one"

[[phases.tasks]]
id = "a"
title = "First"
status = "active"
priority = "critical"

[[phases.tasks]]
id = "b"
title = "Optional"
optional = true
optional_reason = "only sometimes"

[[phases.tasks]]
id = "c"
title = "Second"

[[phases]]
id = "two"
title = "Phase two"

[[phases.tasks]]
id = "d"
title = "Third"
"#;

#[test]
fn parses_toml_document() {
    let catalog = Catalog::from_toml_str(DOC).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.task_count(), 4);

    let a = catalog.task(&"a".into()).unwrap();
    assert_eq!(a.default_status, Status::Active);
    assert_eq!(a.priority, Some(Priority::Critical));

    let c = catalog.task(&"c".into()).unwrap();
    assert_eq!(c.default_status, Status::Blocked);
    assert!(c.mandatory());

    let b = catalog.task(&"b".into()).unwrap();
    assert!(b.optional);
    assert_eq!(b.optional_reason.as_deref(), Some("only sometimes"));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DOC.as_bytes()).unwrap();

    let catalog = Catalog::load(file.path()).unwrap();
    assert_eq!(catalog.phase_index(&"two".into()), Some(1));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Catalog::load(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, CatalogError::Io(_)));
}

#[test]
fn malformed_document_is_parse_error() {
    let err = Catalog::from_toml_str("[[phases]]\ntitle = 3").unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[test]
fn duplicate_ids_rejected_from_document() {
    let doc = r#"
[[phases]]
id = "p"
title = "P"

[[phases.tasks]]
id = "x"
title = "X"

[[phases.tasks]]
id = "x"
title = "X again"
"#;
    let err = Catalog::from_toml_str(doc).unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateTask(_)));
}
