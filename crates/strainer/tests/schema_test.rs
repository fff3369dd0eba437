#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Schema compilation: classification, inheritance and configuration.

use strainer::filter::{Declaration, DefaultPolicy, FieldKind, FilterMarker, SearchMarker};
use strainer::{ConfigError, FilterConfig, FilterSchema, FilterType, ScalarKind, SearchType, TypeAnnotation};
use strainer_test_utils::{a_filter, init_tracing};

fn int() -> TypeAnnotation {
    TypeAnnotation::Scalar(ScalarKind::Int)
}

fn text() -> TypeAnnotation {
    TypeAnnotation::Scalar(ScalarKind::Str)
}

#[test]
fn suffixes_resolve_targets() {
    init_tracing();
    let schema = FilterSchema::builder("Suffixes")
        .field("name", text())
        .field("name__n", text())
        .field("name__asdf", text())
        .field("created__gte", int())
        .build()
        .unwrap();

    let info = |name: &str| {
        let info = &schema.filter_fields()[name];
        (info.target.as_str(), info.filter_type)
    };
    assert_eq!(info("name"), ("name", FilterType::Eq));
    assert_eq!(info("name__n"), ("name", FilterType::Ne));
    assert_eq!(info("name__asdf"), ("name__asdf", FilterType::Eq));
    assert_eq!(info("created__gte"), ("created", FilterType::Ge));
}

#[test]
fn markers_fill_in_missing_parts() {
    let schema = FilterSchema::builder("Markers")
        .default_filter_type(FilterType::Like)
        .filter_field("by_name", text(), FilterMarker::new().target("name"))
        .filter_field("name__lt", text(), FilterMarker::new().op(FilterType::Gt))
        .filter_field("name__lt_2", text(), FilterMarker::new())
        .filter_field(
            "anything",
            text(),
            FilterMarker::new().target("title").op(FilterType::Ilike),
        )
        .build()
        .unwrap();

    let info = |name: &str| {
        let info = &schema.filter_fields()[name];
        (info.target.as_str(), info.filter_type)
    };
    assert_eq!(info("by_name"), ("name", FilterType::Like));
    assert_eq!(info("name__lt"), ("name__lt", FilterType::Gt));
    assert_eq!(info("name__lt_2"), ("name__lt_2", FilterType::Like));
    assert_eq!(info("anything"), ("title", FilterType::Ilike));
}

#[test]
fn search_fields_use_default_operator() {
    let schema = FilterSchema::builder("Search")
        .default_search_type(SearchType::CaseSensitive)
        .search_field("q", text(), SearchMarker::new(["name", "email"]))
        .search_field(
            "qi",
            text(),
            SearchMarker::new(["name"]).op(SearchType::CaseInsensitive),
        )
        .build()
        .unwrap();

    let q = &schema.search_fields()["q"];
    assert_eq!(q.targets(), ["name", "email"]);
    assert_eq!(q.search_type, SearchType::CaseSensitive);
    assert_eq!(schema.search_fields()["qi"].search_type, SearchType::CaseInsensitive);
}

#[test]
fn child_inherits_and_overrides() {
    let parent = FilterSchema::builder("Parent")
        .field("id", int())
        .field("name", text())
        .build()
        .unwrap();
    let child = FilterSchema::builder("Child")
        .extends(&parent)
        .search_field("name", text(), SearchMarker::new(["name"]))
        .field("extra", int())
        .build()
        .unwrap();

    assert_eq!(child.filter_fields()["id"], parent.filter_fields()["id"]);
    assert_eq!(child.kind_of("name"), Some(FieldKind::Search));
    assert!(!child.filter_fields().contains_key("name"));
    assert_eq!(parent.kind_of("name"), Some(FieldKind::Filter));
    assert!(!parent.fields().contains_key("extra"));

    let grandchild = FilterSchema::builder("Grandchild")
        .extends(&child)
        .field("id__gt", int())
        .build()
        .unwrap();
    assert!(grandchild.filter_fields().contains_key("id__gt"));
    assert_eq!(grandchild.search_fields(), child.search_fields());
    assert!(!child.filter_fields().contains_key("id__gt"));
    assert!(!parent.filter_fields().contains_key("id__gt"));
}

#[test]
fn identical_declarations_compile_equal() {
    assert_eq!(*a_filter(), *a_filter());
}

#[test]
fn config_is_inherited_unless_overridden() {
    let config = FilterConfig::from_toml_str(
        r#"
        delimiter = "___"
        optional = false

        [suffixes]
        not = "ne"
        "#,
    )
    .unwrap();
    assert!(config.suffixes.contains_key("not"));
    assert!(!config.suffixes.contains_key("n"));

    let parent = FilterSchema::builder("Parent")
        .config(config)
        .field("name___not", text())
        .build()
        .unwrap();
    assert_eq!(parent.filter_fields()["name___not"].filter_type, FilterType::Ne);
    assert_eq!(parent.field("name___not").unwrap().default, DefaultPolicy::Required);

    let child = FilterSchema::builder("Child")
        .extends(&parent)
        .optional(true)
        .field("id", int())
        .build()
        .unwrap();
    assert_eq!(child.config().delimiter, "___");
    assert_eq!(child.field("id").unwrap().default, DefaultPolicy::Empty);
    assert_eq!(child.field("name___not").unwrap().default, DefaultPolicy::Required);
}

#[test]
fn configuration_errors() {
    assert!(matches!(
        FilterSchema::builder("Bad").delimiter("_").build(),
        Err(ConfigError::InvalidDelimiter(d)) if d == "_"
    ));
    assert!(matches!(
        FilterConfig::from_toml_str(r#"delimiter = "--""#),
        Err(ConfigError::InvalidDelimiter(_))
    ));
    assert!(matches!(
        FilterConfig::from_toml_str("optional = 3"),
        Err(ConfigError::Parse(_))
    ));

    let nested = FilterSchema::builder("Nested").build().unwrap();
    assert!(matches!(
        FilterSchema::builder("Outer")
            .filter_field("n", TypeAnnotation::Filter(nested), FilterMarker::new().op(FilterType::Ne))
            .build(),
        Err(ConfigError::MarkerOnNested { field, .. }) if field == "n"
    ));

    assert!(matches!(
        FilterSchema::builder("Empty")
            .search_field("q", text(), SearchMarker::new(Vec::<String>::new()))
            .build(),
        Err(ConfigError::EmptySearchTargets { field }) if field == "q"
    ));

    assert!(matches!(
        FilterSchema::builder("Twice")
            .field("id", int())
            .declare(Declaration::new("id", int()))
            .build(),
        Err(ConfigError::DuplicateField { field, .. }) if field == "id"
    ));
}
