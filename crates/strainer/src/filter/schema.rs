//! Filter schema compilation.
//!
//! A schema is compiled once from its declarations by [`SchemaBuilder`]:
//! every declared attribute is routed to one of the extractors, and the
//! resulting descriptors are merged over fresh copies of the parent's maps.
//! The compiled [`FilterSchema`] is immutable and shared behind an [`Arc`].

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use super::annotation::{SequenceKind, TypeAnnotation};
use super::data::FilterData;
use super::extractors::{FilterFieldExtractor, NestedFilterExtractor, SearchFieldExtractor};
use super::fields::{
    AttributeSpec, Declaration, FieldSpec, FilterFieldInfo, FilterMarker, SearchFieldInfo,
    SearchMarker,
};
use super::types::{FilterType, SearchType};
use crate::config::FilterConfig;
use crate::error::ConfigError;

/// A type with a compiled filter schema.
///
/// Usually implemented with `#[derive(Filter)]`.
pub trait Filter {
    /// The compiled schema, built once per type.
    fn schema() -> &'static Arc<FilterSchema>;

    /// The explicitly set attributes of this value.
    fn to_data(&self) -> FilterData;
}

/// Which descriptor map an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Filter,
    Search,
    Nested,
}

/// Compiled descriptor maps of a filter schema.
///
/// Keys of `filter_fields`, `search_fields` and `nested_filters` are disjoint
/// and together equal the keys of `fields`. Inherited attributes come first,
/// in the parent's order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSchema {
    name: String,
    config: FilterConfig,
    fields: IndexMap<String, FieldSpec>,
    filter_fields: IndexMap<String, FilterFieldInfo>,
    search_fields: IndexMap<String, SearchFieldInfo>,
    nested_filters: IndexMap<String, Arc<FilterSchema>>,
}

impl FilterSchema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Every attribute with its type, default and constraints.
    pub fn fields(&self) -> &IndexMap<String, FieldSpec> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn filter_fields(&self) -> &IndexMap<String, FilterFieldInfo> {
        &self.filter_fields
    }

    pub fn search_fields(&self) -> &IndexMap<String, SearchFieldInfo> {
        &self.search_fields
    }

    pub fn nested_filters(&self) -> &IndexMap<String, Arc<FilterSchema>> {
        &self.nested_filters
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        if self.filter_fields.contains_key(name) {
            Some(FieldKind::Filter)
        } else if self.search_fields.contains_key(name) {
            Some(FieldKind::Search)
        } else if self.nested_filters.contains_key(name) {
            Some(FieldKind::Nested)
        } else {
            None
        }
    }

    /// Whether the attribute holds a sequence value.
    pub fn is_sequence(&self, name: &str) -> bool {
        self.filter_fields
            .get(name)
            .map(|f| f.is_sequence)
            .or_else(|| self.search_fields.get(name).map(|s| s.is_sequence))
            .unwrap_or(false)
    }

    fn empty(name: String, config: FilterConfig) -> Self {
        Self {
            name,
            config,
            fields: IndexMap::new(),
            filter_fields: IndexMap::new(),
            search_fields: IndexMap::new(),
            nested_filters: IndexMap::new(),
        }
    }

    fn inherit(name: String, config: FilterConfig, parent: &FilterSchema) -> Self {
        Self {
            name,
            config,
            fields: parent.fields.clone(),
            filter_fields: parent.filter_fields.clone(),
            search_fields: parent.search_fields.clone(),
            nested_filters: parent.nested_filters.clone(),
        }
    }

    fn insert(&mut self, name: String, spec: FieldSpec, descriptor: Descriptor) {
        self.fields.insert(name.clone(), spec);
        match descriptor {
            Descriptor::Filter(info) => {
                self.search_fields.shift_remove(&name);
                self.nested_filters.shift_remove(&name);
                self.filter_fields.insert(name, info);
            }
            Descriptor::Search(info) => {
                self.filter_fields.shift_remove(&name);
                self.nested_filters.shift_remove(&name);
                self.search_fields.insert(name, info);
            }
            Descriptor::Nested(schema) => {
                self.filter_fields.shift_remove(&name);
                self.search_fields.shift_remove(&name);
                self.nested_filters.insert(name, schema);
            }
        }
    }
}

enum Descriptor {
    Filter(FilterFieldInfo),
    Search(SearchFieldInfo),
    Nested(Arc<FilterSchema>),
}

// -------------------------------------------------------------------------
// Builder
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct ConfigOverrides {
    delimiter: Option<String>,
    optional: Option<bool>,
    default_filter_type: Option<FilterType>,
    default_search_type: Option<SearchType>,
    suffixes: Option<IndexMap<String, FilterType>>,
    sequence_types: Option<Vec<SequenceKind>>,
}

/// Collects the declarations of one schema body and compiles them.
///
/// The configuration is the explicit [`SchemaBuilder::config`] if given, else
/// the parent's, else the default, with individual overrides applied on top.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    parent: Option<Arc<FilterSchema>>,
    config: Option<FilterConfig>,
    overrides: ConfigOverrides,
    declarations: Vec<Declaration>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            config: None,
            overrides: ConfigOverrides::default(),
            declarations: Vec::new(),
        }
    }

    /// Inherit every attribute of `parent`.
    pub fn extends(mut self, parent: &Arc<FilterSchema>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn config(mut self, config: FilterConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.overrides.delimiter = Some(delimiter.into());
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.overrides.optional = Some(optional);
        self
    }

    pub fn default_filter_type(mut self, filter_type: FilterType) -> Self {
        self.overrides.default_filter_type = Some(filter_type);
        self
    }

    pub fn default_search_type(mut self, search_type: SearchType) -> Self {
        self.overrides.default_search_type = Some(search_type);
        self
    }

    pub fn suffixes(mut self, suffixes: IndexMap<String, FilterType>) -> Self {
        self.overrides.suffixes = Some(suffixes);
        self
    }

    pub fn sequence_types(mut self, sequence_types: Vec<SequenceKind>) -> Self {
        self.overrides.sequence_types = Some(sequence_types);
        self
    }

    /// Declare a plain attribute.
    pub fn field(self, name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        self.declare(Declaration::new(name, annotation))
    }

    pub fn filter_field(
        self,
        name: impl Into<String>,
        annotation: TypeAnnotation,
        marker: FilterMarker,
    ) -> Self {
        self.declare(Declaration::new(name, annotation).filter(marker))
    }

    pub fn search_field(
        self,
        name: impl Into<String>,
        annotation: TypeAnnotation,
        marker: SearchMarker,
    ) -> Self {
        self.declare(Declaration::new(name, annotation).search(marker))
    }

    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    fn resolve_config(&self) -> FilterConfig {
        let mut config = self
            .config
            .clone()
            .or_else(|| self.parent.as_ref().map(|p| p.config.clone()))
            .unwrap_or_default();

        let overrides = self.overrides.clone();
        if let Some(delimiter) = overrides.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(optional) = overrides.optional {
            config.optional = optional;
        }
        if let Some(filter_type) = overrides.default_filter_type {
            config.default_filter_type = filter_type;
        }
        if let Some(search_type) = overrides.default_search_type {
            config.default_search_type = search_type;
        }
        if let Some(suffixes) = overrides.suffixes {
            config.suffixes = suffixes;
        }
        if let Some(sequence_types) = overrides.sequence_types {
            config.sequence_types = sequence_types;
        }
        config
    }

    /// Classify every declaration and produce the compiled schema.
    pub fn build(self) -> Result<Arc<FilterSchema>, ConfigError> {
        let config = self.resolve_config();
        config.validate()?;

        let nested_extractor = NestedFilterExtractor::from_config(&config);
        let search_extractor = SearchFieldExtractor::from_config(&config);
        let filter_extractor = FilterFieldExtractor::from_config(&config)?;

        let mut schema = match &self.parent {
            Some(parent) => FilterSchema::inherit(self.name.clone(), config, parent),
            None => FilterSchema::empty(self.name.clone(), config),
        };

        let mut seen = HashSet::new();
        for decl in &self.declarations {
            if !seen.insert(decl.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    schema: self.name.clone(),
                    field: decl.name.clone(),
                });
            }

            let (spec, descriptor) = if let Some(nested) = decl.annotation.nested_schema() {
                let (spec, nested) = nested_extractor.extract(&self.name, decl, nested)?;
                (spec, Descriptor::Nested(nested))
            } else {
                match &decl.spec {
                    AttributeSpec::Search(marker) => {
                        let (spec, info) = search_extractor.extract(decl, marker)?;
                        (spec, Descriptor::Search(info))
                    }
                    AttributeSpec::Filter(marker) => {
                        let (spec, info) = filter_extractor.extract(decl, Some(marker));
                        (spec, Descriptor::Filter(info))
                    }
                    AttributeSpec::Plain => {
                        let (spec, info) = filter_extractor.extract(decl, None);
                        (spec, Descriptor::Filter(info))
                    }
                }
            };
            schema.insert(decl.name.clone(), spec, descriptor);
        }

        tracing::debug!(
            schema = %schema.name,
            parent = self.parent.as_ref().map(|p| p.name.as_str()),
            filter_fields = schema.filter_fields.len(),
            search_fields = schema.search_fields.len(),
            nested_filters = schema.nested_filters.len(),
            "compiled filter schema"
        );

        Ok(Arc::new(schema))
    }
}
