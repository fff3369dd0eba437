//! Relational model metadata.
//!
//! Filters name columns and relationships by attribute name. A [`Model`]
//! records which names exist on a table, which columns are arrays or primary
//! keys, and how relationships join to other models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// A column of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    /// Postgres array column; predicates test its elements.
    #[serde(default)]
    pub array: bool,

    #[serde(default)]
    pub primary_key: bool,
}

/// SQL join types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

impl From<JoinType> for sea_query::JoinType {
    fn from(join_type: JoinType) -> Self {
        match join_type {
            JoinType::Inner => sea_query::JoinType::InnerJoin,
            JoinType::Left => sea_query::JoinType::LeftJoin,
            JoinType::Right => sea_query::JoinType::RightJoin,
        }
    }
}

/// One `local = remote` column pair of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    /// Column on the model declaring the relationship.
    pub local: String,
    /// Column on the related model.
    pub remote: String,
}

/// A relationship from one model to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Attribute name; matches the nested filter attribute.
    pub name: String,

    /// Name of the related model in the registry.
    pub target: String,

    #[serde(default)]
    pub join_type: JoinType,

    pub pairs: Vec<KeyPair>,
}

/// Columns and relationships of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub table: String,

    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Model {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            array: false,
            primary_key: false,
        });
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            array: false,
            primary_key: true,
        });
        self
    }

    pub fn array_column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            array: true,
            primary_key: false,
        });
        self
    }

    /// Add an inner-join relationship joined on `(local, remote)` pairs.
    pub fn relationship<'a>(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.relationship_with(Relationship {
            name: name.into(),
            target: target.into(),
            join_type: JoinType::Inner,
            pairs: pairs
                .into_iter()
                .map(|(local, remote)| KeyPair {
                    local: local.to_string(),
                    remote: remote.to_string(),
                })
                .collect(),
        })
    }

    pub fn relationship_with(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn primary_keys(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }
}

/// Models by name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its table name, replacing any previous one.
    pub fn register(&mut self, model: Model) -> &mut Self {
        tracing::trace!(model = %model.table, "registered model");
        self.models.insert(model.table.clone(), model);
        self
    }

    pub fn with(mut self, model: Model) -> Self {
        self.register(model);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn model(&self, name: &str) -> Result<&Model, DriverError> {
        self.get(name)
            .ok_or_else(|| DriverError::UnknownModel(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::new()
            .with(
                Model::new("a")
                    .primary_key("id")
                    .column("name")
                    .column("b_id")
                    .array_column("tags")
                    .relationship("b", "b", [("b_id", "id")]),
            )
            .with(Model::new("b").primary_key("id"))
    }

    #[test]
    fn lookups() {
        let registry = registry();
        let a = registry.model("a").unwrap();
        assert!(a.get_column("tags").unwrap().array);
        assert!(!a.get_column("name").unwrap().array);
        assert!(a.get_column("missing").is_none());

        let rel = a.get_relationship("b").unwrap();
        assert_eq!(rel.target, "b");
        assert_eq!(rel.join_type, JoinType::Inner);
        assert_eq!(rel.pairs[0].local, "b_id");

        assert_eq!(a.primary_keys().len(), 1);
        assert!(matches!(
            registry.model("z"),
            Err(DriverError::UnknownModel(m)) if m == "z"
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn deserialize_model() {
        let model: Model = serde_json::from_value(serde_json::json!({
            "table": "post",
            "columns": [
                {"name": "id", "primary_key": true},
                {"name": "labels", "array": true}
            ],
            "relationships": [
                {"name": "author", "target": "user", "join_type": "left",
                 "pairs": [{"local": "author_id", "remote": "id"}]}
            ]
        }))
        .unwrap();

        assert_eq!(model.primary_keys()[0].name, "id");
        assert!(model.get_column("labels").unwrap().array);
        let rel = model.get_relationship("author").unwrap();
        assert_eq!(rel.join_type, JoinType::Left);
        assert!(matches!(
            sea_query::JoinType::from(rel.join_type),
            sea_query::JoinType::LeftJoin
        ));
    }
}
