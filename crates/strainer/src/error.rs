//! Error types.
//!
//! Configuration errors surface while a schema is compiled, driver errors while
//! a populated filter is translated into a statement, and input errors while
//! raw request data is bound to a schema. None of them are retried.

use thiserror::Error;

/// Errors raised while compiling a filter schema or loading its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid delimiter `{0}`: expected two or more underscores")]
    InvalidDelimiter(String),

    #[error("{schema}.{field}: nested filters cannot carry filter or search markers")]
    MarkerOnNested { schema: String, field: String },

    #[error("{field}: search field requires at least one target")]
    EmptySearchTargets { field: String },

    #[error("{schema}.{field}: declared more than once")]
    DuplicateField { schema: String, field: String },

    #[error("unknown filter type `{0}`")]
    UnknownFilterType(String),

    #[error("unknown search type `{0}`")]
    UnknownSearchType(String),

    #[error("invalid filter configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while translating a populated filter against a model.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{filter}.{field}: column {model}.{column} not found")]
    AttributeNotFound {
        filter: String,
        field: String,
        model: String,
        column: String,
    },

    #[error("{filter}.{field}: relationship {model}.{field} not found")]
    RelationshipNotFound {
        filter: String,
        field: String,
        model: String,
    },

    #[error("model `{0}` is not registered")]
    UnknownModel(String),

    #[error("count is not supported for model `{model}` with {keys} primary key columns")]
    CompositePrimaryKey { model: String, keys: usize },

    #[error("{filter}.{field}: value does not match the declared field shape")]
    ValueShape { filter: String, field: String },
}

/// Errors raised while binding raw input to a schema.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{schema}: unknown field `{field}`")]
    UnknownField { schema: String, field: String },

    #[error("{schema}.{field}: value does not match the declared field shape")]
    ValueShape { schema: String, field: String },

    #[error("missing required parameter `{0}`")]
    Missing(String),

    #[error("invalid value for `{param}`: {reason}")]
    Invalid { param: String, reason: String },

    #[error("`{param}` violates constraint: {reason}")]
    Constraint { param: String, reason: String },
}

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Result type alias defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
