use graphql_parser::{query, schema};
use std::convert::From;
use std::io;

#[derive(Debug, Fail)]
pub enum ComposeError {
    #[fail(display = "Invalid schema: {}", message)]
    InvalidSchema { message: String },
    #[fail(display = "Invalid selection set `{}`: {}", selection, message)]
    InvalidSelectionSet { selection: String, message: String },
    /// An enum value (database provider, signing method...) without a handler.
    #[fail(display = "{} not implemented for: {}", mapping, value)]
    UnsupportedMapping { mapping: &'static str, value: String },
    #[fail(display = "{}", message)]
    IntrospectionFailed { message: String },
    #[fail(
        display = "No cached introspection {}, no network access permitted in offline mode",
        fingerprint
    )]
    OfflineCacheMiss { fingerprint: String },
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),
    #[fail(display = "JSON error: {}", _0)]
    Json(#[cause] serde_json::Error),
}

impl ComposeError {
    pub fn unsupported(mapping: &'static str, value: impl Into<String>) -> ComposeError {
        ComposeError::UnsupportedMapping {
            mapping,
            value: value.into(),
        }
    }

    pub fn introspection_failed(message: impl Into<String>) -> ComposeError {
        ComposeError::IntrospectionFailed {
            message: message.into(),
        }
    }
}

impl From<schema::ParseError> for ComposeError {
    fn from(err: schema::ParseError) -> ComposeError {
        ComposeError::InvalidSchema {
            message: err.to_string(),
        }
    }
}

impl From<query::ParseError> for ComposeError {
    fn from(err: query::ParseError) -> ComposeError {
        ComposeError::InvalidSelectionSet {
            selection: String::new(),
            message: err.to_string(),
        }
    }
}

impl From<io::Error> for ComposeError {
    fn from(err: io::Error) -> ComposeError {
        ComposeError::Io(err)
    }
}

impl From<serde_json::Error> for ComposeError {
    fn from(err: serde_json::Error) -> ComposeError {
        ComposeError::Json(err)
    }
}
