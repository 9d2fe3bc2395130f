//! Error taxonomy for configuration, resources and tree handling.

use std::path::PathBuf;

use thiserror::Error;

use crate::tree::NodeId;

/// Fatal configuration problems. Raised while property files are parsed,
/// before any layout or drawing happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("[{component}] unexpected property type '{found}' in {} (expected '{expected}')", path.display())]
    UnexpectedHeader {
        component: &'static str,
        expected: &'static str,
        found: String,
        path: PathBuf,
    },

    #[error("[{component}] invalid value '{value}' for '{field}'")]
    InvalidValue {
        component: &'static str,
        field: String,
        value: String,
    },

    #[error("[{component}] could not parse '{value}' as a number for '{field}'")]
    InvalidNumber {
        component: &'static str,
        field: String,
        value: String,
    },

    #[error("[{component}] '{field}' is required when the feature is enabled")]
    MissingField {
        component: &'static str,
        field: &'static str,
    },

    #[error("[{component}] '{field}' expects {expected} value(s), found {found}")]
    WrongArity {
        component: &'static str,
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("[{component}] continuous color map needs exactly 2 breakpoints, found {found}")]
    ContinuousBreakpoints { component: &'static str, found: usize },

    #[error("[{component}] property file is empty: {}", path.display())]
    EmptyFile {
        component: &'static str,
        path: PathBuf,
    },
}

impl ConfigError {
    pub fn invalid_value(component: &'static str, field: &str, value: &str) -> Self {
        Self::InvalidValue {
            component,
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn invalid_number(component: &'static str, field: &str, value: &str) -> Self {
        Self::InvalidNumber {
            component,
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Missing or unreadable input files.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("could not find {what} file: {}", path.display())]
    Missing { what: &'static str, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line} in {}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Errors raised by tree construction and tree queries.
#[derive(Error, Debug, PartialEq)]
pub enum TreeError {
    #[error("node {ancestor} is not an ancestor of node {node}")]
    NotAnAncestor { node: NodeId, ancestor: NodeId },

    #[error("tree has no nodes")]
    Empty,

    #[error("failed to parse newick tree: {0}")]
    Newick(String),
}

/// Top-level error for a rendering run.
#[derive(Error, Debug)]
pub enum DrawError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("failed to save SVG: {0}")]
    Save(String),
}
