//! Schema Gate
//!
//! A dialect file must pass structural validation before the model is built
//! from it. The gate is a collaborator behind [`SchemaGate`]: it reads one file,
//! checks it against the dialect format and hands back a [`DialectDocument`],
//! a statically typed view of the file's elements. Building derived attributes
//! (layouts, CRC_EXTRA) is left to [`crate::model`].
//!
//! Every parent element has a closed set of child kinds, modelled as an enum
//! per parent, so consumers handle them with one exhaustive `match`.

pub mod xml;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::checksum::Checksum;
use crate::model::{Deprecation, EnumEntryParam, FieldMetadata};

pub use xml::XmlSchemaGate;

/// Structural validation failures reported by a gate
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unable to read message definition file '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: xmltree::ParseError,
    },

    #[error("Validation of message definition file '{path}' failed at '{element}': {reason}")]
    Nonconforming {
        path: PathBuf,
        element: String,
        reason: String,
    },
}

impl SchemaError {
    /// File the failure was reported for
    pub fn path(&self) -> &Path {
        match self {
            SchemaError::Unreadable { path, .. }
            | SchemaError::Malformed { path, .. }
            | SchemaError::Nonconforming { path, .. } => path,
        }
    }
}

/// Validates a dialect file and parses it into a [`DialectDocument`].
///
/// Invoked once per newly discovered file during a resolution run.
pub trait SchemaGate {
    fn validate_and_parse(&self, path: &Path) -> Result<DialectDocument, SchemaError>;
}

/// Schema-validated content of one dialect file
#[derive(Debug, Clone, PartialEq)]
pub struct DialectDocument {
    pub path: PathBuf,
    /// SHA256 of the raw file bytes
    pub digest: Checksum,
    /// Children of the `<mavlink>` root in document order
    pub children: Vec<DialectChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialectChild {
    /// Include path exactly as written
    Include(String),
    Version(u32),
    Dialect(u32),
    Enums(Vec<EnumElement>),
    Messages(Vec<MessageElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumElement {
    pub name: String,
    pub bitmask: bool,
    pub children: Vec<EnumChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumChild {
    Description(String),
    Deprecated(Deprecation),
    Wip,
    Entry(EntryElement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryElement {
    pub name: String,
    pub value: String,
    pub children: Vec<EntryChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryChild {
    Description(String),
    Deprecated(Deprecation),
    Wip,
    Param(EnumEntryParam),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageElement {
    pub id: u32,
    pub name: String,
    pub children: Vec<MessageChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageChild {
    Description(String),
    Deprecated(Deprecation),
    Wip,
    /// Every field after this marker is an extension field
    Extensions,
    Field(FieldElement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldElement {
    pub name: String,
    /// Declared type, e.g. `uint8_t` or `char[16]`
    pub type_decl: String,
    pub description: Option<String>,
    pub metadata: FieldMetadata,
}
