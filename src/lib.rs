//! MAVLink Dialect Loader
//!
//! Reads MAVLink message definition files (dialects), expands their include
//! trees and checks the result before any code is generated from it.
//!
//! ## Features
//!
//! - **Schema Gate**: every file is structurally validated before it is modelled
//! - **Wire Layout**: fields are reordered by width and CRC_EXTRA is computed per message
//! - **Include Graph**: includes are resolved breadth-first into an acyclic graph
//! - **Cross-File Validation**: message ids and names must stay unique across dependencies
//!
//! ## Pipeline
//!
//! ```text
//! seed paths
//!   └── SchemaGate::validate_and_parse ──> DialectDocument
//!         └── Dialect::from_document ──> DialectFile
//!               └── IncludeResolver::expand ──> (DialectSet, IncludeGraph)
//!                     └── assign_dependencies
//!                           └── DialectValidator::validate (each, in order)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use mavlib_gen::DialectLoader;
//!
//! let resolved = DialectLoader::new().load(["message_definitions/ardupilotmega.xml"])?;
//! for file in resolved.generation_order() {
//!     for message in &file.dialect().messages {
//!         println!("{} {} crc_extra={}", message.id(), message.name(), message.crc_extra());
//!     }
//! }
//! # Ok::<(), mavlib_gen::DialectError>(())
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod gate;
pub mod graph;
pub mod model;
pub mod validators;

pub use checksum::{Checksum, CrcExtra};
pub use config::MavlibConfig;
pub use error::{DialectError, Result};
pub use gate::{DialectDocument, SchemaError, SchemaGate, XmlSchemaGate};
pub use graph::{collect_dialects, DialectLoader, IncludeGraph, IncludeResolver, ResolvedDialects};
pub use model::{Dialect, DialectFile, DialectSet, Enum, EnumEntry, Field, Message};
pub use validators::{DialectValidator, UniqueMessageIdsAcrossDependencies, ValidationFailure};
