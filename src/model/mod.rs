//! Definition Model
//!
//! In-memory representation of MAVLink dialect files: messages, fields and
//! enums, plus the attributes derived from them at construction time
//! (field layout, wire order, payload length, CRC_EXTRA).

pub mod dialect;
pub mod enumeration;
pub mod field;
pub mod message;
pub mod names;

pub use dialect::{filename_of, Dialect, DialectFile, DialectSet};
pub use enumeration::{Enum, EnumEntry, EnumEntryParam};
pub use field::{derive_layout, Field, FieldLayout, FieldMetadata, LayoutError, PrimitiveType};
pub use message::{FieldSlot, Message, MessageBuilder};
pub use names::{format_description, format_name, NameFormat};

/// `<deprecated>` marker on a message, enum or entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    /// `YYYY-MM` the definition was deprecated
    pub since: String,
    /// Name of the superseding definition (may be empty)
    pub replaced_by: String,
    pub note: Option<String>,
}
