//! Dialect files and their parsed content

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::checksum::Checksum;
use crate::error::{DialectError, Result};
use crate::gate::{
    DialectChild, DialectDocument, EntryChild, EntryElement, EnumChild, EnumElement, FieldElement,
    MessageChild, MessageElement,
};

use super::{Enum, EnumEntry, Field, LayoutError, Message};

/// Base filename of a dialect path (`/defs/common.xml` -> `common.xml`)
pub fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Parsed content of one dialect file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dialect {
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    /// Include paths as written, relative to the including file
    pub includes: Vec<String>,
    pub version: Option<u32>,
    pub dialect: Option<u32>,
}

impl Dialect {
    /// Build the model from a schema-validated document
    pub fn from_document(document: DialectDocument) -> Result<Self> {
        let mut dialect = Dialect::default();

        for child in document.children {
            match child {
                DialectChild::Include(include) => dialect.includes.push(include),
                DialectChild::Version(version) => dialect.version = Some(version),
                DialectChild::Dialect(number) => dialect.dialect = Some(number),
                DialectChild::Enums(enums) => {
                    dialect.enums.extend(enums.into_iter().map(build_enum));
                }
                DialectChild::Messages(messages) => {
                    for message in messages {
                        dialect.messages.push(build_message(message)?);
                    }
                }
            }
        }

        Ok(dialect)
    }

    /// Base filenames of every include, without directories
    pub fn include_names(&self) -> Vec<String> {
        self.includes
            .iter()
            .map(|include| {
                include
                    .rsplit(['/', '\\'])
                    .next()
                    .unwrap_or(include)
                    .to_string()
            })
            .collect()
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name() == name)
    }

    pub fn message_by_id(&self, id: u32) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }
}

fn build_message(element: MessageElement) -> Result<Message> {
    let mut builder = Message::builder(element.id, element.name.clone());

    for child in element.children {
        builder = match child {
            MessageChild::Description(text) => builder.description(text),
            MessageChild::Deprecated(deprecation) => builder.deprecated(deprecation),
            MessageChild::Wip => builder.wip(),
            MessageChild::Extensions => builder.extensions(),
            MessageChild::Field(field) => builder.field(build_field(&element.name, field)?),
        };
    }

    Ok(builder.build())
}

fn build_field(message: &str, element: FieldElement) -> Result<Field> {
    let field = Field::new(element.name.clone(), element.type_decl.clone()).map_err(|err| match err {
        LayoutError::UnknownType(type_name) => DialectError::UnknownFieldType {
            message: message.to_string(),
            field: element.name.clone(),
            type_name,
        },
        LayoutError::MalformedArray(reason) => DialectError::MalformedFieldType {
            message: message.to_string(),
            field: element.name.clone(),
            type_decl: element.type_decl.clone(),
            reason,
        },
    })?;

    let field = field.with_metadata(element.metadata);
    Ok(match element.description {
        Some(description) => field.with_description(description),
        None => field,
    })
}

fn build_enum(element: EnumElement) -> Enum {
    let mut enumeration = Enum::new(element.name);
    enumeration.bitmask = element.bitmask;

    for child in element.children {
        match child {
            EnumChild::Description(text) => enumeration.description = Some(text),
            EnumChild::Deprecated(deprecation) => enumeration.deprecation = Some(deprecation),
            EnumChild::Wip => enumeration.wip = true,
            EnumChild::Entry(entry) => enumeration.entries.push(build_entry(entry)),
        }
    }

    enumeration
}

fn build_entry(element: EntryElement) -> EnumEntry {
    let mut entry = EnumEntry::new(element.name, element.value);

    for child in element.children {
        match child {
            EntryChild::Description(text) => entry.description = Some(text),
            EntryChild::Deprecated(deprecation) => entry.deprecation = Some(deprecation),
            EntryChild::Wip => entry.wip = true,
            EntryChild::Param(param) => entry.params.push(param),
        }
    }

    entry
}

/// One dialect file taking part in a resolution run
#[derive(Debug, Clone, PartialEq)]
pub struct DialectFile {
    absolute_path: PathBuf,
    filename: String,
    dialect: Dialect,
    digest: Option<Checksum>,
    /// Transitively included filenames; `None` until the include graph is resolved
    dependencies: Option<Vec<String>>,
}

impl DialectFile {
    pub fn new(absolute_path: impl Into<PathBuf>, dialect: Dialect) -> Self {
        let absolute_path = absolute_path.into();
        Self {
            filename: filename_of(&absolute_path),
            absolute_path,
            dialect,
            digest: None,
            dependencies: None,
        }
    }

    /// Build a file from a gate's output, keeping the source digest
    pub fn from_document(absolute_path: impl Into<PathBuf>, document: DialectDocument) -> Result<Self> {
        let digest = document.digest.clone();
        let mut file = Self::new(absolute_path, Dialect::from_document(document)?);
        file.digest = Some(digest);
        Ok(file)
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Base filename, the key of the file within a run
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// SHA256 of the source bytes, when the file came from a gate
    pub fn digest(&self) -> Option<&Checksum> {
        self.digest.as_ref()
    }

    pub fn dependencies(&self) -> Option<&[String]> {
        self.dependencies.as_deref()
    }

    pub(crate) fn set_dependencies(&mut self, dependencies: Vec<String>) {
        self.dependencies = Some(dependencies);
    }
}

/// Dialect files keyed by base filename
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialectSet {
    files: BTreeMap<String, DialectFile>,
}

impl DialectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file under its filename, returning any file it replaced
    pub fn insert(&mut self, file: DialectFile) -> Option<DialectFile> {
        self.files.insert(file.filename().to_string(), file)
    }

    pub fn get(&self, filename: &str) -> Option<&DialectFile> {
        self.files.get(filename)
    }

    pub(crate) fn get_mut(&mut self, filename: &str) -> Option<&mut DialectFile> {
        self.files.get_mut(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Filenames in sorted order
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DialectFile)> {
        self.files.iter().map(|(name, file)| (name.as_str(), file))
    }

    pub fn files(&self) -> impl Iterator<Item = &DialectFile> {
        self.files.values()
    }
}

impl FromIterator<DialectFile> for DialectSet {
    fn from_iter<I: IntoIterator<Item = DialectFile>>(iter: I) -> Self {
        let mut set = DialectSet::new();
        for file in iter {
            set.insert(file);
        }
        set
    }
}
