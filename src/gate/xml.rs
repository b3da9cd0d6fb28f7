//! Structural validation of MAVLink dialect XML
//!
//! Checks what the dialect format guarantees before a model is built:
//! closed element and attribute sets, required attributes, typed attribute
//! values and per-file uniqueness of message ids/names, enum names, entry
//! names, param indices, field names and includes.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use xmltree::{Element, XMLNode};

use crate::checksum::Checksum;
use crate::model::{Deprecation, EnumEntryParam, FieldMetadata};

use super::{
    DialectChild, DialectDocument, EntryChild, EntryElement, EnumChild, EnumElement, FieldElement,
    MessageChild, MessageElement, SchemaError, SchemaGate,
};

/// Message ids are 24 bits on the wire
pub const DEFAULT_MAX_MESSAGE_ID: u32 = 0x00FF_FFFF;

const MESSAGE_ATTRS: &[&str] = &["id", "name"];
const FIELD_ATTRS: &[&str] = &[
    "name",
    "type",
    "units",
    "enum",
    "display",
    "print_format",
    "instance",
    "invalid",
    "default",
    "increment",
    "minValue",
    "maxValue",
    "multiplier",
];
const ENUM_ATTRS: &[&str] = &["name", "bitmask"];
const ENTRY_ATTRS: &[&str] = &["name", "value", "hasLocation", "isDestination", "missionOnly"];
const PARAM_ATTRS: &[&str] = &[
    "index",
    "label",
    "units",
    "enum",
    "decimalPlaces",
    "increment",
    "minValue",
    "maxValue",
    "default",
    "reserved",
];
const DEPRECATED_ATTRS: &[&str] = &["since", "replaced_by"];

/// The built-in [`SchemaGate`] for MAVLink dialect XML files
#[derive(Debug, Clone)]
pub struct XmlSchemaGate {
    max_message_id: u32,
}

impl Default for XmlSchemaGate {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlSchemaGate {
    pub fn new() -> Self {
        Self {
            max_message_id: DEFAULT_MAX_MESSAGE_ID,
        }
    }

    /// Reject message ids above `max_message_id`
    pub fn with_max_message_id(mut self, max_message_id: u32) -> Self {
        self.max_message_id = max_message_id;
        self
    }

    /// Validate and parse dialect text that was read from `path`
    pub fn parse_str(&self, path: &Path, text: &str) -> Result<DialectDocument, SchemaError> {
        self.parse_bytes(path, text.as_bytes())
    }

    fn parse_bytes(&self, path: &Path, bytes: &[u8]) -> Result<DialectDocument, SchemaError> {
        let root = Element::parse(bytes).map_err(|source| SchemaError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let walker = Walker {
            path,
            max_message_id: self.max_message_id,
        };
        let children = walker.dialect(&root)?;

        Ok(DialectDocument {
            path: path.to_path_buf(),
            digest: Checksum::from_bytes(bytes),
            children,
        })
    }
}

impl SchemaGate for XmlSchemaGate {
    fn validate_and_parse(&self, path: &Path) -> Result<DialectDocument, SchemaError> {
        let bytes = fs::read(path).map_err(|source| SchemaError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let document = self.parse_bytes(path, &bytes)?;
        tracing::debug!("{} passed validation", path.display());
        Ok(document)
    }
}

trait XmlHelper {
    fn attribute(&self, name: &str) -> Option<&str>;
    fn child_elements(&self) -> impl Iterator<Item = &Element>;
    fn text_content(&self) -> String;
}

impl XmlHelper for Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_ref)
    }

    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(XMLNode::as_element)
    }

    fn text_content(&self) -> String {
        self.get_text().map(|text| text.into_owned()).unwrap_or_default()
    }
}

/// Walks one document, tracking element paths for error reports
struct Walker<'p> {
    path: &'p Path,
    max_message_id: u32,
}

impl Walker<'_> {
    fn fail(&self, element: &str, reason: impl Into<String>) -> SchemaError {
        SchemaError::Nonconforming {
            path: self.path.to_path_buf(),
            element: element.to_string(),
            reason: reason.into(),
        }
    }

    fn dialect(&self, root: &Element) -> Result<Vec<DialectChild>, SchemaError> {
        let root_path = format!("/{}", root.name);
        if root.name != "mavlink" {
            return Err(self.fail(&root_path, "root element must be <mavlink>"));
        }
        self.check_attributes(root, &root_path, &[])?;

        let mut children = Vec::new();
        let mut includes = HashSet::new();
        let mut seen_version = false;
        let mut seen_dialect = false;

        for (node, path) in self.elements(root, &root_path)? {
            let child = match node.name.as_str() {
                "include" => {
                    self.check_attributes(node, &path, &[])?;
                    let include = self.required_text(node, &path)?;
                    if !includes.insert(include.clone()) {
                        return Err(self.fail(&path, format!("duplicate include '{}'", include)));
                    }
                    DialectChild::Include(include)
                }
                "version" => {
                    if std::mem::replace(&mut seen_version, true) {
                        return Err(self.fail(&path, "more than one <version>"));
                    }
                    DialectChild::Version(self.number_text(node, &path)?)
                }
                "dialect" => {
                    if std::mem::replace(&mut seen_dialect, true) {
                        return Err(self.fail(&path, "more than one <dialect>"));
                    }
                    DialectChild::Dialect(self.number_text(node, &path)?)
                }
                "enums" => DialectChild::Enums(self.enums(node, &path)?),
                "messages" => DialectChild::Messages(self.messages(node, &path)?),
                other => return Err(self.fail(&path, format!("unknown element <{}>", other))),
            };
            children.push(child);
        }

        self.check_file_uniqueness(&children, &root_path)?;
        Ok(children)
    }

    fn check_file_uniqueness(&self, children: &[DialectChild], root_path: &str) -> Result<(), SchemaError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        let mut enums = HashSet::new();

        for child in children {
            match child {
                DialectChild::Messages(messages) => {
                    for message in messages {
                        if !ids.insert(message.id) {
                            return Err(self.fail(root_path, format!("duplicate message id {}", message.id)));
                        }
                        if !names.insert(message.name.as_str()) {
                            return Err(self.fail(
                                root_path,
                                format!("duplicate message name '{}'", message.name),
                            ));
                        }
                    }
                }
                DialectChild::Enums(list) => {
                    for enumeration in list {
                        if !enums.insert(enumeration.name.as_str()) {
                            return Err(self.fail(
                                root_path,
                                format!("duplicate enum name '{}'", enumeration.name),
                            ));
                        }
                    }
                }
                DialectChild::Include(_) | DialectChild::Version(_) | DialectChild::Dialect(_) => {}
            }
        }
        Ok(())
    }

    fn messages(&self, node: &Element, path: &str) -> Result<Vec<MessageElement>, SchemaError> {
        self.check_attributes(node, path, &[])?;
        self.elements(node, path)?
            .into_iter()
            .map(|(child, child_path)| match child.name.as_str() {
                "message" => self.message(child, &child_path),
                other => Err(self.fail(&child_path, format!("unknown element <{}>", other))),
            })
            .collect()
    }

    fn message(&self, node: &Element, path: &str) -> Result<MessageElement, SchemaError> {
        self.check_attributes(node, path, MESSAGE_ATTRS)?;
        let id: u32 = self.parsed_attribute(node, path, "id")?
            .ok_or_else(|| self.fail(path, "missing required attribute 'id'"))?;
        if id > self.max_message_id {
            return Err(self.fail(
                path,
                format!("message id {} exceeds the maximum of {}", id, self.max_message_id),
            ));
        }
        let name = self.required_attribute(node, path, "name")?.to_string();

        let mut children = Vec::new();
        let mut field_names = HashSet::new();
        let mut seen_extensions = false;

        for (child, child_path) in self.elements(node, path)? {
            let parsed = match child.name.as_str() {
                "description" => MessageChild::Description(self.description(child, &child_path)?),
                "deprecated" => MessageChild::Deprecated(self.deprecated(child, &child_path)?),
                "wip" => {
                    self.wip(child, &child_path)?;
                    MessageChild::Wip
                }
                "extensions" => {
                    self.check_attributes(child, &child_path, &[])?;
                    self.check_empty(child, &child_path)?;
                    if std::mem::replace(&mut seen_extensions, true) {
                        return Err(self.fail(&child_path, "more than one <extensions/> marker"));
                    }
                    MessageChild::Extensions
                }
                "field" => {
                    let field = self.field(child, &child_path)?;
                    if !field_names.insert(field.name.clone()) {
                        return Err(self.fail(
                            &child_path,
                            format!("duplicate field name '{}' in message '{}'", field.name, name),
                        ));
                    }
                    MessageChild::Field(field)
                }
                other => return Err(self.fail(&child_path, format!("unknown element <{}>", other))),
            };
            children.push(parsed);
        }

        Ok(MessageElement { id, name, children })
    }

    fn field(&self, node: &Element, path: &str) -> Result<FieldElement, SchemaError> {
        self.check_attributes(node, path, FIELD_ATTRS)?;
        self.check_no_child_elements(node, path)?;

        let text = node.text_content();
        let description = Some(text.trim()).filter(|t| !t.is_empty()).map(str::to_string);

        let metadata = FieldMetadata {
            units: owned_attribute(node, "units"),
            enum_name: owned_attribute(node, "enum"),
            display: owned_attribute(node, "display"),
            print_format: owned_attribute(node, "print_format"),
            instance: self.bool_attribute(node, path, "instance")?.unwrap_or(false),
            invalid: owned_attribute(node, "invalid"),
            default: owned_attribute(node, "default"),
            increment: owned_attribute(node, "increment"),
            min_value: owned_attribute(node, "minValue"),
            max_value: owned_attribute(node, "maxValue"),
            multiplier: owned_attribute(node, "multiplier"),
        };

        Ok(FieldElement {
            name: self.required_attribute(node, path, "name")?.to_string(),
            type_decl: self.required_attribute(node, path, "type")?.to_string(),
            description,
            metadata,
        })
    }

    fn enums(&self, node: &Element, path: &str) -> Result<Vec<EnumElement>, SchemaError> {
        self.check_attributes(node, path, &[])?;
        self.elements(node, path)?
            .into_iter()
            .map(|(child, child_path)| match child.name.as_str() {
                "enum" => self.enumeration(child, &child_path),
                other => Err(self.fail(&child_path, format!("unknown element <{}>", other))),
            })
            .collect()
    }

    fn enumeration(&self, node: &Element, path: &str) -> Result<EnumElement, SchemaError> {
        self.check_attributes(node, path, ENUM_ATTRS)?;
        let name = self.required_attribute(node, path, "name")?.to_string();
        let bitmask = self.bool_attribute(node, path, "bitmask")?.unwrap_or(false);

        let mut children = Vec::new();
        let mut entry_names = HashSet::new();

        for (child, child_path) in self.elements(node, path)? {
            let parsed = match child.name.as_str() {
                "description" => EnumChild::Description(self.description(child, &child_path)?),
                "deprecated" => EnumChild::Deprecated(self.deprecated(child, &child_path)?),
                "wip" => {
                    self.wip(child, &child_path)?;
                    EnumChild::Wip
                }
                "entry" => {
                    let entry = self.entry(child, &child_path)?;
                    if !entry_names.insert(entry.name.clone()) {
                        return Err(self.fail(
                            &child_path,
                            format!("duplicate entry '{}' in enum '{}'", entry.name, name),
                        ));
                    }
                    EnumChild::Entry(entry)
                }
                other => return Err(self.fail(&child_path, format!("unknown element <{}>", other))),
            };
            children.push(parsed);
        }

        Ok(EnumElement { name, bitmask, children })
    }

    fn entry(&self, node: &Element, path: &str) -> Result<EntryElement, SchemaError> {
        self.check_attributes(node, path, ENTRY_ATTRS)?;
        // the mission flags are recognised but carry nothing the model needs
        for flag in ["hasLocation", "isDestination", "missionOnly"] {
            self.bool_attribute(node, path, flag)?;
        }

        let name = self.required_attribute(node, path, "name")?.to_string();
        let value = self.required_attribute(node, path, "value")?.trim().to_string();

        let mut children = Vec::new();
        let mut indices = HashSet::new();

        for (child, child_path) in self.elements(node, path)? {
            let parsed = match child.name.as_str() {
                "description" => EntryChild::Description(self.description(child, &child_path)?),
                "deprecated" => EntryChild::Deprecated(self.deprecated(child, &child_path)?),
                "wip" => {
                    self.wip(child, &child_path)?;
                    EntryChild::Wip
                }
                "param" => {
                    let param = self.param(child, &child_path)?;
                    if !indices.insert(param.index) {
                        return Err(self.fail(
                            &child_path,
                            format!("duplicate param index {} in entry '{}'", param.index, name),
                        ));
                    }
                    EntryChild::Param(param)
                }
                other => return Err(self.fail(&child_path, format!("unknown element <{}>", other))),
            };
            children.push(parsed);
        }

        Ok(EntryElement { name, value, children })
    }

    fn param(&self, node: &Element, path: &str) -> Result<EnumEntryParam, SchemaError> {
        self.check_attributes(node, path, PARAM_ATTRS)?;
        self.check_no_child_elements(node, path)?;

        Ok(EnumEntryParam {
            index: self
                .parsed_attribute(node, path, "index")?
                .ok_or_else(|| self.fail(path, "missing required attribute 'index'"))?,
            description: node.text_content(),
            label: owned_attribute(node, "label"),
            units: owned_attribute(node, "units"),
            enum_name: owned_attribute(node, "enum"),
            decimal_places: self.parsed_attribute(node, path, "decimalPlaces")?,
            increment: self.parsed_attribute(node, path, "increment")?,
            min_value: self.parsed_attribute(node, path, "minValue")?,
            max_value: self.parsed_attribute(node, path, "maxValue")?,
            default: self.parsed_attribute(node, path, "default")?,
            reserved: self.bool_attribute(node, path, "reserved")?.unwrap_or(false),
        })
    }

    fn deprecated(&self, node: &Element, path: &str) -> Result<Deprecation, SchemaError> {
        self.check_attributes(node, path, DEPRECATED_ATTRS)?;
        self.check_no_child_elements(node, path)?;
        let note = node.text_content();
        Ok(Deprecation {
            since: self.required_attribute(node, path, "since")?.to_string(),
            replaced_by: self.required_attribute(node, path, "replaced_by")?.to_string(),
            note: Some(note.trim().to_string()).filter(|n| !n.is_empty()),
        })
    }

    /// `<wip/>` may hold a free-text note but nothing else
    fn wip(&self, node: &Element, path: &str) -> Result<(), SchemaError> {
        self.check_attributes(node, path, &[])?;
        self.check_no_child_elements(node, path)
    }

    fn description(&self, node: &Element, path: &str) -> Result<String, SchemaError> {
        self.check_attributes(node, path, &[])?;
        self.check_no_child_elements(node, path)?;
        Ok(node.text_content())
    }

    /// Element children paired with their paths (`/parent/tag[n]`, 1-based per tag)
    fn elements<'a>(&self, node: &'a Element, path: &str) -> Result<Vec<(&'a Element, String)>, SchemaError> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut elements = Vec::new();

        for child in &node.children {
            match child {
                XMLNode::Element(element) => {
                    let count = counts.entry(element.name.as_str()).or_insert(0);
                    *count += 1;
                    elements.push((element, format!("{}/{}[{}]", path, element.name, count)));
                }
                XMLNode::Text(text) | XMLNode::CData(text) if !text.trim().is_empty() => {
                    return Err(self.fail(path, "unexpected text content"));
                }
                _ => {}
            }
        }

        Ok(elements)
    }

    fn check_attributes(&self, node: &Element, path: &str, allowed: &[&str]) -> Result<(), SchemaError> {
        match node.attributes.keys().filter(|name| !allowed.contains(&name.as_str())).min() {
            Some(name) => Err(self.fail(path, format!("unrecognized attribute '{}'", name))),
            None => Ok(()),
        }
    }

    fn check_no_child_elements(&self, node: &Element, path: &str) -> Result<(), SchemaError> {
        match node.child_elements().next() {
            Some(child) => Err(self.fail(path, format!("unexpected child element <{}>", child.name))),
            None => Ok(()),
        }
    }

    fn check_empty(&self, node: &Element, path: &str) -> Result<(), SchemaError> {
        self.check_no_child_elements(node, path)?;
        if node.text_content().trim().is_empty() {
            Ok(())
        } else {
            Err(self.fail(path, "element must be empty"))
        }
    }

    fn required_attribute<'a>(&self, node: &'a Element, path: &str, name: &str) -> Result<&'a str, SchemaError> {
        node.attribute(name)
            .ok_or_else(|| self.fail(path, format!("missing required attribute '{}'", name)))
    }

    fn parsed_attribute<T: FromStr>(&self, node: &Element, path: &str, name: &str) -> Result<Option<T>, SchemaError> {
        node.attribute(name)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|_| {
                    self.fail(path, format!("attribute '{}' has invalid value '{}'", name, raw))
                })
            })
            .transpose()
    }

    fn bool_attribute(&self, node: &Element, path: &str, name: &str) -> Result<Option<bool>, SchemaError> {
        node.attribute(name)
            .map(|raw| match raw.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(self.fail(
                    path,
                    format!("attribute '{}' must be a boolean, found '{}'", name, raw),
                )),
            })
            .transpose()
    }

    fn required_text(&self, node: &Element, path: &str) -> Result<String, SchemaError> {
        self.check_no_child_elements(node, path)?;
        let text = node.text_content().trim().to_string();
        if text.is_empty() {
            return Err(self.fail(path, "element must not be empty"));
        }
        Ok(text)
    }

    fn number_text(&self, node: &Element, path: &str) -> Result<u32, SchemaError> {
        self.check_attributes(node, path, &[])?;
        let text = self.required_text(node, path)?;
        text.parse()
            .map_err(|_| self.fail(path, format!("expected a non-negative integer, found '{}'", text)))
    }
}

fn owned_attribute(node: &Element, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}
