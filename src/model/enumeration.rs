//! Enumerations, their entries and entry parameters

use super::names::{format_name, NameFormat};
use super::Deprecation;

/// A `<param>` attached to an enum entry (typically a MAV_CMD argument)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumEntryParam {
    pub index: u8,
    pub description: String,
    pub label: Option<String>,
    pub units: Option<String>,
    /// Enum the parameter's values come from
    pub enum_name: Option<String>,
    pub decimal_places: Option<u8>,
    pub increment: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub default: Option<f64>,
    /// Reserved params are unused; absent means `false`
    pub reserved: bool,
}

impl EnumEntryParam {
    /// `param <index>: <description>`, continuation lines indented
    pub fn doc_string(&self, continuation_indent: usize) -> String {
        let indent = format!("\n{}", " ".repeat(continuation_indent));
        format!("param {}: {}", self.index, self.description.replace('\n', &indent))
    }
}

/// One named value of an enum
#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntry {
    pub name: String,
    /// Value as written in the dialect file, so `0x10` stays `0x10`
    pub value: String,
    pub description: Option<String>,
    pub params: Vec<EnumEntryParam>,
    pub deprecation: Option<Deprecation>,
    pub wip: bool,
}

impl EnumEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
            params: Vec::new(),
            deprecation: None,
            wip: false,
        }
    }

    /// Numeric interpretation of the source value.
    ///
    /// Understands decimal, `0x` hex, `0b` binary and `2**N`; `None` otherwise.
    pub fn numeric_value(&self) -> Option<u64> {
        let value = self.value.trim();
        if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16).ok()
        } else if let Some(bin) = value.strip_prefix("0b").or_else(|| value.strip_prefix("0B")) {
            u64::from_str_radix(bin, 2).ok()
        } else if let Some((base, exp)) = value.split_once("**") {
            let base: u64 = base.trim().parse().ok()?;
            let exp: u32 = exp.trim().parse().ok()?;
            base.checked_pow(exp)
        } else {
            value.parse().ok()
        }
    }

    pub fn name_as(&self, format: NameFormat) -> String {
        format_name(&self.name, format)
    }
}

/// An `<enum>` definition
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub description: Option<String>,
    pub bitmask: bool,
    pub entries: Vec<EnumEntry>,
    pub deprecation: Option<Deprecation>,
    pub wip: bool,
}

impl Enum {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            bitmask: false,
            entries: Vec::new(),
            deprecation: None,
            wip: false,
        }
    }

    pub fn entry(&self, name: &str) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn name_as(&self, format: NameFormat) -> String {
        format_name(&self.name, format)
    }
}
