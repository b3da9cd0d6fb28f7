//! Dialect Loading
//!
//! Gates and models the seed files, expands their includes, assigns
//! dependency lists and runs the cross-file validators.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::checksum::Checksum;
use crate::config::MavlibConfig;
use crate::error::{DialectError, Result};
use crate::gate::{SchemaGate, XmlSchemaGate};
use crate::model::{DialectFile, DialectSet};
use crate::validators::{DialectValidator, UniqueMessageIdsAcrossDependencies};

use super::resolver::{absolutize, assign_dependencies, check_unique, IncludeResolver, Uniqueness};
use super::IncludeGraph;

/// Loads dialect files and everything they include
pub struct DialectLoader {
    gate: Box<dyn SchemaGate>,
    validators: Vec<Box<dyn DialectValidator>>,
}

impl Default for DialectLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectLoader {
    /// XML gate with default limits and the built-in uniqueness validator
    pub fn new() -> Self {
        Self::with_gate(XmlSchemaGate::new())
    }

    /// Use a custom schema gate; the built-in uniqueness validator is still registered
    pub fn with_gate(gate: impl SchemaGate + 'static) -> Self {
        Self {
            gate: Box::new(gate),
            validators: vec![Box::new(UniqueMessageIdsAcrossDependencies)],
        }
    }

    /// Apply the `[validation]` section
    pub fn from_config(config: &MavlibConfig) -> Self {
        let gate = XmlSchemaGate::new().with_max_message_id(config.validation.max_message_id);
        let mut loader = Self::with_gate(gate);
        if !config.validation.unique_messages {
            loader.validators.clear();
        }
        loader
    }

    /// Run `validator` after the ones already registered
    pub fn add_validator(&mut self, validator: impl DialectValidator + 'static) -> &mut Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Gate and model one file without looking at its includes
    pub fn load_single(&self, path: &Path) -> Result<DialectFile> {
        let absolute = absolutize(path)?;
        let document = self.gate.validate_and_parse(&absolute)?;
        DialectFile::from_document(absolute, document)
    }

    /// Load `paths` and their include closure.
    ///
    /// Fails on the first schema, resolution or validation error; nothing is
    /// returned for the files that did load.
    pub fn load<P: AsRef<Path>>(&self, paths: impl IntoIterator<Item = P>) -> Result<ResolvedDialects> {
        let mut seed = DialectSet::new();
        for path in paths {
            let file = self.load_single(path.as_ref())?;
            match check_unique(&seed, file.filename(), file.absolute_path()) {
                Uniqueness::Unique => {
                    seed.insert(file);
                }
                Uniqueness::Duplicate => {
                    debug!("Ignoring repeated input {}", file.absolute_path().display());
                }
                Uniqueness::Conflict { existing } => {
                    error!("Two input files are named '{}'", file.filename());
                    return Err(DialectError::ConflictingDuplicate {
                        filename: file.filename().to_string(),
                        existing,
                        conflicting: file.absolute_path().to_path_buf(),
                    });
                }
            }
        }

        let resolver = IncludeResolver::new(self.gate.as_ref());
        let (mut files, graph) = resolver.expand(seed)?;
        assign_dependencies(&mut files, &graph);

        for validator in &self.validators {
            if let Err(source) = validator.validate(&files, &graph) {
                error!("{} failed validation", validator.name());
                return Err(DialectError::Validation {
                    validator: validator.name().to_string(),
                    source,
                });
            }
        }

        info!(
            "Resolved {} dialect files with {} includes",
            files.len(),
            graph.edge_count()
        );
        Ok(ResolvedDialects { files, graph })
    }
}

/// Every dialect of a successful run plus their include graph
#[derive(Debug, Clone)]
pub struct ResolvedDialects {
    files: DialectSet,
    graph: IncludeGraph,
}

impl ResolvedDialects {
    pub fn get(&self, filename: &str) -> Option<&DialectFile> {
        self.files.get(filename)
    }

    pub fn files(&self) -> &DialectSet {
        &self.files
    }

    pub fn graph(&self) -> &IncludeGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_parts(self) -> (DialectSet, IncludeGraph) {
        (self.files, self.graph)
    }

    /// Files ordered so each comes after everything it includes
    pub fn generation_order(&self) -> Vec<&DialectFile> {
        self.graph
            .generation_order()
            .iter()
            .filter_map(|filename| self.files.get(filename))
            .collect()
    }

    /// Digest over every file's source digest, in filename order
    pub fn bundle_hash(&self) -> Checksum {
        Checksum::combine(self.files.files().filter_map(DialectFile::digest))
    }
}

/// `*.xml` files under `dir`, sorted by path
pub fn collect_dialects(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if path.is_file() && path.extension().map(|ext| ext == "xml").unwrap_or(false) {
            found.push(path.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}
