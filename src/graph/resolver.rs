//! Include expansion
//!
//! Expands a seed set of dialect files into the transitive closure of their
//! includes, building the [`IncludeGraph`] as it goes. Expansion is iterative
//! and breadth-first over files discovered in the previous layer.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, error};

use crate::error::{DialectError, Result};
use crate::gate::SchemaGate;
use crate::model::{filename_of, DialectFile, DialectSet};

use super::IncludeGraph;

/// Outcome of checking a candidate file against the files already known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uniqueness {
    /// No file with this filename yet
    Unique,
    /// Same filename at the same absolute path, safe to reuse
    Duplicate,
    /// Same filename at a different absolute path
    Conflict { existing: PathBuf },
}

/// Check `filename` at `absolute_path` against `files`.
///
/// Generated artifacts are named after the filename alone, so two distinct
/// files sharing one can never coexist in a run.
pub fn check_unique(files: &DialectSet, filename: &str, absolute_path: &Path) -> Uniqueness {
    match files.get(filename) {
        None => Uniqueness::Unique,
        Some(existing) if existing.absolute_path() == absolute_path => Uniqueness::Duplicate,
        Some(existing) => Uniqueness::Conflict {
            existing: existing.absolute_path().to_path_buf(),
        },
    }
}

/// Resolve an include as written against the directory of the including file.
///
/// Both `/` and `\` separate components regardless of platform.
pub fn resolve_include_path(including_file: &Path, include: &str) -> PathBuf {
    let mut path = including_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    for part in include.split(['/', '\\']).filter(|part| !part.is_empty()) {
        path.push(part);
    }
    normalize(&path)
}

/// Make `path` absolute against the working directory, normalised lexically
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Drop `.` and fold `..` without touching the filesystem
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expands include closures through a [`SchemaGate`].
///
/// Holds no state between runs; each [`expand`](Self::expand) call owns its
/// own mapping and graph.
pub struct IncludeResolver<'g> {
    gate: &'g dyn SchemaGate,
}

impl<'g> IncludeResolver<'g> {
    pub fn new(gate: &'g dyn SchemaGate) -> Self {
        Self { gate }
    }

    /// Expand `seed` to every transitively included file.
    ///
    /// Newly discovered files are gated and modelled before their own
    /// includes are visited. The first unresolvable include, filename
    /// conflict or cycle aborts the run.
    pub fn expand(&self, seed: DialectSet) -> Result<(DialectSet, IncludeGraph)> {
        let mut files = seed;
        let mut graph = IncludeGraph::new();
        let mut layer: Vec<String> = files.filenames().map(str::to_string).collect();

        while !layer.is_empty() {
            let mut next_layer = Vec::new();

            for current in layer {
                debug!("Expanding includes in dialect {}", current);
                let Some(file) = files.get(&current) else {
                    continue;
                };
                let including_path = file.absolute_path().to_path_buf();
                let includes = file.dialect().includes.clone();

                graph.add_node(&current);

                for include in &includes {
                    let target = resolve_include_path(&including_path, include);
                    if !target.is_file() {
                        error!(
                            "Failed to resolve include '{}' in definition '{}' to a file",
                            include, current
                        );
                        return Err(DialectError::UnresolvableInclude {
                            including: current.clone(),
                            include: include.clone(),
                            expected: target,
                        });
                    }

                    let included = filename_of(&target);
                    match check_unique(&files, &included, &target) {
                        Uniqueness::Conflict { existing } => {
                            error!(
                                "Second non-identical path for '{}' originated from include '{}' in '{}'",
                                included, include, current
                            );
                            return Err(DialectError::ConflictingDuplicate {
                                filename: included,
                                existing,
                                conflicting: target,
                            });
                        }
                        Uniqueness::Duplicate => {}
                        Uniqueness::Unique => {
                            let document = self.gate.validate_and_parse(&target)?;
                            files.insert(DialectFile::from_document(&target, document)?);
                            next_layer.push(included.clone());
                        }
                    }

                    debug!("Create edge {} - {}", current, included);
                    if let Err(err) = graph.add_include(&current, &included) {
                        error!("{}", err);
                        return Err(err);
                    }
                }
            }

            layer = next_layer;
        }

        Ok((files, graph))
    }
}

/// Store each file's transitive include list, taken from `graph`
pub fn assign_dependencies(files: &mut DialectSet, graph: &IncludeGraph) {
    for filename in graph.nodes() {
        let dependencies = graph.dependencies(filename);
        debug!("{} uses the following includes: {:?}", filename, dependencies);
        if let Some(file) = files.get_mut(filename) {
            file.set_dependencies(dependencies);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;
    use crate::gate::{DialectChild, DialectDocument, SchemaError};
    use crate::model::Dialect;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Serves canned includes per filename and records every call
    #[derive(Default)]
    struct StubGate {
        includes: HashMap<String, Vec<String>>,
        calls: RefCell<Vec<String>>,
    }

    impl StubGate {
        fn with(mut self, filename: &str, includes: &[&str]) -> Self {
            self.includes.insert(
                filename.to_string(),
                includes.iter().map(|s| s.to_string()).collect(),
            );
            self
        }
    }

    impl SchemaGate for StubGate {
        fn validate_and_parse(&self, path: &Path) -> std::result::Result<DialectDocument, SchemaError> {
            let filename = filename_of(path);
            self.calls.borrow_mut().push(filename.clone());
            let children = self
                .includes
                .get(&filename)
                .map(|incs| incs.iter().cloned().map(DialectChild::Include).collect())
                .unwrap_or_default();
            Ok(DialectDocument {
                path: path.to_path_buf(),
                digest: Checksum::from_bytes(filename.as_bytes()),
                children,
            })
        }
    }

    fn touch(dir: &TempDir, relative: &str) -> PathBuf {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "<mavlink/>").unwrap();
        path
    }

    fn seed(gate: &StubGate, paths: &[PathBuf]) -> DialectSet {
        paths
            .iter()
            .map(|p| DialectFile::from_document(p, gate.validate_and_parse(p).unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d.xml")), PathBuf::from("/a/c/d.xml"));
        assert_eq!(normalize(Path::new("/../x.xml")), PathBuf::from("/x.xml"));
        assert_eq!(normalize(Path::new("../x/../y")), PathBuf::from("../y"));
    }

    #[test]
    fn test_resolve_include_path_both_separators() {
        let including = Path::new("/defs/v1/top.xml");
        assert_eq!(
            resolve_include_path(including, "../common/common.xml"),
            PathBuf::from("/defs/common/common.xml")
        );
        assert_eq!(
            resolve_include_path(including, "..\\common\\common.xml"),
            PathBuf::from("/defs/common/common.xml")
        );
        assert_eq!(resolve_include_path(including, "minimal.xml"), PathBuf::from("/defs/v1/minimal.xml"));
    }

    #[test]
    fn test_check_unique() {
        let files: DialectSet = [DialectFile::new("/a/common.xml", Dialect::default())]
            .into_iter()
            .collect();
        assert_eq!(check_unique(&files, "other.xml", Path::new("/a/other.xml")), Uniqueness::Unique);
        assert_eq!(
            check_unique(&files, "common.xml", Path::new("/a/common.xml")),
            Uniqueness::Duplicate
        );
        assert_eq!(
            check_unique(&files, "common.xml", Path::new("/b/common.xml")),
            Uniqueness::Conflict {
                existing: PathBuf::from("/a/common.xml")
            }
        );
    }

    #[test]
    fn test_expand_chain_gates_each_file_once() {
        let dir = TempDir::new().unwrap();
        let top = touch(&dir, "top.xml");
        touch(&dir, "mid.xml");
        touch(&dir, "leaf.xml");

        let gate = StubGate::default()
            .with("top.xml", &["mid.xml", "leaf.xml"])
            .with("mid.xml", &["leaf.xml"]);
        let seed = seed(&gate, &[top]);
        gate.calls.borrow_mut().clear();

        let (mut files, graph) = IncludeResolver::new(&gate).expand(seed).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(*gate.calls.borrow(), vec!["mid.xml", "leaf.xml"]);

        assign_dependencies(&mut files, &graph);
        let mut top_deps = files.get("top.xml").unwrap().dependencies().unwrap().to_vec();
        top_deps.sort();
        assert_eq!(top_deps, vec!["leaf.xml", "mid.xml"]);
        assert_eq!(files.get("mid.xml").unwrap().dependencies().unwrap(), ["leaf.xml"]);
        assert!(files.get("leaf.xml").unwrap().dependencies().unwrap().is_empty());
    }

    #[test]
    fn test_expand_missing_include() {
        let dir = TempDir::new().unwrap();
        let top = touch(&dir, "top.xml");
        let gate = StubGate::default().with("top.xml", &["nowhere/missing.xml"]);
        let seed = seed(&gate, &[top]);

        match IncludeResolver::new(&gate).expand(seed) {
            Err(DialectError::UnresolvableInclude { including, include, expected }) => {
                assert_eq!(including, "top.xml");
                assert_eq!(include, "nowhere/missing.xml");
                assert!(expected.ends_with("nowhere/missing.xml"));
            }
            other => panic!("Expected UnresolvableInclude, got {:?}", other),
        }
    }

    #[test]
    fn test_expand_conflicting_duplicate() {
        let dir = TempDir::new().unwrap();
        let top = touch(&dir, "top.xml");
        touch(&dir, "a/common.xml");
        touch(&dir, "b/common.xml");
        let gate = StubGate::default().with("top.xml", &["a/common.xml", "b/common.xml"]);
        let seed = seed(&gate, &[top]);

        match IncludeResolver::new(&gate).expand(seed) {
            Err(DialectError::ConflictingDuplicate { filename, existing, conflicting }) => {
                assert_eq!(filename, "common.xml");
                assert!(existing.ends_with("a/common.xml"));
                assert!(conflicting.ends_with("b/common.xml"));
            }
            other => panic!("Expected ConflictingDuplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_expand_transitive_cycle() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "a.xml");
        touch(&dir, "b.xml");
        let gate = StubGate::default().with("a.xml", &["b.xml"]).with("b.xml", &["a.xml"]);
        let seed = seed(&gate, &[a]);

        match IncludeResolver::new(&gate).expand(seed) {
            Err(DialectError::CircularDependency { from, to }) => {
                assert_eq!(from, "b.xml");
                assert_eq!(to, "a.xml");
            }
            other => panic!("Expected CircularDependency, got {:?}", other),
        }
    }
}
