use std::collections::BTreeSet;

use tracing::error;

use crate::graph::IncludeGraph;
use crate::model::{Dialect, DialectSet};

use super::{DialectValidator, ValidationFailure};

/// Message ids and names must be unique across a file and everything it
/// includes, directly or transitively.
///
/// Uniqueness inside one file is already enforced by the schema gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueMessageIdsAcrossDependencies;

impl DialectValidator for UniqueMessageIdsAcrossDependencies {
    fn name(&self) -> &str {
        "UniqueMessageIdsAcrossDependencies"
    }

    fn validate(&self, files: &DialectSet, _graph: &IncludeGraph) -> Result<(), ValidationFailure> {
        for (filename, file) in files.iter() {
            let Some(dependencies) = file.dependencies().filter(|deps| !deps.is_empty()) else {
                continue;
            };

            let mut ids = message_ids(file.dialect());
            let mut names = message_names(file.dialect());
            let mut processed = vec![filename];

            for dependency in dependencies {
                let Some(dep_file) = files.get(dependency) else {
                    return Err(ValidationFailure::Custom {
                        reason: format!("dependency '{}' of '{}' was never loaded", dependency, filename),
                    });
                };
                let dep_ids = message_ids(dep_file.dialect());
                let dep_names = message_names(dep_file.dialect());

                let conflicting_ids: Vec<u32> = ids.intersection(&dep_ids).copied().collect();
                if !conflicting_ids.is_empty() {
                    error!(
                        "Conflicting id(s) {:?} in {}, also declared in one of {:?}",
                        conflicting_ids, dependency, processed
                    );
                    return Err(ValidationFailure::DuplicateMessageIds {
                        file: filename.to_string(),
                        dependency: dependency.clone(),
                        ids: conflicting_ids,
                    });
                }

                let conflicting_names: Vec<String> = names.intersection(&dep_names).cloned().collect();
                if !conflicting_names.is_empty() {
                    error!(
                        "Conflicting name(s) {:?} in {}, also declared in one of {:?}",
                        conflicting_names, dependency, processed
                    );
                    return Err(ValidationFailure::DuplicateMessageNames {
                        file: filename.to_string(),
                        dependency: dependency.clone(),
                        names: conflicting_names,
                    });
                }

                ids.extend(dep_ids);
                names.extend(dep_names);
                processed.push(dependency);
            }
        }
        Ok(())
    }
}

fn message_ids(dialect: &Dialect) -> BTreeSet<u32> {
    dialect.messages.iter().map(|m| m.id()).collect()
}

fn message_names(dialect: &Dialect) -> BTreeSet<String> {
    dialect.messages.iter().map(|m| m.name().to_string()).collect()
}
