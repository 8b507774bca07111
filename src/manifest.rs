//! Helm chart (`Chart.yaml`) reading and writing.
//!
//! The document is kept as a generic YAML value so keys relsync does not know
//! about survive a load/save cycle.

use crate::error::{RelsyncError, Result};
use indexmap::IndexMap;
use serde_yml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// A loaded chart document
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    doc: Mapping,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Chart {
    /// Read and parse a chart file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RelsyncError::manifest(format!("Cannot read chart {}: {}", path.display(), e))
        })?;
        Chart::from_yaml(&raw)
            .map_err(|e| RelsyncError::manifest(format!("{}: {}", path.display(), e)))
    }

    /// Parse chart YAML; an empty document is an empty chart
    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Chart { doc: Mapping::new() });
        }
        match serde_yml::from_str::<Value>(raw)? {
            Value::Mapping(doc) => Ok(Chart { doc }),
            Value::Null => Ok(Chart { doc: Mapping::new() }),
            _ => Err(RelsyncError::manifest("chart document is not a mapping")),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(&self.doc)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    fn field(&self, key: &str) -> Option<String> {
        self.doc.get(key).and_then(scalar_to_string)
    }

    pub fn name(&self) -> Option<String> {
        self.field("name")
    }

    pub fn version(&self) -> Option<String> {
        self.field("version")
    }

    pub fn app_version(&self) -> Option<String> {
        self.field("appVersion")
    }

    pub fn set_version(&mut self, version: &str) {
        self.doc.insert(Value::from("version"), Value::from(version));
    }

    pub fn set_app_version(&mut self, version: &str) {
        self.doc.insert(Value::from("appVersion"), Value::from(version));
    }

    /// Dependency name -> recorded version, in document order
    pub fn dependency_versions(&self) -> IndexMap<String, String> {
        let Some(deps) = self.doc.get("dependencies").and_then(Value::as_sequence) else {
            return IndexMap::new();
        };

        deps.iter()
            .filter_map(|dep| {
                let name = dep.get("name").and_then(scalar_to_string)?;
                let version = dep.get("version").and_then(scalar_to_string)?;
                Some((name, version))
            })
            .collect()
    }

    /// Set the version of every dependency entry named `name`; false if none matched
    pub fn set_dependency_version(&mut self, name: &str, version: &str) -> bool {
        let Some(deps) = self
            .doc
            .get_mut("dependencies")
            .and_then(Value::as_sequence_mut)
        else {
            return false;
        };

        let mut updated = false;
        for dep in deps.iter_mut() {
            let matches = dep.get("name").and_then(scalar_to_string).as_deref() == Some(name);
            if let (true, Some(entry)) = (matches, dep.as_mapping_mut()) {
                entry.insert(Value::from("version"), Value::from(version));
                updated = true;
            }
        }
        updated
    }
}

/// Version of the chart at `path`, or `None` when the file does not exist
pub fn chart_version(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Chart::load(path)?.version())
}

/// Copy `path` to `<path>.bak`
pub fn backup(path: &Path) -> Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(".bak");
    let target = PathBuf::from(target);
    fs::copy(path, &target)?;
    Ok(target)
}
