//! Hierarchical histogram container persisted as JSON.
//!
//! A container is a tree of directories holding named objects, addressed by
//! `/`-separated paths (`bfragAnalysis/xb_lead_B`). Files are read completely
//! and closed before anything is returned; every getter hands out an owned
//! clone, so callers never alias container state.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::hist::{Graph, Hist1D, Hist2D};

pub const FORMAT_VERSION: u32 = 1;
pub const TOOL_NAME: &str = "bfrag";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerHeader {
    pub tool: String,
    pub format_version: u32,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub entries: BTreeMap<String, Object>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Object {
    Dir(Directory),
    Hist1D(Hist1D),
    Hist2D(Hist2D),
    Graph(Graph),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Object::Dir(_) => "directory",
            Object::Hist1D(_) => "1-D histogram",
            Object::Hist2D(_) => "2-D histogram",
            Object::Graph(_) => "graph",
        }
    }
}

impl From<Hist1D> for Object {
    fn from(h: Hist1D) -> Self {
        Object::Hist1D(h)
    }
}

impl From<Hist2D> for Object {
    fn from(h: Hist2D) -> Self {
        Object::Hist2D(h)
    }
}

impl From<Graph> for Object {
    fn from(g: Graph) -> Self {
        Object::Graph(g)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    header: Option<ContainerHeader>,
    #[serde(default)]
    root: Directory,
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a whole container file. The file handle is dropped before return.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::input(format!("Failed to open '{}': {e}", path.display())))?;
        let container: Container = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::input(format!("Invalid container '{}': {e}", path.display())))?;
        if let Some(h) = &container.header {
            if h.format_version > FORMAT_VERSION {
                return Err(AppError::input(format!(
                    "'{}' has format version {} (supported: {FORMAT_VERSION}).",
                    path.display(),
                    h.format_version
                )));
            }
        }
        Ok(container)
    }

    pub fn header(&self) -> Option<&ContainerHeader> {
        self.header.as_ref()
    }

    pub fn get(&self, path: &str) -> Option<&Object> {
        let parts = split(path);
        let (last, dirs) = parts.split_last()?;
        let mut dir = &self.root;
        for part in dirs {
            match dir.entries.get(*part)? {
                Object::Dir(d) => dir = d,
                _ => return None,
            }
        }
        dir.entries.get(*last)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    fn require(&self, path: &str) -> Result<&Object, AppError> {
        self.get(path)
            .ok_or_else(|| AppError::input(format!("Object '{path}' not found.")))
    }

    fn wrong_type(path: &str, want: &str, got: &Object) -> AppError {
        AppError::input(format!("Object '{path}' is a {}, expected a {want}.", got.kind()))
    }

    pub fn get_hist1d(&self, path: &str) -> Result<Hist1D, AppError> {
        match self.require(path)? {
            Object::Hist1D(h) => Ok(h.clone()),
            other => Err(Self::wrong_type(path, "1-D histogram", other)),
        }
    }

    pub fn get_hist2d(&self, path: &str) -> Result<Hist2D, AppError> {
        match self.require(path)? {
            Object::Hist2D(h) => Ok(h.clone()),
            other => Err(Self::wrong_type(path, "2-D histogram", other)),
        }
    }

    pub fn get_graph(&self, path: &str) -> Result<Graph, AppError> {
        match self.require(path)? {
            Object::Graph(g) => Ok(g.clone()),
            other => Err(Self::wrong_type(path, "graph", other)),
        }
    }

    /// Names directly below `dir` (`""` is the root). Missing dir yields nothing.
    pub fn list(&self, dir: &str) -> Vec<String> {
        let entries = if split(dir).is_empty() {
            Some(&self.root.entries)
        } else {
            match self.get(dir) {
                Some(Object::Dir(d)) => Some(&d.entries),
                _ => None,
            }
        };
        entries
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Store `object` at `path`, creating intermediate directories and
    /// replacing any object already stored there.
    pub fn put(&mut self, path: &str, object: impl Into<Object>) -> Result<(), AppError> {
        let parts = split(path);
        let Some((last, dirs)) = parts.split_last() else {
            return Err(AppError::consistency("Cannot store an object at an empty path."));
        };
        let mut dir = &mut self.root;
        for part in dirs {
            let entry = dir
                .entries
                .entry(part.to_string())
                .or_insert_with(|| Object::Dir(Directory::default()));
            dir = match entry {
                Object::Dir(d) => d,
                other => {
                    return Err(AppError::consistency(format!(
                        "Cannot store '{path}': '{part}' is a {}.",
                        other.kind()
                    )));
                }
            };
        }
        dir.entries.insert(last.to_string(), object.into());
        Ok(())
    }

    /// Serialize to `path` with a fresh header. The file is flushed and
    /// closed before this returns.
    pub fn write(&mut self, path: &Path) -> Result<(), AppError> {
        self.header = Some(ContainerHeader {
            tool: TOOL_NAME.to_string(),
            format_version: FORMAT_VERSION,
            created_utc: Utc::now(),
        });
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::input(format!("Failed to create directory '{}': {e}", parent.display()))
            })?;
        }
        let file = File::create(path)
            .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, self)
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
        out.flush()
            .map_err(|e| AppError::input(format!("Failed to flush '{}': {e}", path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist::Axis;

    fn hist() -> Hist1D {
        Hist1D::from_counts("h", Axis::uniform(3, 0.0, 1.5).unwrap(), vec![1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn put_creates_directories_and_get_clones() {
        let mut c = Container::new();
        c.put("a/b/h", hist()).unwrap();
        assert_eq!(c.list(""), vec!["a"]);
        assert_eq!(c.list("a"), vec!["b"]);
        assert_eq!(c.get_hist1d("a/b/h").unwrap(), hist());
        assert!(matches!(c.get("a/b"), Some(Object::Dir(_))));
    }

    #[test]
    fn missing_and_mistyped_objects_are_input_errors() {
        let mut c = Container::new();
        c.put("d/h", hist()).unwrap();
        let err = c.get_hist2d("d/h").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        assert!(err.to_string().contains("d/h"));
        assert!(c.get_graph("d/nothing").unwrap_err().to_string().contains("d/nothing"));
    }

    #[test]
    fn cannot_nest_below_a_histogram() {
        let mut c = Container::new();
        c.put("h", hist()).unwrap();
        assert!(c.put("h/x", hist()).is_err());
    }

    #[test]
    fn write_then_open_restores_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("c.json");
        let mut c = Container::new();
        c.put("bfragAnalysis/h", hist()).unwrap();
        let g = Graph::new("g", vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        c.put("g", g.clone()).unwrap();
        c.write(&path).unwrap();

        let back = Container::open(&path).unwrap();
        assert_eq!(back.header().unwrap().tool, TOOL_NAME);
        assert_eq!(back.get_hist1d("bfragAnalysis/h").unwrap(), hist());
        assert_eq!(back.get_graph("g").unwrap(), g);
    }

    #[test]
    fn open_missing_file_is_input_error() {
        let err = Container::open(Path::new("/nonexistent/bfrag.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
