use crate::error::{RecommendError, Result};
use reflexion_graph::{NodeIndex, ReflexionGraph};
use std::collections::HashMap;
use std::path::PathBuf;

pub const SOURCE_NAME: &str = "Source.Name";
pub const SOURCE_FILE: &str = "Source.File";
pub const SOURCE_PATH: &str = "Source.Path";
pub const SOURCE_LINE: &str = "Source.Line";
pub const SOURCE_REGION_LENGTH: &str = "Source.Region_Length";

/// Provides the source text belonging to a node
pub trait NodeReader: Send + Sync {
    fn read_region(&self, graph: &ReflexionGraph, node: NodeIndex) -> Result<String>;
}

/// Reads the region of a node from the file named by its source attributes.
///
/// The file is `root/Source.Path/Source.File`. With `Source.Line` (1-based)
/// the region starts at that line and spans `Source.Region_Length` lines, or
/// runs to the end of the file without a length.
#[derive(Debug, Clone)]
pub struct FileRegionReader {
    root: PathBuf,
}

impl FileRegionReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, graph: &ReflexionGraph, node: NodeIndex) -> Result<PathBuf> {
        let data = graph.node_or_err(node)?;
        let file = data
            .string_attribute(SOURCE_FILE)
            .ok_or_else(|| RecommendError::node_reader(&data.id, "no Source.File attribute"))?;
        let mut path = self.root.clone();
        if let Some(dir) = data.string_attribute(SOURCE_PATH) {
            path.push(dir);
        }
        path.push(file);
        Ok(path)
    }
}

impl NodeReader for FileRegionReader {
    fn read_region(&self, graph: &ReflexionGraph, node: NodeIndex) -> Result<String> {
        let path = self.path_of(graph, node)?;
        let data = graph.node_or_err(node)?;
        let text = std::fs::read_to_string(&path).map_err(|e| {
            RecommendError::node_reader(&data.id, format!("{}: {e}", path.display()))
        })?;

        let Some(line) = data.int_attribute(SOURCE_LINE) else {
            return Ok(text);
        };
        let start = usize::try_from(line.max(1) - 1).unwrap_or(0);
        let lines = text.lines().skip(start);
        let region: Vec<&str> = match data.int_attribute(SOURCE_REGION_LENGTH) {
            Some(length) => lines.take(usize::try_from(length.max(1)).unwrap_or(1)).collect(),
            None => lines.collect(),
        };
        log::trace!("read {} lines of {} for {}", region.len(), path.display(), data.id);
        Ok(region.join("\n"))
    }
}

/// Canned text per node id
#[derive(Debug, Clone, Default)]
pub struct LookupNodeReader {
    texts: HashMap<String, String>,
    default_text: String,
}

impl LookupNodeReader {
    /// Reader returning `default_text` for every node without own text
    pub fn new(default_text: impl Into<String>) -> Self {
        Self {
            texts: HashMap::new(),
            default_text: default_text.into(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, node: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(node, text);
        self
    }

    pub fn insert(&mut self, node: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(node.into(), text.into());
    }
}

impl NodeReader for LookupNodeReader {
    fn read_region(&self, graph: &ReflexionGraph, node: NodeIndex) -> Result<String> {
        let data = graph.node_or_err(node)?;
        Ok(self
            .texts
            .get(&data.id)
            .unwrap_or(&self.default_text)
            .clone())
    }
}
