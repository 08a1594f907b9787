use crate::error::{RecommendError, Result};
use crate::reader::{NodeReader, SOURCE_FILE, SOURCE_NAME};
use reflexion_graph::{NodeIndex, ReflexionGraph};
use reflexion_terms::{Document, MergingType, TermPipeline, TokenLanguage};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Term documents of nodes and dependencies, cached by node id
pub struct TermExtractor {
    reader: Arc<dyn NodeReader>,
    pipeline: TermPipeline,
    language: Option<TokenLanguage>,
    use_as_set: bool,
    node_documents: HashMap<String, Document>,
    merged_documents: HashMap<String, Document>,
}

impl TermExtractor {
    pub fn new(reader: Arc<dyn NodeReader>, language: Option<TokenLanguage>, use_as_set: bool) -> Self {
        Self {
            reader,
            pipeline: TermPipeline::new(),
            language,
            use_as_set,
            node_documents: HashMap::new(),
            merged_documents: HashMap::new(),
        }
    }

    /// Terms of the source region of `node`
    pub fn standard_document(&mut self, graph: &ReflexionGraph, node: NodeIndex) -> Result<Document> {
        let id = graph.node_id(node);
        if let Some(doc) = self.node_documents.get(id) {
            return Ok(doc.clone());
        }

        let text = match self.reader.read_region(graph, node) {
            Ok(text) => text,
            Err(RecommendError::NodeReader { node: failed, reason }) => {
                log::warn!("no source terms for {failed}: {reason}");
                String::new()
            }
            Err(e) => return Err(e),
        };
        let mut doc = self.pipeline.document(&text, self.language_of(graph, node))?;
        doc.use_as_set(self.use_as_set);
        self.node_documents.insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    pub fn add_standard_terms(
        &mut self,
        graph: &ReflexionGraph,
        node: NodeIndex,
        doc: &mut Document,
    ) -> Result<()> {
        let terms = self.standard_document(graph, node)?;
        doc.add_words(&terms);
        Ok(())
    }

    /// Terms of both ends of a dependency, combined with `mode`
    pub fn merged_terms(
        &mut self,
        graph: &ReflexionGraph,
        source: NodeIndex,
        target: NodeIndex,
        mode: MergingType,
    ) -> Result<Document> {
        let key = format!(
            "{}{}{}",
            graph.node_id(source),
            mode.as_str(),
            graph.node_id(target)
        );
        if let Some(doc) = self.merged_documents.get(&key) {
            return Ok(doc.clone());
        }

        let source_doc = self.standard_document(graph, source)?;
        let target_doc = self.standard_document(graph, target)?;
        let mut merged = Document::merge(&source_doc, &target_doc, mode);
        merged.use_as_set(self.use_as_set);
        self.merged_documents.insert(key, merged.clone());
        Ok(merged)
    }

    /// Names of enclosing classes, packages and files
    pub fn add_words_of_ascendants(&self, graph: &ReflexionGraph, node: NodeIndex, doc: &mut Document) {
        for ancestor in graph.ascendants(node) {
            let Some(data) = graph.node(ancestor) else {
                continue;
            };
            let name = match data.node_type.as_str() {
                "Class" | "Package" => data.string_attribute(SOURCE_NAME),
                "File" => data.string_attribute(SOURCE_FILE),
                _ => None,
            };
            if let Some(name) = name {
                for term in self.pipeline.terms_of_words(name) {
                    doc.add_word(term);
                }
            }
        }
    }

    pub fn clear_document_cache(&mut self) {
        self.node_documents.clear();
        self.merged_documents.clear();
    }

    pub fn cached_documents(&self) -> usize {
        self.node_documents.len() + self.merged_documents.len()
    }

    fn language_of(&self, graph: &ReflexionGraph, node: NodeIndex) -> TokenLanguage {
        if let Some(language) = self.language {
            return language;
        }
        graph
            .node(node)
            .and_then(|data| data.string_attribute(SOURCE_FILE))
            .map(TokenLanguage::from_path)
            .unwrap_or_default()
    }
}

impl fmt::Debug for TermExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermExtractor")
            .field("language", &self.language)
            .field("use_as_set", &self.use_as_set)
            .field("node_documents", &self.node_documents.len())
            .field("merged_documents", &self.merged_documents.len())
            .finish()
    }
}
