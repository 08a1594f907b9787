use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(String),

    #[error("{element} is not in the {expected} subgraph")]
    NotInSubgraph { element: String, expected: String },

    #[error("Node {node} is already explicitly mapped to {cluster}")]
    AlreadyMapped { node: String, cluster: String },

    #[error("Node {0} is not explicitly mapped")]
    NotMapped(String),

    #[error("Reparenting {child} under {parent} would create a hierarchy cycle")]
    HierarchyCycle { child: String, parent: String },

    #[error("Invalid graph spec: {0}")]
    Spec(#[from] serde_json::Error),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl GraphError {
    pub fn not_in_subgraph(element: impl Into<String>, expected: crate::Subgraph) -> Self {
        Self::NotInSubgraph {
            element: element.into(),
            expected: expected.to_string(),
        }
    }
}
