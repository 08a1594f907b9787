//! # Reflexion Graph
//!
//! Architecture model, implementation dependencies and the mapping between them,
//! with reflexion states derived from the current mapping.
//!
//! ## Features
//!
//! - **Containment hierarchy** - index-based parent/children links per subgraph
//! - **Mapping** - explicit and inherited `maps_to`, notifying and silent mutations
//! - **Edge states** - Allowed/ImplicitlyAllowed/Divergent/Unmapped for implementation
//!   dependencies, Convergent/Absent for architecture dependencies
//! - **Change events** - recorded by notifying operations, drained by listeners
//! - **Mapping probes** - hypothetical mappings restored on drop
//!
//! ## Architecture
//!
//! ```text
//! GraphSpec (JSON)
//!     │
//!     └──> ReflexionGraph (petgraph StableDiGraph)
//!            ├─ Nodes: architecture clusters, implementation entities
//!            ├─ Edges: architecture and implementation dependencies
//!            ├─ Mapping: implementation node -> cluster
//!            │
//!            ├──> edge_state(edge)          (pure function of the mapping)
//!            ├──> probe_mapping(c, k)       (silent, undone on drop)
//!            └──> take_events()             (MapsTo, EdgeState, Architecture*)
//! ```

mod error;
mod event;
mod graph;
mod mapping;
mod spec;
mod state;
mod types;

pub use error::{GraphError, Result};
pub use event::{ChangeEvent, ChangeType, EdgeSnapshot};
pub use graph::SubtreeEdge;
pub use mapping::MappingProbe;
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
pub use spec::{EdgeSpec, GraphSpec, MappingSpec, NodeSpec};
pub use types::{GraphEdge, GraphNode, ReflexionGraph, State, Subgraph, DEFAULT_EDGE_TYPE};
