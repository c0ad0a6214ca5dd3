// Dependency Graph (C4, §4.4).

pub mod builder;
pub mod model;
pub mod sorter;
pub mod stats;

pub use builder::Builder;
pub use model::{Edge, EdgeType, Graph, Node, NodeId};
pub use sorter::Sorter;
pub use stats::{to_dot, GraphStats};
