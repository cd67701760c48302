pub use treeseq_core::{EdgeId, MutationId, NodeId, PopulationId, Position, SiteId, Time};
