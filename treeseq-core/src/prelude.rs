pub use crate::EdgeId;
pub use crate::MutationId;
pub use crate::NodeId;
pub use crate::PopulationId;
pub use crate::Position;
pub use crate::SiteId;
pub use crate::Time;
