type LowLevelIdType = i32;

/// Row id of a node.
///
/// ```
/// # use treeseq_core::NodeId;
/// let n = NodeId::from(-1);
/// assert_eq!(n, -1);
/// assert!(n.is_null());
/// assert_eq!(n.raw(), -1);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct NodeId(LowLevelIdType);

/// Row id of an edge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
#[repr(transparent)]
pub struct EdgeId(LowLevelIdType);

/// Row id of a site.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
#[repr(transparent)]
pub struct SiteId(LowLevelIdType);

/// Row id of a mutation.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct MutationId(LowLevelIdType);

/// Label of the population a node belongs to.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, std::hash::Hash)]
pub struct PopulationId(LowLevelIdType);

impl_table_id!(NodeId, LowLevelIdType);
impl_table_id!(EdgeId, LowLevelIdType);
impl_table_id!(SiteId, LowLevelIdType);
impl_table_id!(MutationId, LowLevelIdType);
impl_table_id!(PopulationId, LowLevelIdType);
