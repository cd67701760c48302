use crate::newtypes::{EdgeId, MutationId, NodeId, PopulationId, Position, SiteId, Time};
use bitflags::bitflags;
use std::cmp::Ordering;
use thiserror::Error;

/// Error type related to [``TableCollection``]
#[derive(Error, Debug, PartialEq)]
pub enum TablesError {
    /// Returned by [``TableCollection::new``].
    #[error("Invalid sequence length: {found:?}")]
    InvalidSequenceLength {
        /// The invalid length
        found: f64,
    },
    /// Returned when invalid node `ID`s are encountered.
    #[error("Invalid node: {found:?}")]
    InvalidNodeValue {
        /// The invalid `ID`
        found: NodeId,
    },
    /// Returned when invalid site `ID`s are encountered.
    #[error("Invalid site: {found:?}")]
    InvalidSiteValue {
        /// The invalid `ID`
        found: SiteId,
    },
    /// Returned when invalid positions are encountered.
    #[error("Invalid value for position: {found:?}")]
    InvalidPosition {
        /// The invalid position
        found: Position,
    },
    /// Returned when an [``Edge``]'s left/right
    /// values are invalid.
    #[error("Invalid position range for edge {edge}: {found:?}")]
    InvalidLeftRight {
        /// The edge, or the id it would have received
        edge: EdgeId,
        /// The invalid `(left, right)`.
        found: (Position, Position),
    },
    /// Returned when invalid times are encountered.
    #[error("Invalid value for time: {found:?}")]
    InvalidTime {
        /// The invalid time
        found: Time,
    },
    /// Returned by [``validate_node_table``].
    #[error("Node {node} has invalid time {time:?}")]
    InvalidNodeTime {
        /// The node
        node: NodeId,
        /// Its time
        time: Time,
    },
    /// Returned when edges are present but no nodes are.
    #[error("Edge table is not empty but node table is")]
    EdgesWithoutNodes,
    #[error("Edge {edge} has an interval outside the sequence: {found:?}")]
    /// Can be returned by [``validate_edge_table``]
    EdgeIntervalOutOfBounds {
        /// The edge
        edge: EdgeId,
        /// Its `(left, right)`
        found: (Position, Position),
    },
    #[error("Edge {edge} refers to node {node}, which is out of bounds")]
    /// Can be returned by [``validate_edge_table``]
    EdgeNodeOutOfBounds {
        /// The edge
        edge: EdgeId,
        /// The offending node
        node: NodeId,
    },
    #[error("Edge {edge}: parent {parent} is not older than child {child}")]
    /// Can be returned by [``validate_edge_table``]
    NodeTimesUnordered {
        /// The edge
        edge: EdgeId,
        /// The parent
        parent: NodeId,
        /// The child
        child: NodeId,
    },
    #[error("Edges {first} and {second} overlap for child {child}")]
    /// Can be returned by [``validate_edge_table``]
    OverlappingEdges {
        /// The child of both edges
        child: NodeId,
        /// The edge with the smaller left coordinate
        first: EdgeId,
        /// The overlapping edge
        second: EdgeId,
    },
    #[error("Edge {edge}: parents not sorted by time")]
    /// Can be returned by [``validate_edge_order``]
    ParentTimesUnsorted {
        /// The edge
        edge: EdgeId,
    },
    #[error("Edge {edge}: parents not contiguous")]
    /// Can be returned by [``validate_edge_order``]
    ParentsNotContiguous {
        /// The edge
        edge: EdgeId,
    },
    #[error("Edge {edge}: edges not sorted by child")]
    /// Can be returned by [``validate_edge_order``]
    EdgesNotSortedByChild {
        /// The edge
        edge: EdgeId,
    },
    #[error("Edge {edge}: edges not sorted by left")]
    /// Can be returned by [``validate_edge_order``]
    EdgesNotSortedByLeft {
        /// The edge
        edge: EdgeId,
    },
    /// Returned when table validation detects duplicate posititions
    /// in a site table.
    #[error("Site {site}: duplicated site position")]
    DuplicatedSitePosition {
        /// The second site at the position
        site: SiteId,
    },
    /// Returned then site tables are not properly sorted
    #[error("Site {site}: site positions are unsorted")]
    UnsortedSitePosition {
        /// The out of order site
        site: SiteId,
    },
    /// Returned when a site lies outside of `[0, sequence length)`
    #[error("Site {site}: position {found:?} is out of bounds")]
    SitePositionOutOfBounds {
        /// The site
        site: SiteId,
        /// Its position
        found: Position,
    },
    #[error("Mutation {mutation}: site {site} out of bounds")]
    /// Returned when a [``MutationRecord``]'s [`SiteId`] is out of bounds.
    SiteOutOfBounds {
        /// The mutation
        mutation: MutationId,
        /// Its site
        site: SiteId,
    },
    #[error("Mutation {mutation}: node {node} out of bounds")]
    /// Returned when a [``MutationRecord``]'s [`NodeId`] is out of bounds.
    MutationNodeOutOfBounds {
        /// The mutation
        mutation: MutationId,
        /// Its node
        node: NodeId,
    },
    /// Returned when mutations tables are not sorted by site.
    #[error("Mutation {mutation}: mutations not sorted by site")]
    UnsortedMutations {
        /// The out of order mutation
        mutation: MutationId,
    },
    /// Can be returned by [`crate::TreeSequence::new`]
    /// and [`crate::TreeSequence::new_with_samples`]
    #[error("Tables not indexed")]
    TablesNotIndexed,
}

/// Result type for operations on tables
pub type TablesResult<T> = std::result::Result<T, TablesError>;

/// A Node of a tree sequence
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    /// Time of the node, increasing into the past
    pub time: Time,
    /// Population label of the node
    pub population: PopulationId,
    /// Bit flags.  See [`NodeFlags`].
    pub flags: u32,
}

impl Node {
    /// `true` if [`NodeFlags::IS_SAMPLE`] is set.
    pub fn is_sample(&self) -> bool {
        self.flags & NodeFlags::IS_SAMPLE.bits() > 0
    }
}

/// An Edge is a transmission event
///
/// An edge is a record of transmission of
/// a half-open chunk of genome `[left, right)`
/// from `parent` to `child`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Edge {
    /// Left end
    pub left: Position,
    /// Right end
    pub right: Position,
    /// Index of parent in a [NodeTable](type.NodeTable.html)
    pub parent: NodeId,
    /// Index of child in a [NodeTable](type.NodeTable.html)
    pub child: NodeId,
}

/// A Site is the location and
/// ancestral state of a tables::MutationRecord
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    /// Position of the site
    pub position: Position,
    /// The ancestral state.
    /// [``None``] implies client code
    /// will apply a default.
    pub ancestral_state: Option<Vec<u8>>,
}

/// A MutationRecord places a state change
/// on the branch above a node at a site.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationRecord {
    /// The index of the corresponding [``Site``].
    pub site: SiteId,
    /// The node where the mutation maps
    pub node: NodeId,
    /// The derived state.
    /// [``None``] implies client code
    /// will apply a default.
    pub derived_state: Option<Vec<u8>>,
}

/// A node table
pub type NodeTable = Vec<Node>;
/// An edge table
pub type EdgeTable = Vec<Edge>;
/// A site table
pub type SiteTable = Vec<Site>;
/// A Mutation table
pub type MutationTable = Vec<MutationRecord>;

fn position_non_negative(x: Position) -> TablesResult<()> {
    if !x.is_valid() {
        Err(TablesError::InvalidPosition { found: x })
    } else {
        Ok(())
    }
}

fn node_non_negative(x: NodeId) -> TablesResult<()> {
    if x < 0 {
        Err(TablesError::InvalidNodeValue { found: x })
    } else {
        Ok(())
    }
}

fn edge_table_add_row(
    edges: &mut EdgeTable,
    left: Position,
    right: Position,
    parent: NodeId,
    child: NodeId,
) -> TablesResult<EdgeId> {
    position_non_negative(left)?;
    position_non_negative(right)?;
    if right <= left {
        return Err(TablesError::InvalidLeftRight {
            edge: EdgeId::try_from(edges.len()).unwrap_or(EdgeId::NULL),
            found: (left, right),
        });
    }
    node_non_negative(parent)?;
    node_non_negative(child)?;

    edges.push(Edge {
        left,
        right,
        parent,
        child,
    });

    Ok(EdgeId::try_from(edges.len() - 1).unwrap_or(EdgeId::NULL))
}

fn node_table_add_row(
    nodes: &mut NodeTable,
    time: Time,
    population: PopulationId,
    flags: u32,
) -> TablesResult<NodeId> {
    if !time.is_valid() {
        return Err(TablesError::InvalidTime { found: time });
    }
    nodes.push(Node {
        time,
        population,
        flags,
    });

    Ok(NodeId::try_from(nodes.len() - 1).unwrap_or(NodeId::NULL))
}

fn parent_time(nodes: &[Node], edge: &Edge) -> Time {
    nodes[edge.parent.as_index()].time
}

/// The order required by simplification:
/// `(time[parent], parent, child, left)`, all increasing.
fn sort_edges(nodes: &[Node], edges: &mut [Edge]) {
    edges.sort_by(|a, b| {
        parent_time(nodes, a)
            .cmp(&parent_time(nodes, b))
            .then_with(|| a.parent.cmp(&b.parent))
            .then_with(|| a.child.cmp(&b.child))
            .then_with(|| a.left.cmp(&b.left))
    });
}

fn sort_mutation_table(mutations: &mut [MutationRecord]) {
    // stable: preserves input order within a site
    mutations.sort_by(|a, b| a.site.cmp(&b.site));
}

bitflags! {
    /// Set properties of a [`Node`].
    ///
    /// The first 16 bits are reserved for internal use.
    /// Client code is free to use the remaining bits
    /// as needed.
    #[derive(Default)]
    pub struct NodeFlags: u32 {
        /// Default
        const NONE = 0;
        /// The node is a sample node.
        const IS_SAMPLE = 1 << 0;
    }
}

bitflags! {
    /// Modifies behavior of
    /// [``TableCollection::validate``]
    ///
    /// ```
    /// let f = treeseq::TableValidationFlags::default();
    /// assert_eq!(f.contains(treeseq::TableValidationFlags::VALIDATE_ALL), true);
    /// assert_eq!(f.contains(treeseq::TableValidationFlags::VALIDATE_EDGE_ORDER), false);
    /// ```
    pub struct TableValidationFlags: u32 {
        /// Validate the edge table
        const VALIDATE_EDGES = 1<<0;
        /// Validate the site table
        const VALIDATE_SITES = 1<<1;
        /// Validate the mutation table
        const VALIDATE_MUTATIONS = 1<<2;
        /// Validate the node table
        const VALIDATE_NODES = 1<<3;
        /// Require edges to be sorted by
        /// `(time[parent], parent, child, left)`.
        const VALIDATE_EDGE_ORDER = 1<<4;
        /// Validate all tables.
        /// This is also the "default" value.
        const VALIDATE_ALL = Self::VALIDATE_EDGES.bits|Self::VALIDATE_MUTATIONS.bits|Self::VALIDATE_SITES.bits|Self::VALIDATE_NODES.bits;
    }
}

impl Default for TableValidationFlags {
    fn default() -> Self {
        TableValidationFlags::VALIDATE_ALL
    }
}

bitflags! {
    /// Modifies behavior of
    /// [``TableCollection::build_indexes``]
    #[derive(Default)]
    pub struct IndexTablesFlags: u32 {
        /// Default behavior
        const NONE = 0;
        /// Do not validate edge table
        const NO_VALIDATION = 1<<0;
    }
}

fn edge_id(i: usize) -> EdgeId {
    EdgeId::try_from(i).unwrap_or(EdgeId::NULL)
}

/// Perform a structural check on an [``EdgeTable``].
///
/// Every edge must lie within `[0, len]`, have `left < right`,
/// refer to existing nodes, and have a parent strictly older
/// than its child.  No two edges for the same child may overlap.
/// The sort order of the table is not checked.
/// See [``validate_edge_order``] for that.
///
/// # Example
///
/// ```
/// let mut tables = treeseq::TableCollection::new(100.).unwrap();
/// let c = tables.add_node(0., 0).unwrap();
/// let p = tables.add_node(1., 0).unwrap();
/// tables.add_edge(0., 100., p, c).unwrap();
/// let rv = treeseq::validate_edge_table(tables.sequence_length(),
///                                       &tables.edges(),
///                                       &tables.nodes()).unwrap();
/// assert_eq!(rv, true);
/// ```
pub fn validate_edge_table(len: Position, edges: &[Edge], nodes: &[Node]) -> TablesResult<bool> {
    if edges.is_empty() {
        return Ok(true);
    }
    if nodes.is_empty() {
        return Err(TablesError::EdgesWithoutNodes);
    }
    let mut by_child: Vec<Vec<usize>> = vec![vec![]; nodes.len()];

    for (i, edge) in edges.iter().enumerate() {
        for node in [edge.parent, edge.child] {
            if node < 0 || node.as_index() >= nodes.len() {
                return Err(TablesError::EdgeNodeOutOfBounds {
                    edge: edge_id(i),
                    node,
                });
            }
        }
        if !edge.left.is_valid() || !edge.right.is_valid() || edge.right > len {
            return Err(TablesError::EdgeIntervalOutOfBounds {
                edge: edge_id(i),
                found: (edge.left, edge.right),
            });
        }
        if edge.left >= edge.right {
            return Err(TablesError::InvalidLeftRight {
                edge: edge_id(i),
                found: (edge.left, edge.right),
            });
        }
        if nodes[edge.child.as_index()].time >= nodes[edge.parent.as_index()].time {
            return Err(TablesError::NodeTimesUnordered {
                edge: edge_id(i),
                parent: edge.parent,
                child: edge.child,
            });
        }
        by_child[edge.child.as_index()].push(i);
    }

    for (child, child_edges) in by_child.iter_mut().enumerate() {
        child_edges.sort_by(|a, b| edges[*a].left.cmp(&edges[*b].left));
        for w in child_edges.windows(2) {
            if edges[w[1]].left < edges[w[0]].right {
                return Err(TablesError::OverlappingEdges {
                    child: NodeId::try_from(child).unwrap_or(NodeId::NULL),
                    first: edge_id(w[0]),
                    second: edge_id(w[1]),
                });
            }
        }
    }

    Ok(true)
}

/// Check that edges are sorted by
/// `(time[parent], parent, child, left)` and that
/// all edges of a parent are contiguous.
///
/// The edges must already have passed [``validate_edge_table``].
pub fn validate_edge_order(edges: &[Edge], nodes: &[Node]) -> TablesResult<bool> {
    if edges.is_empty() {
        return Ok(true);
    }
    let mut parent_seen = vec![false; nodes.len()];
    for (i, w) in edges.windows(2).enumerate() {
        let (last, edge) = (&w[0], &w[1]);
        let edge_index = edge_id(i + 1);
        if parent_seen[edge.parent.as_index()] {
            return Err(TablesError::ParentsNotContiguous { edge: edge_index });
        }
        match parent_time(nodes, edge).cmp(&parent_time(nodes, last)) {
            Ordering::Less => {
                return Err(TablesError::ParentTimesUnsorted { edge: edge_index });
            }
            Ordering::Equal if edge.parent == last.parent => {
                match edge.child.cmp(&last.child) {
                    Ordering::Less => {
                        return Err(TablesError::EdgesNotSortedByChild { edge: edge_index })
                    }
                    Ordering::Equal if edge.left < last.left => {
                        return Err(TablesError::EdgesNotSortedByLeft { edge: edge_index })
                    }
                    _ => (),
                }
            }
            _ => parent_seen[last.parent.as_index()] = true,
        }
    }
    Ok(true)
}

/// Check that all node times are finite and non-negative.
pub fn validate_node_table(nodes: &[Node]) -> TablesResult<()> {
    for (i, n) in nodes.iter().enumerate() {
        if !n.time.is_valid() {
            return Err(TablesError::InvalidNodeTime {
                node: NodeId::try_from(i).unwrap_or(NodeId::NULL),
                time: n.time,
            });
        }
    }
    Ok(())
}

/// Check that sites are within `[0, len)`, sorted, and unique.
pub fn validate_site_table(len: Position, sites: &[Site]) -> TablesResult<()> {
    for (i, site) in sites.iter().enumerate() {
        let site_id = SiteId::try_from(i).unwrap_or(SiteId::NULL);
        if !site.position.is_valid() || site.position >= len {
            return Err(TablesError::SitePositionOutOfBounds {
                site: site_id,
                found: site.position,
            });
        }
        if i > 0 {
            if sites[i - 1].position == site.position {
                return Err(TablesError::DuplicatedSitePosition { site: site_id });
            }
            if sites[i - 1].position > site.position {
                return Err(TablesError::UnsortedSitePosition { site: site_id });
            }
        }
    }
    Ok(())
}

/// Check that mutations refer to existing sites and nodes
/// and are sorted by site.
pub fn validate_mutation_table(
    mutations: &[MutationRecord],
    sites: &[Site],
    nodes: &[Node],
) -> TablesResult<()> {
    for (i, mutation) in mutations.iter().enumerate() {
        let mutation_id = MutationId::try_from(i).unwrap_or(MutationId::NULL);
        if mutation.site < 0 || mutation.site.as_index() >= sites.len() {
            return Err(TablesError::SiteOutOfBounds {
                mutation: mutation_id,
                site: mutation.site,
            });
        }
        if mutation.node < 0 || mutation.node.as_index() >= nodes.len() {
            return Err(TablesError::MutationNodeOutOfBounds {
                mutation: mutation_id,
                node: mutation.node,
            });
        }
        if i > 0 && mutations[i - 1].site > mutation.site {
            return Err(TablesError::UnsortedMutations {
                mutation: mutation_id,
            });
        }
    }
    Ok(())
}

/// A collection of node, edge, site, and mutation tables.
#[derive(Clone, Debug)]
pub struct TableCollection {
    length_: Position, // Not visible outside of this module

    pub(crate) nodes_: NodeTable,
    pub(crate) edges_: EdgeTable,
    pub(crate) sites_: SiteTable,
    pub(crate) mutations_: MutationTable,
    pub(crate) edge_input_order: Vec<usize>,
    pub(crate) edge_output_order: Vec<usize>,
    pub(crate) is_indexed: bool,
}

impl TableCollection {
    /// Create a new instance.
    ///
    /// # Parameters
    ///
    /// * `sequence_length`: the total length of the sequence.
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if `sequence_length` is not
    /// finite and positive.
    pub fn new<P: Into<Position>>(sequence_length: P) -> TablesResult<TableCollection> {
        let p = sequence_length.into();
        if !p.is_valid() || p <= 0.0 {
            return Err(TablesError::InvalidSequenceLength { found: p.raw() });
        }

        Ok(TableCollection {
            length_: p,
            nodes_: NodeTable::new(),
            edges_: EdgeTable::new(),
            sites_: SiteTable::new(),
            mutations_: MutationTable::new(),
            edge_input_order: vec![],
            edge_output_order: vec![],
            is_indexed: false,
        })
    }

    /// Create an empty collection with the same
    /// sequence length as `self`.
    pub(crate) fn new_empty_like(&self) -> TableCollection {
        TableCollection {
            length_: self.length_,
            nodes_: NodeTable::new(),
            edges_: EdgeTable::new(),
            sites_: SiteTable::new(),
            mutations_: MutationTable::new(),
            edge_input_order: vec![],
            edge_output_order: vec![],
            is_indexed: false,
        }
    }

    /// Add a [``Node``] to the [``NodeTable``]
    ///
    /// # Returns
    ///
    /// A [``NodeId``].
    ///
    /// # Side effects
    ///
    /// Adding a node invalidates current table indexes.
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if `time` is negative or not finite.
    ///
    /// # Example
    ///
    /// ```
    /// let mut tables = treeseq::TableCollection::new(100.).unwrap();
    /// let id = tables.add_node(1. , 0).unwrap();
    /// assert_eq!(id, 0);
    /// assert!(tables.add_node(-1., 0).is_err());
    /// ```
    pub fn add_node<T: Into<Time>, D: Into<PopulationId>>(
        &mut self,
        time: T,
        population: D,
    ) -> TablesResult<NodeId> {
        self.add_node_with_flags(time, population, NodeFlags::default().bits())
    }

    /// Add a [``Node``] to the [``NodeTable``] with flags set.
    ///
    /// # Example
    ///
    /// ```
    /// use treeseq::NodeFlags;
    /// let mut tables = treeseq::TableCollection::new(100.).unwrap();
    /// let id = tables.add_node_with_flags(0., 0, NodeFlags::IS_SAMPLE.bits()).unwrap();
    /// assert!(tables.node(id).is_sample());
    /// ```
    ///
    /// ## Modifying node flags
    ///
    /// The dump/set operations are constant time, moving the relevant vectors.
    ///
    /// ```
    /// use treeseq::NodeFlags;
    /// let mut tables = treeseq::TableCollection::new(100.).unwrap();
    /// tables.add_node_with_flags(0., 0, NodeFlags::IS_SAMPLE.bits()).unwrap();
    /// let mut nodes = tables.dump_node_table();
    /// assert_eq!(tables.num_nodes(), 0);
    /// for n in &mut nodes {
    ///     n.flags = 0;
    /// }
    /// tables.set_node_table(nodes);
    /// assert!(!tables.node(0).is_sample());
    /// ```
    pub fn add_node_with_flags<T: Into<Time>, D: Into<PopulationId>>(
        &mut self,
        time: T,
        population: D,
        flags: u32,
    ) -> TablesResult<NodeId> {
        self.is_indexed = false;
        node_table_add_row(&mut self.nodes_, time.into(), population.into(), flags)
    }

    /// Add an [``Edge``] to the [``EdgeTable``].
    ///
    /// # Side effects
    ///
    /// Adding an edge invalidates current table indexes.
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if any of the input
    /// are invalid.
    ///
    /// # Example
    ///
    /// ```
    /// let mut tables = treeseq::TableCollection::new(100.).unwrap();
    /// let id = tables.add_edge(0., 3., 5, 9).unwrap();
    /// assert_eq!(id, 0);
    /// ```
    pub fn add_edge<L: Into<Position>, R: Into<Position>, P: Into<NodeId>, C: Into<NodeId>>(
        &mut self,
        left: L,
        right: R,
        parent: P,
        child: C,
    ) -> TablesResult<EdgeId> {
        self.is_indexed = false;
        edge_table_add_row(
            &mut self.edges_,
            left.into(),
            right.into(),
            parent.into(),
            child.into(),
        )
    }

    /// Add a [``Site``] to the [``SiteTable``];
    ///
    /// # Errors
    ///
    /// Will return [``TablesError``] if the position is
    /// not within `[0, sequence_length)`.
    ///
    /// # Example
    ///
    /// ```
    /// let mut tables = treeseq::TableCollection::new(100.).unwrap();
    /// let id = tables.add_site(3., vec![3]).unwrap();
    /// assert_eq!(id, 0);
    /// assert_eq!(tables.site(id).ancestral_state.as_ref().unwrap(), &vec![3]);
    /// ```
    pub fn add_site<P: Into<Position>, A: Into<Option<Vec<u8>>>>(
        &mut self,
        position: P,
        ancestral_state: A,
    ) -> TablesResult<SiteId> {
        let p = position.into();
        if p >= self.length_ || !p.is_valid() {
            return Err(TablesError::InvalidPosition { found: p });
        }
        self.sites_.push(Site {
            position: p,
            ancestral_state: ancestral_state.into(),
        });
        Ok(SiteId::try_from(self.sites_.len() - 1).unwrap_or(SiteId::NULL))
    }

    /// Add a [``MutationRecord``] to the [``MutationTable``].
    ///
    /// # Example
    ///
    /// ```
    /// let mut tables = treeseq::TableCollection::new(100.).unwrap();
    /// let id = tables.add_mutation(0, 1, vec![3]).unwrap();
    /// assert_eq!(id, 0);
    /// assert_eq!(tables.mutation(id).derived_state.as_ref().unwrap(), &vec![3]);
    /// ```
    pub fn add_mutation<S: Into<SiteId>, N: Into<NodeId>, D: Into<Option<Vec<u8>>>>(
        &mut self,
        site: S,
        node: N,
        derived_state: D,
    ) -> TablesResult<MutationId> {
        let site = site.into();
        let node = node.into();
        if site < 0 {
            return Err(TablesError::InvalidSiteValue { found: site });
        }
        node_non_negative(node)?;
        self.mutations_.push(MutationRecord {
            site,
            node,
            derived_state: derived_state.into(),
        });
        Ok(MutationId::try_from(self.mutations_.len() - 1).unwrap_or(MutationId::NULL))
    }

    /// Get the sequence length
    pub fn sequence_length(&self) -> Position {
        self.length_
    }

    /// Return immutable reference to the [mutation table](type.MutationTable.html)
    pub fn mutations(&self) -> &[MutationRecord] {
        &self.mutations_
    }

    /// Return immutable reference to the [edge table](type.EdgeTable.html)
    pub fn edges(&self) -> &[Edge] {
        &self.edges_
    }

    /// Return number of edges
    pub fn num_edges(&self) -> usize {
        self.edges_.len()
    }

    /// Return number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes_.len()
    }

    /// Return number of sites
    pub fn num_sites(&self) -> usize {
        self.sites_.len()
    }

    /// Return number of mutations
    pub fn num_mutations(&self) -> usize {
        self.mutations_.len()
    }

    /// Return immutable reference to [node table](type.NodeTable.html)
    pub fn nodes(&self) -> &[Node] {
        &self.nodes_
    }

    /// Return the i-th [``Node``].
    ///
    /// # Panics
    ///
    /// If `i` is out of range.
    pub fn node<N: Into<NodeId>>(&self, i: N) -> &Node {
        &self.nodes_[i.into().as_index()]
    }

    /// Return the i-th [``Edge``].
    pub fn edge<E: Into<EdgeId>>(&self, i: E) -> &Edge {
        &self.edges_[i.into().as_index()]
    }

    /// Return the i-th [``Site``].
    pub fn site<S: Into<SiteId>>(&self, i: S) -> &Site {
        &self.sites_[i.into().as_index()]
    }

    /// Return the i-th [``MutationRecord``].
    pub fn mutation<M: Into<MutationId>>(&self, i: M) -> &MutationRecord {
        &self.mutations_[i.into().as_index()]
    }

    /// Return immutable reference to [site table](type.SiteTable.html)
    pub fn sites(&self) -> &[Site] {
        &self.sites_
    }

    /// Ids of all nodes flagged with [`NodeFlags::IS_SAMPLE`].
    pub fn sample_nodes(&self) -> Vec<NodeId> {
        self.nodes_
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_sample())
            .filter_map(|(i, _)| NodeId::try_from(i).ok())
            .collect()
    }

    /// Sort the edge table by `(time[parent], parent, child, left)`
    /// and the mutation table by site.
    ///
    /// The site table is not touched.
    ///
    /// # Panics
    ///
    /// If an edge refers to a node that does not exist.
    pub fn sort_tables(&mut self) {
        sort_edges(&self.nodes_, &mut self.edges_);
        sort_mutation_table(&mut self.mutations_);
        self.is_indexed = false;
    }

    /// Run a validation check on the tables.
    pub fn validate(&self, flags: TableValidationFlags) -> TablesResult<bool> {
        if flags.contains(TableValidationFlags::VALIDATE_NODES) {
            validate_node_table(self.nodes())?;
        }
        if flags.contains(TableValidationFlags::VALIDATE_EDGES)
            || flags.contains(TableValidationFlags::VALIDATE_EDGE_ORDER)
        {
            validate_edge_table(self.sequence_length(), &self.edges_, &self.nodes_)?;
        }
        if flags.contains(TableValidationFlags::VALIDATE_EDGE_ORDER) {
            validate_edge_order(&self.edges_, &self.nodes_)?;
        }
        if flags.contains(TableValidationFlags::VALIDATE_SITES) {
            validate_site_table(self.sequence_length(), self.sites())?;
        }
        if flags.contains(TableValidationFlags::VALIDATE_MUTATIONS) {
            validate_mutation_table(self.mutations(), self.sites(), self.nodes())?;
        }
        Ok(true)
    }

    // (left, time[parent], parent, child), all increasing
    fn sort_edge_input_order(edges: &[Edge], nodes: &[Node], edge_input_order: &mut [usize]) {
        edge_input_order.sort_by(|a, b| {
            let ea = &edges[*a];
            let eb = &edges[*b];
            ea.left
                .cmp(&eb.left)
                .then_with(|| parent_time(nodes, ea).cmp(&parent_time(nodes, eb)))
                .then_with(|| ea.parent.cmp(&eb.parent))
                .then_with(|| ea.child.cmp(&eb.child))
        });
    }

    // right increasing, then (time[parent], parent, child) decreasing
    fn sort_edge_output_order(edges: &[Edge], nodes: &[Node], edge_output_order: &mut [usize]) {
        edge_output_order.sort_by(|a, b| {
            let ea = &edges[*a];
            let eb = &edges[*b];
            ea.right
                .cmp(&eb.right)
                .then_with(|| parent_time(nodes, eb).cmp(&parent_time(nodes, ea)))
                .then_with(|| eb.parent.cmp(&ea.parent))
                .then_with(|| eb.child.cmp(&ea.child))
        });
    }

    /// Build the edge insertion and removal indexes.
    ///
    /// The insertion order sorts edges by
    /// `(left, time[parent], parent, child)`.
    /// The removal order sorts edges by `right` and then
    /// by decreasing `(time[parent], parent, child)`.
    ///
    /// An empty edge table results in empty, valid indexes.
    ///
    /// # Errors
    ///
    /// [`TablesError`] if the edge table is invalid.
    pub fn build_indexes(&mut self, flags: IndexTablesFlags) -> TablesResult<()> {
        if !flags.contains(IndexTablesFlags::NO_VALIDATION) {
            validate_edge_table(self.sequence_length(), &self.edges_, &self.nodes_)?;
        } else {
            for (i, e) in self.edges_.iter().enumerate() {
                for node in [e.parent, e.child] {
                    if node < 0 || node.as_index() >= self.nodes_.len() {
                        return Err(TablesError::EdgeNodeOutOfBounds {
                            edge: edge_id(i),
                            node,
                        });
                    }
                }
            }
        }
        self.edge_input_order.clear();
        self.edge_output_order.clear();
        self.edge_input_order.extend(0..self.edges_.len());
        self.edge_output_order.extend(0..self.edges_.len());
        Self::sort_edge_input_order(&self.edges_, &self.nodes_, &mut self.edge_input_order);
        Self::sort_edge_output_order(&self.edges_, &self.nodes_, &mut self.edge_output_order);
        self.is_indexed = true;
        Ok(())
    }

    /// Get the edge input order.
    ///
    /// The input order is generated by [`TableCollection::build_indexes`].
    ///
    /// Returns `None` if `self.is_indexed() == false`.
    pub fn edge_input_order(&self) -> Option<&[usize]> {
        if self.is_indexed {
            Some(&self.edge_input_order)
        } else {
            None
        }
    }

    /// Get the edge output order.
    ///
    /// The output order is generated by [`TableCollection::build_indexes`].
    ///
    /// Returns `None` if `self.is_indexed() == false`.
    pub fn edge_output_order(&self) -> Option<&[usize]> {
        if self.is_indexed {
            Some(&self.edge_output_order)
        } else {
            None
        }
    }

    /// Return `true` if tables are indexed, `false` otherwise.
    pub fn is_indexed(&self) -> bool {
        self.is_indexed
    }

    /// Dump contents of node table.
    ///
    /// The `self` object is left with an empty
    /// node table.
    pub fn dump_node_table(&mut self) -> NodeTable {
        self.is_indexed = false;
        std::mem::take(&mut self.nodes_)
    }

    /// Set the contents of the node table.
    pub fn set_node_table(&mut self, nodes: NodeTable) {
        self.nodes_ = nodes;
        self.is_indexed = false;
    }

    /// Dump contents of edge table.
    ///
    /// The `self` object is left with an empty
    /// edge table.
    pub fn dump_edge_table(&mut self) -> EdgeTable {
        self.is_indexed = false;
        std::mem::take(&mut self.edges_)
    }

    /// Set the contents of the edge table.
    pub fn set_edge_table(&mut self, edges: EdgeTable) {
        self.edges_ = edges;
        self.is_indexed = false;
    }

    /// Dump contents of site table.
    pub fn dump_site_table(&mut self) -> SiteTable {
        std::mem::take(&mut self.sites_)
    }

    /// Set the contents of the site table.
    pub fn set_site_table(&mut self, sites: SiteTable) {
        self.sites_ = sites;
    }

    /// Dump contents of mutation table.
    pub fn dump_mutation_table(&mut self) -> MutationTable {
        std::mem::take(&mut self.mutations_)
    }

    /// Set the contents of the mutation table.
    pub fn set_mutation_table(&mut self, mutations: MutationTable) {
        self.mutations_ = mutations;
    }

    /// Count number of trees in O(E) time, where E
    /// is length of edge table.
    ///
    /// # Errors
    ///
    /// [`TablesError::TablesNotIndexed`] if tables are not indexed
    pub fn count_trees(&self) -> TablesResult<usize> {
        let mut sweep = EdgeSweep::new(self)?;
        let mut num_trees = 0;
        while sweep.has_next() {
            sweep.take_removals();
            sweep.take_insertions();
            let right = sweep.next_breakpoint();
            sweep.advance_to(right);
            num_trees += 1;
        }
        Ok(num_trees)
    }
}

/// Cursor state of the left-to-right sweep
/// over the edge insertion and removal indexes.
///
/// Shared by tree iteration, edge differences,
/// and [`TableCollection::count_trees`].
pub(crate) struct EdgeSweep<'tables> {
    edges: &'tables [Edge],
    insertion: &'tables [usize],
    removal: &'tables [usize],
    sequence_length: Position,
    insertion_index: usize,
    removal_index: usize,
    left: Position,
}

impl<'tables> EdgeSweep<'tables> {
    pub(crate) fn new(tables: &'tables TableCollection) -> TablesResult<Self> {
        if !tables.is_indexed() {
            return Err(TablesError::TablesNotIndexed);
        }
        Ok(Self {
            edges: &tables.edges_,
            insertion: &tables.edge_input_order,
            removal: &tables.edge_output_order,
            sequence_length: tables.sequence_length(),
            insertion_index: 0,
            removal_index: 0,
            left: Position::from(0.0),
        })
    }

    pub(crate) fn has_next(&self) -> bool {
        self.insertion_index < self.insertion.len() || self.left < self.sequence_length
    }

    pub(crate) fn left(&self) -> Position {
        self.left
    }

    pub(crate) fn edges(&self) -> &'tables [Edge] {
        self.edges
    }

    /// Edges whose `right` equals the current left coordinate.
    pub(crate) fn take_removals(&mut self) -> &'tables [usize] {
        let removal = self.removal;
        let start = self.removal_index;
        while self.removal_index < removal.len()
            && self.edges[removal[self.removal_index]].right == self.left
        {
            self.removal_index += 1;
        }
        &removal[start..self.removal_index]
    }

    /// Edges whose `left` equals the current left coordinate.
    pub(crate) fn take_insertions(&mut self) -> &'tables [usize] {
        let insertion = self.insertion;
        let start = self.insertion_index;
        while self.insertion_index < insertion.len()
            && self.edges[insertion[self.insertion_index]].left == self.left
        {
            self.insertion_index += 1;
        }
        &insertion[start..self.insertion_index]
    }

    /// The right end of the current tree.
    pub(crate) fn next_breakpoint(&self) -> Position {
        let mut right = self.sequence_length;
        if let Some(&i) = self.insertion.get(self.insertion_index) {
            right = std::cmp::min(right, self.edges[i].left);
        }
        if let Some(&o) = self.removal.get(self.removal_index) {
            right = std::cmp::min(right, self.edges[o].right);
        }
        right
    }

    pub(crate) fn advance_to(&mut self, right: Position) {
        self.left = right;
    }
}


#[cfg(test)]
mod test_table_indexing {
    use super::*;

    #[test]
    fn test_no_nodes() {
        let mut t = TableCollection::new(1.).unwrap();
        t.add_edge(0., 1., 0, 1).unwrap();
        t.add_edge(0., 1., 0, 2).unwrap();
        assert_eq!(
            t.build_indexes(IndexTablesFlags::default()),
            Err(TablesError::EdgesWithoutNodes)
        );
    }

    #[test]
    fn test_edge_out_of_range() {
        let mut t = TableCollection::new(1.).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_edge(0., 1., 0, 1).unwrap();
        assert!(matches!(
            t.build_indexes(IndexTablesFlags::default()),
            Err(TablesError::EdgeNodeOutOfBounds { .. })
        ));
        assert!(matches!(
            t.build_indexes(IndexTablesFlags::NO_VALIDATION),
            Err(TablesError::EdgeNodeOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_parent_younger_than_child() {
        let mut t = TableCollection::new(1.).unwrap();
        t.add_node(1., 0).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_edge(0., 1., 1, 0).unwrap();
        assert_eq!(
            t.build_indexes(IndexTablesFlags::default()),
            Err(TablesError::NodeTimesUnordered {
                edge: EdgeId::from(0),
                parent: NodeId::from(1),
                child: NodeId::from(0)
            })
        );
    }

    #[test]
    fn test_overlapping_parents() {
        let mut t = TableCollection::new(10.).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_node(1., 0).unwrap();
        t.add_node(2., 0).unwrap();
        t.add_edge(0., 6., 1, 0).unwrap();
        t.add_edge(5., 10., 2, 0).unwrap();
        assert_eq!(
            t.validate(TableValidationFlags::default()),
            Err(TablesError::OverlappingEdges {
                child: NodeId::from(0),
                first: EdgeId::from(0),
                second: EdgeId::from(1)
            })
        );
    }

    #[test]
    fn test_reversed_edge_reports_row() {
        let mut t = TableCollection::new(10.).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_node(1., 0).unwrap();
        t.add_edge(0., 5., 1, 0).unwrap();
        t.add_edge(5., 10., 1, 0).unwrap();
        let mut edges = t.dump_edge_table();
        edges[1].left = Position::from(8.);
        edges[1].right = Position::from(6.);
        t.set_edge_table(edges);
        assert_eq!(
            t.validate(TableValidationFlags::VALIDATE_EDGES),
            Err(TablesError::InvalidLeftRight {
                edge: EdgeId::from(1),
                found: (Position::from(8.), Position::from(6.))
            })
        );
    }

    #[test]
    fn test_edge_beyond_sequence_length() {
        let mut t = TableCollection::new(10.).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_node(1., 0).unwrap();
        t.add_edge(0., 11., 1, 0).unwrap();
        assert!(matches!(
            t.validate(TableValidationFlags::VALIDATE_EDGES),
            Err(TablesError::EdgeIntervalOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_empty_edge_table_is_indexed() {
        let mut t = TableCollection::new(1.).unwrap();
        t.add_node(0., 0).unwrap();
        t.build_indexes(IndexTablesFlags::default()).unwrap();
        assert!(t.is_indexed());
        assert_eq!(t.edge_input_order().unwrap().len(), 0);
        assert_eq!(t.count_trees().unwrap(), 1);
    }

    #[test]
    fn test_simple_sort_order() {
        let mut t = TableCollection::new(1.).unwrap();
        for _ in 0..3 {
            t.add_node(0., 0).unwrap();
        }
        t.add_node(1., 0).unwrap();
        t.add_node(2., 0).unwrap();

        t.add_edge(0., 1., 4, 3).unwrap();
        t.add_edge(0., 1., 4, 2).unwrap();
        t.add_edge(0., 1., 3, 0).unwrap();
        t.add_edge(0., 1., 3, 1).unwrap();

        t.build_indexes(IndexTablesFlags::default()).unwrap();

        // insertion: youngest parents first
        let input = t.edge_input_order().unwrap();
        assert_eq!(input, &[2, 3, 1, 0]);
        // removal: oldest parents first
        let output = t.edge_output_order().unwrap();
        assert_eq!(output, &[0, 1, 3, 2]);
    }

    #[test]
    fn test_is_indexed() {
        let mut t = TableCollection::new(1.).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_node(1., 0).unwrap();
        t.add_edge(0., 1., 1, 0).unwrap();
        t.build_indexes(IndexTablesFlags::default()).unwrap();
        assert!(t.is_indexed());

        t.add_node(0., 0).unwrap();
        assert!(!t.is_indexed());
        assert_eq!(t.count_trees(), Err(TablesError::TablesNotIndexed));
    }

    #[test]
    fn test_count_trees() {
        let mut t = TableCollection::new(10.).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_node(0., 0).unwrap();
        t.add_node(1., 0).unwrap();
        t.add_node(2., 0).unwrap();
        t.add_edge(0., 10., 2, 0).unwrap();
        t.add_edge(0., 4., 2, 1).unwrap();
        t.add_edge(4., 10., 3, 1).unwrap();
        t.add_edge(0., 10., 3, 2).unwrap();
        t.build_indexes(IndexTablesFlags::default()).unwrap();
        assert_eq!(t.count_trees().unwrap(), 2);
    }
}
