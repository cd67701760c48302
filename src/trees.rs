use crate::mrca::{AncestorIndex, MrcaError};
use crate::newtypes::{NodeId, Position, SiteId};
use crate::tables::{Edge, EdgeSweep, Site, TableCollection, TableValidationFlags, TablesError};
use bitflags::bitflags;
use std::collections::VecDeque;
use std::ops::Range;

bitflags! {
    /// Modify the behavior of [`TreeSequence::tree_iterator`].
    #[derive(Default)]
    pub struct TreeFlags: u32 {
        /// Keep track of the number of samples
        /// below each node.
        const SAMPLE_COUNTS = 1 << 0;
    }
}

/// Data describing the toplological relationship
/// between [`NodeId`] in a [`Tree`].
///
/// For a [`TreeSequence`] whose tables have `n`
/// nodes, there are `n` instances of this
/// struct.
///
/// Some fields may be equal to [`NodeId::NULL`],
/// indicating that the current instance is a root
/// or leaf node, for example.
/// For roots, `left_sib` and `right_sib` link
/// the root list.
#[derive(Copy, Clone)]
struct TopologyData {
    parent: NodeId,
    left_child: NodeId,
    right_child: NodeId,
    left_sib: NodeId,
    right_sib: NodeId,
    num_samples: usize,
}

impl Default for TopologyData {
    fn default() -> Self {
        Self {
            parent: NodeId::NULL,
            left_child: NodeId::NULL,
            right_child: NodeId::NULL,
            left_sib: NodeId::NULL,
            right_sib: NodeId::NULL,
            num_samples: 0,
        }
    }
}

trait NodeIterator {
    fn next_node(&mut self);
    fn current_node(&mut self) -> Option<NodeId>;
}

/// Specify the traversal order used by
/// [`Tree::traverse_nodes`].
///
/// For trees with multiple roots, each order
/// starts at the left root, finishes that subtree,
/// and proceeds to the next root.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeTraversalOrder {
    /// A node is visited before its children.
    Preorder,
    /// A node is visited after its children.
    Postorder,
    /// For a node with `k` children, the subtrees
    /// of the first `k / 2` children are visited, then
    /// the node, then the remaining subtrees.
    Inorder,
    /// Breadth-first, one root at a time.
    Levelorder,
}

impl Tree<'_> {
    #[inline]
    fn topo(&self, u: NodeId) -> &TopologyData {
        &self.topology[u.as_index()]
    }

    fn children_to_vec(&self, u: NodeId) -> Vec<NodeId> {
        let mut rv = vec![];
        let mut c = self.topo(u).left_child;
        while c != NodeId::NULL {
            rv.push(c);
            c = self.topo(c).right_sib;
        }
        rv
    }
}

struct PreorderNodeIterator<'a> {
    node_stack: Vec<NodeId>,
    tree: &'a Tree<'a>,
    current_node_: Option<NodeId>,
}

impl<'a> PreorderNodeIterator<'a> {
    fn new(tree: &'a Tree) -> Self {
        let mut rv = PreorderNodeIterator {
            node_stack: tree.roots_to_vec(),
            tree,
            current_node_: None,
        };
        rv.node_stack.reverse();
        rv
    }
}

impl NodeIterator for PreorderNodeIterator<'_> {
    fn next_node(&mut self) {
        self.current_node_ = self.node_stack.pop();
        if let Some(u) = self.current_node_ {
            let mut c = self.tree.topo(u).right_child;
            while c != NodeId::NULL {
                self.node_stack.push(c);
                c = self.tree.topo(c).left_sib;
            }
        };
    }

    fn current_node(&mut self) -> Option<NodeId> {
        self.current_node_
    }
}

iterator_for_nodeiterator!(PreorderNodeIterator<'_>);

enum Visit {
    Expand(NodeId),
    Emit(NodeId),
}

/// Postorder and inorder traversal with an explicit stack.
struct DepthFirstNodeIterator<'a> {
    stack: Vec<Visit>,
    tree: &'a Tree<'a>,
    inorder: bool,
    current_node_: Option<NodeId>,
}

impl<'a> DepthFirstNodeIterator<'a> {
    fn new(tree: &'a Tree, inorder: bool) -> Self {
        let stack = tree
            .roots_to_vec()
            .into_iter()
            .rev()
            .map(Visit::Expand)
            .collect();
        Self {
            stack,
            tree,
            inorder,
            current_node_: None,
        }
    }

    fn expand(&mut self, u: NodeId) {
        let children = self.tree.children_to_vec(u);
        let split = if self.inorder {
            children.len() / 2
        } else {
            children.len()
        };
        for c in children[split..].iter().rev() {
            self.stack.push(Visit::Expand(*c));
        }
        self.stack.push(Visit::Emit(u));
        for c in children[..split].iter().rev() {
            self.stack.push(Visit::Expand(*c));
        }
    }
}

impl NodeIterator for DepthFirstNodeIterator<'_> {
    fn next_node(&mut self) {
        self.current_node_ = None;
        while let Some(visit) = self.stack.pop() {
            match visit {
                Visit::Emit(u) => {
                    self.current_node_ = Some(u);
                    break;
                }
                Visit::Expand(u) => self.expand(u),
            }
        }
    }

    fn current_node(&mut self) -> Option<NodeId> {
        self.current_node_
    }
}

iterator_for_nodeiterator!(DepthFirstNodeIterator<'_>);

struct LevelorderNodeIterator<'a> {
    roots: std::vec::IntoIter<NodeId>,
    queue: VecDeque<NodeId>,
    tree: &'a Tree<'a>,
    current_node_: Option<NodeId>,
}

impl<'a> LevelorderNodeIterator<'a> {
    fn new(tree: &'a Tree) -> Self {
        Self {
            roots: tree.roots_to_vec().into_iter(),
            queue: VecDeque::new(),
            tree,
            current_node_: None,
        }
    }
}

impl NodeIterator for LevelorderNodeIterator<'_> {
    fn next_node(&mut self) {
        if self.queue.is_empty() {
            if let Some(r) = self.roots.next() {
                self.queue.push_back(r);
            }
        }
        self.current_node_ = self.queue.pop_front();
        if let Some(u) = self.current_node_ {
            let mut c = self.tree.topo(u).left_child;
            while c != NodeId::NULL {
                self.queue.push_back(c);
                c = self.tree.topo(c).right_sib;
            }
        }
    }

    fn current_node(&mut self) -> Option<NodeId> {
        self.current_node_
    }
}

iterator_for_nodeiterator!(LevelorderNodeIterator<'_>);

struct RootIterator<'a> {
    current_root: Option<NodeId>,
    next_root: NodeId,
    tree: &'a Tree<'a>,
}

impl<'a> RootIterator<'a> {
    fn new(tree: &'a Tree) -> Self {
        RootIterator {
            current_root: None,
            next_root: tree.left_root,
            tree,
        }
    }
}

impl NodeIterator for RootIterator<'_> {
    fn next_node(&mut self) {
        self.current_root = match self.next_root {
            NodeId::NULL => None,
            r => {
                self.next_root = self.tree.topo(r).right_sib;
                Some(r)
            }
        };
    }

    fn current_node(&mut self) -> Option<NodeId> {
        self.current_root
    }
}

iterator_for_nodeiterator!(RootIterator<'_>);

struct ChildIterator<'a> {
    current_child: Option<NodeId>,
    next_child: NodeId,
    tree: &'a Tree<'a>,
}

impl<'a> ChildIterator<'a> {
    fn new(tree: &'a Tree, u: NodeId) -> Self {
        ChildIterator {
            current_child: None,
            next_child: tree.topo(u).left_child,
            tree,
        }
    }
}

impl NodeIterator for ChildIterator<'_> {
    fn next_node(&mut self) {
        self.current_child = match self.next_child {
            NodeId::NULL => None,
            r => {
                self.next_child = self.tree.topo(r).right_sib;
                Some(r)
            }
        };
    }

    fn current_node(&mut self) -> Option<NodeId> {
        self.current_child
    }
}

iterator_for_nodeiterator!(ChildIterator<'_>);

struct ParentsIterator<'a> {
    current_node: Option<NodeId>,
    next_node: NodeId,
    tree: &'a Tree<'a>,
}

impl<'a> ParentsIterator<'a> {
    fn new(tree: &'a Tree, u: NodeId) -> Self {
        ParentsIterator {
            current_node: None,
            next_node: u,
            tree,
        }
    }
}

impl NodeIterator for ParentsIterator<'_> {
    fn next_node(&mut self) {
        self.current_node = match self.next_node {
            NodeId::NULL => None,
            r => {
                self.next_node = self.tree.topo(r).parent;
                Some(r)
            }
        };
    }

    fn current_node(&mut self) -> Option<NodeId> {
        self.current_node
    }
}

iterator_for_nodeiterator!(ParentsIterator<'_>);

/// A tree is the genealogy of a non-recombining
/// segment of a genome.  A [`TreeSequence`] contains
/// the information needed to efficiently build trees
/// and iterate over each tree in a genome.
///
/// The root list holds every node that has no parent
/// and has at least one sample at or below it.
pub struct Tree<'treeseq> {
    topology: Vec<TopologyData>,
    left_root: NodeId,
    above_sample: Vec<bool>,
    left: Position,
    right: Position,
    index: usize,
    site_range: Range<usize>,
    flags: TreeFlags,
    treeseq: &'treeseq TreeSequence,
    // The following help implement StreamingIterator
    sweep: EdgeSweep<'treeseq>,
    site_cursor: usize,
    num_advanced: usize,
    advanced: bool,
}

impl<'treeseq> Tree<'treeseq> {
    fn new(treeseq: &'treeseq TreeSequence, flags: TreeFlags) -> TreesResult<Self> {
        let num_nodes = treeseq.tables.num_nodes();
        let mut rv = Self {
            topology: vec![TopologyData::default(); num_nodes],
            left_root: NodeId::NULL,
            above_sample: vec![false; num_nodes],
            left: Position::from(0.0),
            right: Position::from(0.0),
            index: 0,
            site_range: 0..0,
            flags,
            treeseq,
            sweep: EdgeSweep::new(&treeseq.tables)?,
            site_cursor: 0,
            num_advanced: 0,
            advanced: false,
        };
        rv.init_samples();
        Ok(rv)
    }

    // Samples start out as the root list, in sample order.
    fn init_samples(&mut self) {
        let samples = self.treeseq.samples.as_slice();
        for (i, s) in samples.iter().enumerate() {
            let row = &mut self.topology[s.as_index()];
            if i + 1 < samples.len() {
                row.right_sib = samples[i + 1];
            }
            if i > 0 {
                row.left_sib = samples[i - 1];
            }
            row.num_samples = 1;
            self.above_sample[s.as_index()] = true;
        }
        self.left_root = samples.first().copied().unwrap_or(NodeId::NULL);
    }

    fn update_incoming_sample_counts(&mut self, parent: NodeId, child: NodeId) {
        let n = self.topo(child).num_samples;
        if n == 0 {
            return;
        }
        let mut u = parent;
        while u != NodeId::NULL {
            self.topology[u.as_index()].num_samples += n;
            u = self.topo(u).parent;
        }
    }

    fn update_outgoing_sample_counts(&mut self, parent: NodeId, child: NodeId) {
        let n = self.topo(child).num_samples;
        if n == 0 {
            return;
        }
        let mut u = parent;
        while u != NodeId::NULL {
            self.topology[u.as_index()].num_samples -= n;
            u = self.topo(u).parent;
        }
    }

    fn set_left_sib(&mut self, u: NodeId, v: NodeId) {
        self.topology[u.as_index()].left_sib = v;
    }

    fn set_right_sib(&mut self, u: NodeId, v: NodeId) {
        self.topology[u.as_index()].right_sib = v;
    }

    // lsib and rsib are the root list neighbors of child
    // before it was attached to parent.
    fn update_incoming_roots(&mut self, parent: NodeId, child: NodeId, lsib: NodeId, rsib: NodeId) {
        if !self.above_sample[child.as_index()] {
            return;
        }
        let mut x = parent;
        let mut root = x;
        let mut above_sample = false;

        while x != NodeId::NULL && !above_sample {
            above_sample = self.above_sample[x.as_index()];
            self.above_sample[x.as_index()] = true;
            root = x;
            x = self.topo(x).parent;
        }

        if !above_sample {
            // root replaces child in the root list
            if lsib != NodeId::NULL {
                self.set_right_sib(lsib, root);
            }
            if rsib != NodeId::NULL {
                self.set_left_sib(rsib, root);
            }
            self.set_left_sib(root, lsib);
            self.set_right_sib(root, rsib);
            self.left_root = root;
        } else {
            // child is no longer a root
            self.left_root = NodeId::NULL;
            if lsib != NodeId::NULL {
                self.set_right_sib(lsib, rsib);
                self.left_root = lsib;
            }
            if rsib != NodeId::NULL {
                self.set_left_sib(rsib, lsib);
                self.left_root = rsib;
            }
        }
    }

    fn update_outgoing_roots(&mut self, parent: NodeId, child: NodeId) {
        if !self.above_sample[child.as_index()] {
            return;
        }
        let mut x = parent;
        let mut root = x;
        let mut above_sample = false;

        while x != NodeId::NULL && !above_sample {
            above_sample = self.treeseq.is_sample[x.as_index()];
            let mut c = self.topo(x).left_child;
            while c != NodeId::NULL {
                above_sample = above_sample || self.above_sample[c.as_index()];
                c = self.topo(c).right_sib;
            }
            self.above_sample[x.as_index()] = above_sample;
            root = x;
            x = self.topo(x).parent;
        }

        if !above_sample {
            // root no longer subtends samples
            let lroot = self.topo(root).left_sib;
            let rroot = self.topo(root).right_sib;
            self.left_root = NodeId::NULL;
            if lroot != NodeId::NULL {
                self.set_right_sib(lroot, rroot);
                self.left_root = lroot;
            }
            if rroot != NodeId::NULL {
                self.set_left_sib(rroot, lroot);
                self.left_root = rroot;
            }
            self.set_left_sib(root, NodeId::NULL);
            self.set_right_sib(root, NodeId::NULL);
        }

        // child becomes a root
        if self.left_root != NodeId::NULL {
            let lroot = self.topo(self.left_root).left_sib;
            if lroot != NodeId::NULL {
                self.set_right_sib(lroot, child);
            }
            self.set_left_sib(child, lroot);
            self.set_left_sib(self.left_root, child);
        }
        self.set_right_sib(child, self.left_root);
        self.left_root = child;
    }

    fn remove_edge(&mut self, edge: &Edge) {
        let (p, c) = (edge.parent, edge.child);
        let lsib = self.topo(c).left_sib;
        let rsib = self.topo(c).right_sib;

        if lsib == NodeId::NULL {
            self.topology[p.as_index()].left_child = rsib;
        } else {
            self.set_right_sib(lsib, rsib);
        }
        if rsib == NodeId::NULL {
            self.topology[p.as_index()].right_child = lsib;
        } else {
            self.set_left_sib(rsib, lsib);
        }
        let child_topo = &mut self.topology[c.as_index()];
        child_topo.parent = NodeId::NULL;
        child_topo.left_sib = NodeId::NULL;
        child_topo.right_sib = NodeId::NULL;

        if self.flags.contains(TreeFlags::SAMPLE_COUNTS) {
            self.update_outgoing_sample_counts(p, c);
        }
        self.update_outgoing_roots(p, c);
    }

    fn insert_edge(&mut self, edge: &Edge) {
        let (p, c) = (edge.parent, edge.child);
        let rchild = self.topo(p).right_child;
        let lsib = self.topo(c).left_sib;
        let rsib = self.topo(c).right_sib;

        if rchild == NodeId::NULL {
            self.topology[p.as_index()].left_child = c;
            self.set_left_sib(c, NodeId::NULL);
        } else {
            self.set_right_sib(rchild, c);
            self.set_left_sib(c, rchild);
        }
        self.set_right_sib(c, NodeId::NULL);
        self.topology[c.as_index()].parent = p;
        self.topology[p.as_index()].right_child = c;

        if self.flags.contains(TreeFlags::SAMPLE_COUNTS) {
            self.update_incoming_sample_counts(p, c);
        }
        self.update_incoming_roots(p, c, lsib, rsib);
    }

    fn id_in_range<N: Into<NodeId>>(&self, u: N) -> TreesResult<NodeId> {
        let n = u.into();
        if n < 0 || n.as_index() >= self.num_nodes() {
            Err(TreesError::NodeIdOutOfRange { node: n })
        } else {
            Ok(n)
        }
    }

    /// Return an [`Iterator`] over all nodes in the tree.
    ///
    /// # Parameters
    ///
    /// * `order`: A value from [`NodeTraversalOrder`] specifying the
    ///   iteration order.
    pub fn traverse_nodes(
        &self,
        order: NodeTraversalOrder,
    ) -> Box<dyn Iterator<Item = NodeId> + '_> {
        match order {
            NodeTraversalOrder::Preorder => Box::new(PreorderNodeIterator::new(self)),
            NodeTraversalOrder::Postorder => Box::new(DepthFirstNodeIterator::new(self, false)),
            NodeTraversalOrder::Inorder => Box::new(DepthFirstNodeIterator::new(self, true)),
            NodeTraversalOrder::Levelorder => Box::new(LevelorderNodeIterator::new(self)),
        }
    }

    /// Return the length of this tree along the genome.
    pub fn span(&self) -> f64 {
        self.right.raw() - self.left.raw()
    }

    /// Return the `[left, right)` [`Position`] for
    /// which this tree is the genealogy.
    pub fn interval(&self) -> (Position, Position) {
        (self.left, self.right)
    }

    /// Zero-based position of this tree in the sequence of trees.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The sites whose positions fall within [`Tree::interval`].
    pub fn sites(&self) -> &'treeseq [Site] {
        &self.treeseq.tables.sites_[self.site_range.clone()]
    }

    /// The ids of the sites returned by [`Tree::sites`].
    pub fn site_ids(&self) -> impl Iterator<Item = SiteId> + '_ {
        self.site_range
            .clone()
            .filter_map(|i| SiteId::try_from(i).ok())
    }

    /// Calculate the total length of the tree via a preorder traversal.
    ///
    /// # Parameters
    ///
    /// * `by_span`: if `true`, multiply the return value by [`Tree::span`].
    pub fn total_branch_length(&self, by_span: bool) -> f64 {
        let nt = self.treeseq.tables.nodes();
        let mut b = 0.0;
        for n in self.traverse_nodes(NodeTraversalOrder::Preorder) {
            let p = self.topo(n).parent;
            if p != NodeId::NULL {
                b += nt[p.as_index()].time - nt[n.as_index()].time;
            }
        }

        match by_span {
            true => b * self.span(),
            false => b,
        }
    }

    /// Return an [`Iterator`] from the node `u` to the root of the tree,
    /// travering all parent nodes.
    ///
    /// # Errors
    ///
    /// [`TreesError::NodeIdOutOfRange`] if `u` is out of range.
    pub fn parents<N: Into<NodeId> + Copy>(
        &self,
        u: N,
    ) -> Result<impl Iterator<Item = NodeId> + '_, TreesError> {
        let u = self.id_in_range(u)?;
        Ok(ParentsIterator::new(self, u))
    }

    /// Return an [`Iterator`] over the children of node `u`.
    ///
    /// # Errors
    ///
    /// [`TreesError::NodeIdOutOfRange`] if `u` is out of range.
    pub fn children<N: Into<NodeId> + Copy>(
        &self,
        u: N,
    ) -> Result<impl Iterator<Item = NodeId> + '_, TreesError> {
        let u = self.id_in_range(u)?;
        Ok(ChildIterator::new(self, u))
    }

    /// Return an [`Iterator`] over the roots of the tree.
    ///
    /// # Note
    ///
    /// For a tree with multiple roots, the iteration starts
    /// at the left root.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        RootIterator::new(self)
    }

    /// Return all roots as a vector.
    pub fn roots_to_vec(&self) -> Vec<NodeId> {
        self.roots().collect()
    }

    /// Number of roots in the current tree.
    pub fn num_roots(&self) -> usize {
        self.roots().count()
    }

    /// The leftmost root, or [`NodeId::NULL`]
    /// if the root list is empty.
    pub fn left_root(&self) -> NodeId {
        self.left_root
    }

    /// Return a slice of the samples in this tree.
    pub fn sample_nodes(&self) -> &'treeseq [NodeId] {
        &self.treeseq.samples
    }

    /// `true` if `u` is one of the samples.
    pub fn is_sample<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<bool> {
        let u = self.id_in_range(u)?;
        Ok(self.treeseq.is_sample[u.as_index()])
    }

    /// The number of samples at or below node `u`.
    ///
    /// # Errors
    ///
    /// [`TreesError::NodeIdOutOfRange`] if `u` is out of range.
    ///
    /// [`TreesError::NotCountingSamples`] if [`TreeFlags::SAMPLE_COUNTS`] was not used
    /// to initialize `self`.
    pub fn num_samples<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<usize> {
        if !self.flags.contains(TreeFlags::SAMPLE_COUNTS) {
            return Err(TreesError::NotCountingSamples);
        }
        let u = self.id_in_range(u)?;
        Ok(self.topo(u).num_samples)
    }

    /// The number of nodes in the tree sequence.
    pub fn num_nodes(&self) -> usize {
        self.topology.len()
    }

    /// The parent of every node, indexed by node id.
    pub fn parent_array(&self) -> Vec<NodeId> {
        self.topology.iter().map(|t| t.parent).collect()
    }

    /// Build an [`AncestorIndex`] for the current tree,
    /// answering most-recent-common-ancestor queries
    /// in constant time.
    pub fn ancestor_index(&self) -> TreesResult<AncestorIndex> {
        Ok(AncestorIndex::new(&self.parent_array())?)
    }

    /// Return the parent of node `u`.
    pub fn parent<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        let u = self.id_in_range(u)?;
        Ok(self.topo(u).parent)
    }

    /// Return the left child of node `u`.
    pub fn left_child<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        let u = self.id_in_range(u)?;
        Ok(self.topo(u).left_child)
    }

    /// Return the right child of node `u`.
    pub fn right_child<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        let u = self.id_in_range(u)?;
        Ok(self.topo(u).right_child)
    }

    /// Return the left sibling of node `u`.
    pub fn left_sib<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        let u = self.id_in_range(u)?;
        Ok(self.topo(u).left_sib)
    }

    /// Return the right sibling of node `u`.
    pub fn right_sib<N: Into<NodeId> + Copy>(&self, u: N) -> TreesResult<NodeId> {
        let u = self.id_in_range(u)?;
        Ok(self.topo(u).right_sib)
    }
}

/// Left-to-right iteration of trees.
impl<'treeseq> streaming_iterator::StreamingIterator for Tree<'treeseq> {
    type Item = Tree<'treeseq>;

    fn advance(&mut self) {
        if !self.sweep.has_next() {
            self.advanced = false;
            return;
        }
        let edges = self.sweep.edges();
        for &e in self.sweep.take_removals() {
            self.remove_edge(&edges[e]);
        }
        for &e in self.sweep.take_insertions() {
            self.insert_edge(&edges[e]);
        }

        // Root list updates can leave left_root
        // pointing into the middle of the list.
        if self.left_root != NodeId::NULL {
            while self.topo(self.left_root).left_sib != NodeId::NULL {
                self.left_root = self.topo(self.left_root).left_sib;
            }
        }

        self.left = self.sweep.left();
        self.right = self.sweep.next_breakpoint();
        self.sweep.advance_to(self.right);

        let sites = self.treeseq.tables.sites();
        let first_site = self.site_cursor;
        while self.site_cursor < sites.len() && sites[self.site_cursor].position < self.right {
            self.site_cursor += 1;
        }
        self.site_range = first_site..self.site_cursor;

        self.index = self.num_advanced;
        self.num_advanced += 1;
        self.advanced = true;
        log::trace!(
            "tree {} spans [{}, {}) with {} roots",
            self.index,
            self.left,
            self.right,
            self.num_roots()
        );
    }

    fn get(&self) -> Option<&Self::Item> {
        match self.advanced {
            true => Some(self),
            false => None,
        }
    }
}

/// The edges leaving and entering the tree
/// at the left end of `[left, right)`.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDifferences {
    /// Left end of the new tree
    pub left: Position,
    /// Right end of the new tree
    pub right: Position,
    /// Edges removed, in removal order
    pub removed: Vec<Edge>,
    /// Edges inserted, in insertion order
    pub inserted: Vec<Edge>,
}

/// Iterator returned by [`TreeSequence::edge_differences`].
///
/// Yields one item per tree, in lock step with
/// [`TreeSequence::tree_iterator`].
pub struct EdgeDifferencesIterator<'treeseq> {
    sweep: EdgeSweep<'treeseq>,
}

impl Iterator for EdgeDifferencesIterator<'_> {
    type Item = EdgeDifferences;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.sweep.has_next() {
            return None;
        }
        let edges = self.sweep.edges();
        let removed = self.sweep.take_removals().iter().map(|e| edges[*e]).collect();
        let inserted = self
            .sweep
            .take_insertions()
            .iter()
            .map(|e| edges[*e])
            .collect();
        let left = self.sweep.left();
        let right = self.sweep.next_breakpoint();
        self.sweep.advance_to(right);
        Some(EdgeDifferences {
            left,
            right,
            removed,
            inserted,
        })
    }
}

/// Error type related to [``TreeSequence``] and [``Tree``].
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TreesError {
    /// Returned when a [`NodeId`] is not
    /// present in a [`Tree`] or [`TreeSequence`].
    #[error("Node ID {node} out of range")]
    NodeIdOutOfRange {
        /// The node
        node: NodeId,
    },
    /// Returned if a tree sequence is
    /// initialized with no samples.
    #[error("No samples found.")]
    NoSamples,
    /// Returned when a sample list refers to nodes
    /// that do not exist.
    #[error("Invalid sample: {sample}")]
    InvalidSamples {
        /// The first invalid sample
        sample: NodeId,
    },
    /// Returned if sample lists contain duplicate [`NodeId`].
    #[error("Duplicate sample: {sample}")]
    DuplicateSamples {
        /// The first repeated sample
        sample: NodeId,
    },
    /// Returned when sample counts are requested, yet
    /// [`TreeFlags::SAMPLE_COUNTS`] is not set.
    #[error("Not counting samples.")]
    NotCountingSamples,
    /// A redirection of a [``TablesError``]
    #[error("{0}")]
    Tables(#[from] TablesError),
    /// A redirection of a [``MrcaError``]
    #[error("{0}")]
    Mrca(#[from] MrcaError),
}

/// A tree sequence.
#[derive(Debug)]
pub struct TreeSequence {
    tables: TableCollection,
    samples: Vec<NodeId>,
    is_sample: Vec<bool>,
    num_trees: usize,
}

/// Result type for operations on trees and tree sequences.
pub type TreesResult<T> = Result<T, TreesError>;

bitflags! {
    /// Bit flags modifying the behavior of [`TreeSequence`]
    /// initialization.
    #[derive(Default)]
    pub struct TreeSequenceFlags: u32 {
        /// Do not validate tables when creating a [`TreeSequence`]
        const NO_TABLE_VALIDATION = 1 << 0;
    }
}

impl TreeSequence {
    fn new_from_tables(tables: TableCollection, samples: Vec<NodeId>) -> TreesResult<Self> {
        if samples.is_empty() {
            return Err(TreesError::NoSamples);
        }
        let mut is_sample = vec![false; tables.num_nodes()];
        for s in &samples {
            if *s < 0 || s.as_index() >= tables.num_nodes() {
                return Err(TreesError::InvalidSamples { sample: *s });
            }
            if is_sample[s.as_index()] {
                return Err(TreesError::DuplicateSamples { sample: *s });
            }
            is_sample[s.as_index()] = true;
        }
        let num_trees = tables.count_trees()?;
        log::debug!(
            "tree sequence with {} nodes, {} edges, {} samples, {} trees",
            tables.num_nodes(),
            tables.num_edges(),
            samples.len(),
            num_trees
        );
        Ok(Self {
            tables,
            samples,
            is_sample,
            num_trees,
        })
    }

    fn check_tables(tables: &TableCollection, flags: TreeSequenceFlags) -> TreesResult<()> {
        if !tables.is_indexed() {
            return Err(TablesError::TablesNotIndexed.into());
        }
        if !flags.contains(TreeSequenceFlags::NO_TABLE_VALIDATION) {
            tables.validate(TableValidationFlags::default())?;
        }
        Ok(())
    }

    /// Create a new tree sequence from a [`TableCollection`].
    ///
    /// The input tables are consumed, owned by the tree sequence.
    ///
    /// By default, the tables will be validated.
    ///
    /// To disable validation, `flags` should contain
    /// [`TreeSequenceFlags::NO_TABLE_VALIDATION`].
    ///
    /// The list of samples will be populated from the [`node flags`](crate::Node::flags).
    /// Any `flag` containing [`IS_SAMPLE`](crate::NodeFlags::IS_SAMPLE) will be
    /// in the list.
    ///
    /// # Errors
    ///
    /// [`TablesNotIndexed`](crate::TablesError::TablesNotIndexed) if
    /// [`build_indexes`](crate::TableCollection::build_indexes) as not been called.
    ///
    /// [`TablesError`] if table validation fails.
    ///
    /// [`TreesError::NoSamples`] if no node is flagged as a sample.
    pub fn new(tables: TableCollection, flags: TreeSequenceFlags) -> TreesResult<Self> {
        Self::check_tables(&tables, flags)?;
        let samples = tables.sample_nodes();
        Self::new_from_tables(tables, samples)
    }

    /// Create a new tree sequence from a table collection
    /// and a list of samples.
    ///
    /// Unlike [`TreeSequence::new`], this function ignores node flags and uses the samples
    /// list instead.
    ///
    /// # Error
    ///
    /// [`TreesError`] if the samples list is empty, contains
    /// nodes that do not exist, or contains duplicates.
    pub fn new_with_samples(
        tables: TableCollection,
        samples: &[NodeId],
        flags: TreeSequenceFlags,
    ) -> TreesResult<Self> {
        Self::check_tables(&tables, flags)?;
        Self::new_from_tables(tables, samples.to_vec())
    }

    /// Move the underlying [`TableCollection`],
    /// consuming `self`.
    pub fn tables(self) -> TableCollection {
        self.tables
    }

    /// Borrow the underlying [`TableCollection`].
    pub fn tables_ref(&self) -> &TableCollection {
        &self.tables
    }

    /// Return a streaming iterator over all [`Tree`]
    /// objects in the tree sequence.
    ///
    /// ```
    /// use streaming_iterator::StreamingIterator;
    /// use treeseq::prelude::*;
    ///
    /// let mut tables = TableCollection::new(10.).unwrap();
    /// tables.add_node_with_flags(0., 0, NodeFlags::IS_SAMPLE.bits()).unwrap();
    /// tables.add_node_with_flags(0., 0, NodeFlags::IS_SAMPLE.bits()).unwrap();
    /// tables.add_node(1., 0).unwrap();
    /// tables.add_edge(0., 10., 2, 0).unwrap();
    /// tables.add_edge(0., 10., 2, 1).unwrap();
    /// tables.build_indexes(IndexTablesFlags::default()).unwrap();
    /// let ts = TreeSequence::new(tables, TreeSequenceFlags::default()).unwrap();
    ///
    /// let mut trees = ts.tree_iterator(TreeFlags::default());
    /// while let Some(tree) = trees.next() {
    ///     assert_eq!(tree.roots_to_vec(), vec![NodeId::from(2)]);
    /// }
    /// ```
    pub fn tree_iterator(&self, flags: TreeFlags) -> Tree<'_> {
        // The constructor checked that the tables are indexed.
        match Tree::new(self, flags) {
            Ok(tree) => tree,
            Err(e) => unreachable!("{}", e),
        }
    }

    /// Return an iterator over the edges leaving
    /// and entering each tree.
    pub fn edge_differences(&self) -> EdgeDifferencesIterator<'_> {
        match EdgeSweep::new(&self.tables) {
            Ok(sweep) => EdgeDifferencesIterator { sweep },
            Err(e) => unreachable!("{}", e),
        }
    }

    /// The sample nodes
    pub fn sample_nodes(&self) -> &[NodeId] {
        &self.samples
    }

    /// The number of trees in the tree sequence
    pub fn num_trees(&self) -> usize {
        self.num_trees
    }

    /// The sequence length of the tables.
    pub fn sequence_length(&self) -> Position {
        self.tables.sequence_length()
    }

    /// Simplify the internal [`TableCollection`].
    ///
    /// # Parameters
    ///
    /// * `samples`: An optional slice of [`NodeId`]
    /// * `flags`: flags to modify the simplification behavior
    ///
    /// # Details
    ///
    /// If `samples` is `None`, then the samples of `self`
    /// are used.
    ///
    /// # Returns
    ///
    /// A tuple of [`TableCollection`]
    /// and [`SimplificationOutput`](crate::SimplificationOutput).
    ///
    /// # Errors
    ///
    /// [`SimplificationError`](crate::SimplificationError)
    pub fn simplify(
        &self,
        samples: Option<&[NodeId]>,
        flags: crate::SimplificationFlags,
    ) -> Result<(TableCollection, crate::SimplificationOutput), crate::SimplificationError> {
        let mut tcopy = self.tables.clone();
        let samples = samples.unwrap_or(&self.samples);
        let mut output = crate::SimplificationOutput::default();
        crate::simplify_tables(samples, flags, &mut tcopy, &mut output)?;
        Ok((tcopy, output))
    }
}
