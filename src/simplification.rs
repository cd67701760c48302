use crate::newtypes::{MutationId, NodeId, Position};
use crate::position_map::PositionMap;
use crate::segment::{SegmentArena, SegmentError};
use crate::tables::*;
use bitflags::bitflags;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

bitflags! {
    /// Boolean flags affecting simplification
    /// behavior.
    ///
    /// # Example
    ///
    /// ```
    /// let e = treeseq::SimplificationFlags::empty();
    /// assert_eq!(e.bits(), 0);
    /// let d = treeseq::SimplificationFlags::default();
    /// assert!(d.contains(treeseq::SimplificationFlags::FILTER_INVARIANT_SITES));
    /// ```
    pub struct SimplificationFlags: u32 {
        /// Remove sites without mutations
        /// from the output.
        const FILTER_INVARIANT_SITES = 1 << 0;
        /// Do not validate the input tables.
        const NO_TABLE_VALIDATION = 1 << 1;
    }
}

impl Default for SimplificationFlags {
    fn default() -> Self {
        SimplificationFlags::FILTER_INVARIANT_SITES
    }
}

/// Error type for simplification.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SimplificationError {
    /// A sample does not exist in the node table.
    #[error("invalid sample node: {sample}")]
    InvalidSample {
        /// The sample
        sample: NodeId,
    },
    /// A sample is listed more than once.
    #[error("duplicate sample node: {sample}")]
    DuplicateSample {
        /// The sample
        sample: NodeId,
    },
    /// The ancestry of an input node stopped being
    /// a sorted list of non-overlapping segments.
    #[error("ancestry of node {node} is invalid: {source}")]
    AncestryInvariant {
        /// The input node
        node: NodeId,
        /// What went wrong
        source: SegmentError,
    },
    /// A redirection of a [``TablesError``]
    #[error("{0}")]
    Tables(#[from] TablesError),
}

/// Useful information output by table
/// simplification.
#[derive(Clone, Debug, Default)]
pub struct SimplificationOutput {
    /// Maps input node ID to output ID.
    /// Values are set to [``NodeId::NULL``]
    /// for input nodes that "simplify out".
    pub idmap: Vec<NodeId>,
}

impl SimplificationOutput {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }
}

type MutationMap = PositionMap<Vec<MutationId>>;

struct Simplifier<'a> {
    tables: &'a TableCollection,
    sequence_length: Position,
    filter_invariant_sites: bool,
    is_sample: Vec<bool>,
    unmapped_samples: Vec<bool>,
    idmap: Vec<NodeId>,
    segments: SegmentArena,
    // Input node -> head of its ancestry chain.
    ancestry: Vec<Option<usize>>,
    // Input node -> mutations not yet assigned to an output node.
    mutation_map: Vec<MutationMap>,
    // Input site -> (output node, input mutation), in arrival order.
    site_mutations: Vec<Vec<(NodeId, MutationId)>>,
    heap: BinaryHeap<Reverse<(Position, usize)>>,
    edge_buffer: Vec<Edge>,
    new_nodes: NodeTable,
    new_edges: EdgeTable,
}

impl<'a> Simplifier<'a> {
    fn new(
        samples: &[NodeId],
        flags: SimplificationFlags,
        tables: &'a TableCollection,
    ) -> Result<Self, SimplificationError> {
        let num_nodes = tables.num_nodes();
        let mut is_sample = vec![false; num_nodes];
        for s in samples {
            if *s < 0 || s.as_index() >= num_nodes {
                return Err(SimplificationError::InvalidSample { sample: *s });
            }
            if is_sample[s.as_index()] {
                return Err(SimplificationError::DuplicateSample { sample: *s });
            }
            is_sample[s.as_index()] = true;
        }

        let mut mutation_map = vec![MutationMap::default(); num_nodes];
        for (i, m) in tables.mutations().iter().enumerate() {
            let position = tables.sites()[m.site.as_index()].position;
            mutation_map[m.node.as_index()]
                .entry_or_default(position)
                .push(mutation_id(i));
        }

        let mut rv = Self {
            tables,
            sequence_length: tables.sequence_length(),
            filter_invariant_sites: flags.contains(SimplificationFlags::FILTER_INVARIANT_SITES),
            is_sample,
            unmapped_samples: vec![false; num_nodes],
            idmap: vec![NodeId::NULL; num_nodes],
            segments: SegmentArena::new(),
            ancestry: vec![None; num_nodes],
            mutation_map,
            site_mutations: vec![vec![]; tables.num_sites()],
            heap: BinaryHeap::new(),
            edge_buffer: vec![],
            new_nodes: NodeTable::new(),
            new_edges: EdgeTable::new(),
        };

        // Samples with nonzero time wait until
        // the edge loop reaches them.
        for s in samples {
            if rv.tables.node(*s).time == 0.0 {
                rv.insert_sample(*s);
            } else {
                rv.unmapped_samples[s.as_index()] = true;
            }
        }
        Ok(rv)
    }

    fn record_node(&mut self, input_id: NodeId) {
        let node = *self.tables.node(input_id);
        let mut flags = node.flags & !NodeFlags::IS_SAMPLE.bits();
        if self.is_sample[input_id.as_index()] {
            flags |= NodeFlags::IS_SAMPLE.bits();
        }
        self.new_nodes.push(Node {
            time: node.time,
            population: node.population,
            flags,
        });
        self.idmap[input_id.as_index()] = node_id(self.new_nodes.len() - 1);
    }

    fn record_edge(&mut self, left: Position, right: Position, parent: NodeId, child: NodeId) {
        self.edge_buffer.push(Edge {
            left,
            right,
            parent,
            child,
        });
    }

    // Sort by (child, left) and squash abutting
    // edges with the same child.
    fn flush_edges(&mut self) {
        self.edge_buffer
            .sort_by(|a, b| a.child.cmp(&b.child).then_with(|| a.left.cmp(&b.left)));
        let mut buffered = self.edge_buffer.drain(..);
        if let Some(mut current) = buffered.next() {
            for e in buffered {
                if e.child == current.child && e.left == current.right {
                    current.right = e.right;
                } else {
                    self.new_edges.push(current);
                    current = e;
                }
            }
            self.new_edges.push(current);
        }
    }

    fn full_span_chain(&mut self, output_id: NodeId) -> usize {
        self.segments
            .alloc(Position::from(0.0), self.sequence_length, output_id, None)
    }

    fn insert_sample(&mut self, sample: NodeId) {
        self.record_node(sample);
        let head = self.full_span_chain(self.idmap[sample.as_index()]);
        self.ancestry[sample.as_index()] = Some(head);
    }

    // The sample becomes the terminus of all ancestry
    // passing through it.
    fn insert_internal_sample(&mut self, sample: NodeId) {
        let old = self.ancestry[sample.as_index()].take();
        self.segments.free_chain(old);
        let head = self.full_span_chain(self.idmap[sample.as_index()]);
        self.ancestry[sample.as_index()] = Some(head);
    }

    // Assign the pending mutations of input_id that fall
    // within its chain to the output nodes of the chain.
    fn harvest_mutations(&mut self, input_id: NodeId) {
        let head = self.ancestry[input_id.as_index()];
        let mut current = head;
        while let Some(i) = current {
            let seg = self.segments[i];
            let map = &mut self.mutation_map[input_id.as_index()];
            if !map.is_empty() {
                for (_, mutations) in map.drain_range(seg.left, seg.right) {
                    for m in mutations {
                        let site = self.tables.mutation(m).site;
                        self.site_mutations[site.as_index()].push((seg.node, m));
                    }
                }
            }
            current = seg.next;
        }
    }

    fn chain_error(node: NodeId) -> impl FnOnce(SegmentError) -> SimplificationError {
        move |source| SimplificationError::AncestryInvariant { node, source }
    }

    // Snip [left, right) out of the ancestry of input_id
    // and queue the removed sub-chain for merging.
    fn remove_ancestry(
        &mut self,
        left: Position,
        right: Position,
        input_id: NodeId,
    ) -> Result<(), SimplificationError> {
        self.harvest_mutations(input_id);

        let mut head = self.ancestry[input_id.as_index()];
        let mut x = head;
        let mut last: Option<usize> = None;

        while let Some(i) = x {
            if self.segments[i].right > left {
                break;
            }
            last = Some(i);
            x = self.segments[i].next;
        }
        if let Some(i) = x {
            if self.segments[i].left < left {
                // The left overhang stays behind.
                let rhs = self
                    .segments
                    .split(i, left)
                    .map_err(Self::chain_error(input_id))?;
                last = Some(i);
                x = Some(rhs);
            }
        }

        if let Some(first) = x {
            if self.segments[first].left < right {
                self.heap
                    .push(Reverse((self.segments[first].left, first)));
                let mut previous = first;
                let mut current = Some(first);
                while let Some(i) = current {
                    if self.segments[i].right > right {
                        break;
                    }
                    previous = i;
                    current = self.segments[i].next;
                }
                match current {
                    Some(i) if self.segments[i].left < right => {
                        // The right overhang stays behind.
                        let rhs = self
                            .segments
                            .split(i, right)
                            .map_err(Self::chain_error(input_id))?;
                        self.segments[i].next = None;
                        x = Some(rhs);
                    }
                    _ => {
                        self.segments[previous].next = None;
                        x = current;
                    }
                }
            }
        }

        match last {
            None => head = x,
            Some(l) => self.segments[l].next = x,
        }
        self.ancestry[input_id.as_index()] = head;
        Ok(())
    }

    fn push_next(&mut self, idx: usize) {
        if let Some(y) = self.segments[idx].next {
            self.heap.push(Reverse((self.segments[y].left, y)));
        }
    }

    // Merge all queued ancestry into the new
    // chain for input_id.
    fn merge_labeled_ancestors(&mut self, input_id: NodeId) -> Result<(), SimplificationError> {
        let parent_is_sample = self.is_sample[input_id.as_index()];
        let mut coalescence = false;
        let mut tail: Option<usize> = None;
        let mut overlapping = vec![];

        while let Some(Reverse((left, _))) = self.heap.peek().copied() {
            overlapping.clear();
            let mut right = self.sequence_length;
            while let Some(Reverse((l, i))) = self.heap.peek().copied() {
                if l != left {
                    break;
                }
                self.heap.pop();
                overlapping.push(i);
                right = std::cmp::min(right, self.segments[i].right);
            }
            let next_left = self.heap.peek().map(|Reverse((l, _))| *l);
            if let Some(l) = next_left {
                right = std::cmp::min(right, l);
            }

            let alpha = if overlapping.len() == 1 {
                let x = overlapping[0];
                let alpha = match next_left {
                    Some(l) if l < self.segments[x].right => {
                        let node = self.segments[x].node;
                        let alpha = self.segments.alloc(left, l, node, None);
                        self.segments[x].left = l;
                        self.heap.push(Reverse((l, x)));
                        alpha
                    }
                    _ => {
                        self.push_next(x);
                        self.segments[x].next = None;
                        x
                    }
                };
                if parent_is_sample {
                    let u = self.idmap[input_id.as_index()];
                    let seg = self.segments[alpha];
                    self.record_edge(seg.left, seg.right, u, seg.node);
                    self.segments[alpha].node = u;
                }
                alpha
            } else {
                if !coalescence {
                    coalescence = true;
                    if self.idmap[input_id.as_index()].is_null() {
                        self.record_node(input_id);
                    }
                }
                let u = self.idmap[input_id.as_index()];
                let alpha = self.segments.alloc(left, right, u, None);
                for &x in overlapping.iter() {
                    let child = self.segments[x].node;
                    self.record_edge(left, right, u, child);
                    if self.segments[x].right == right {
                        self.push_next(x);
                        self.segments.free(x);
                    } else {
                        self.segments[x].left = right;
                        self.heap.push(Reverse((right, x)));
                    }
                }
                alpha
            };

            match tail {
                None => self.ancestry[input_id.as_index()] = Some(alpha),
                Some(z) => self.segments[z].next = Some(alpha),
            }
            tail = Some(alpha);
        }
        self.flush_edges();
        Ok(())
    }

    fn process_parent_edges(
        &mut self,
        parent: NodeId,
        edges: &[usize],
    ) -> Result<(), SimplificationError> {
        let tables = self.tables;
        let input_edges = tables.edges();
        for e in edges {
            let child = input_edges[*e].child;
            if self.unmapped_samples[child.as_index()] {
                self.unmapped_samples[child.as_index()] = false;
                self.insert_sample(child);
            }
        }
        let parent_unmapped = self.unmapped_samples[parent.as_index()];
        if parent_unmapped {
            self.record_node(parent);
        }

        for e in edges {
            let edge = input_edges[*e];
            if self.ancestry[edge.child.as_index()].is_some() {
                self.remove_ancestry(edge.left, edge.right, edge.child)?;
            }
        }
        log::trace!(
            "parent {}: merging {} segments from {} edges",
            parent,
            self.heap.len(),
            edges.len()
        );
        self.merge_labeled_ancestors(parent)?;
        self.segments
            .check_chain(self.ancestry[parent.as_index()])
            .map_err(Self::chain_error(parent))?;

        if parent_unmapped {
            self.unmapped_samples[parent.as_index()] = false;
            self.insert_internal_sample(parent);
        }
        Ok(())
    }

    fn simplify(
        mut self,
        edge_order: &[usize],
    ) -> Result<(TableCollection, Vec<NodeId>), SimplificationError> {
        let tables = self.tables;
        let input_edges = tables.edges();
        let mut start = 0;
        while start < edge_order.len() {
            let parent = input_edges[edge_order[start]].parent;
            let mut stop = start + 1;
            while stop < edge_order.len() && input_edges[edge_order[stop]].parent == parent {
                stop += 1;
            }
            self.process_parent_edges(parent, &edge_order[start..stop])?;
            start = stop;
        }

        // Samples that no edge refers to.
        for u in 0..self.unmapped_samples.len() {
            if self.unmapped_samples[u] {
                self.unmapped_samples[u] = false;
                self.insert_sample(node_id(u));
            }
        }

        // Remaining chains belong to the roots.
        for u in 0..self.ancestry.len() {
            if self.ancestry[u].is_some() {
                self.harvest_mutations(node_id(u));
            }
        }

        let mut output = self.tables.new_empty_like();
        output.nodes_ = std::mem::take(&mut self.new_nodes);
        output.edges_ = std::mem::take(&mut self.new_edges);
        self.finalise_sites(&mut output);
        Ok((output, self.idmap))
    }

    fn finalise_sites(&mut self, output: &mut TableCollection) {
        for (i, site) in self.tables.sites().iter().enumerate() {
            let mutations = &self.site_mutations[i];
            if self.filter_invariant_sites && mutations.is_empty() {
                continue;
            }
            let new_site = site_id(output.sites_.len());
            output.sites_.push(site.clone());
            for (node, m) in mutations {
                output.mutations_.push(MutationRecord {
                    site: new_site,
                    node: *node,
                    derived_state: self.tables.mutation(*m).derived_state.clone(),
                });
            }
        }
    }
}

fn node_id(i: usize) -> NodeId {
    NodeId::from(i as i32)
}

fn site_id(i: usize) -> crate::newtypes::SiteId {
    crate::newtypes::SiteId::from(i as i32)
}

fn mutation_id(i: usize) -> MutationId {
    MutationId::from(i as i32)
}

// (time[parent], parent, child, left)
fn canonical_edge_order(tables: &TableCollection) -> Vec<usize> {
    let nodes = tables.nodes();
    let edges = tables.edges();
    let mut order = (0..edges.len()).collect::<Vec<_>>();
    order.sort_by(|a, b| {
        let ea = &edges[*a];
        let eb = &edges[*b];
        nodes[ea.parent.as_index()]
            .time
            .cmp(&nodes[eb.parent.as_index()].time)
            .then_with(|| ea.parent.cmp(&eb.parent))
            .then_with(|| ea.child.cmp(&eb.child))
            .then_with(|| ea.left.cmp(&eb.left))
    });
    order
}

/// Simplify a [``TableCollection``].
///
/// # Parameters
///
/// * `samples`: the nodes whose ancestry is retained.
/// * `flags`: modify the behavior of the simplification algorithm.
/// * `tables`: a [``TableCollection``] to simplify.
/// * `output`: Where simplification output gets written.
///             See [``SimplificationOutput``].
///
/// # Details
///
/// Edges need not be sorted.
/// The output nodes are the requested samples and the
/// nodes where their ancestry coalesces, in order of
/// first appearance going back in time.
/// Node `i` of the input becomes `output.idmap[i]`.
///
/// The output tables are not indexed.
///
/// # Errors
///
/// [``SimplificationError``] if a sample is out of range or
/// repeated, or if validation of the input tables fails.
/// Unless `flags` contains
/// [``NO_TABLE_VALIDATION``](SimplificationFlags::NO_TABLE_VALIDATION),
/// `tables` is validated with
/// [``TableValidationFlags::VALIDATE_ALL``].
/// Without validation, edges and mutations referring to
/// nonexistent rows will cause a panic.
///
/// # Example
///
/// ```
/// use treeseq::*;
///
/// let mut tables = TableCollection::new(1.).unwrap();
/// tables.add_node(0., 0).unwrap();
/// tables.add_node(1., 0).unwrap();
/// tables.add_node(2., 0).unwrap();
/// tables.add_edge(0., 1., 1, 0).unwrap();
/// tables.add_edge(0., 1., 2, 1).unwrap();
///
/// let mut output = SimplificationOutput::default();
/// simplify_tables(&[NodeId::from(0)],
///                 SimplificationFlags::default(),
///                 &mut tables, &mut output).unwrap();
/// assert_eq!(tables.num_nodes(), 1);
/// assert_eq!(tables.num_edges(), 0);
/// assert_eq!(output.idmap, vec![NodeId::from(0), NodeId::NULL, NodeId::NULL]);
/// ```
pub fn simplify_tables(
    samples: &[NodeId],
    flags: SimplificationFlags,
    tables: &mut TableCollection,
    output: &mut SimplificationOutput,
) -> Result<(), SimplificationError> {
    if !flags.contains(SimplificationFlags::NO_TABLE_VALIDATION) {
        tables.validate(TableValidationFlags::VALIDATE_ALL)?;
    }
    let edge_order = canonical_edge_order(tables);
    log::debug!(
        "simplifying {} nodes and {} edges to {} samples",
        tables.num_nodes(),
        tables.num_edges(),
        samples.len()
    );
    let simplifier = Simplifier::new(samples, flags, tables)?;
    let (simplified, idmap) = simplifier.simplify(&edge_order)?;
    log::debug!(
        "simplified to {} nodes, {} edges, {} sites, and {} mutations",
        simplified.num_nodes(),
        simplified.num_edges(),
        simplified.num_sites(),
        simplified.num_mutations()
    );
    *tables = simplified;
    output.idmap = idmap;
    Ok(())
}



#[cfg(test)]
mod test_simplify_tables {
    use super::*;

    fn sample_flags() -> u32 {
        NodeFlags::IS_SAMPLE.bits()
    }

    fn ids(v: &[i32]) -> Vec<NodeId> {
        v.iter().map(|i| NodeId::from(*i)).collect()
    }

    fn cherry() -> TableCollection {
        let mut tables = TableCollection::new(1.).unwrap();
        tables.add_node_with_flags(0., 0, sample_flags()).unwrap();
        tables.add_node_with_flags(0., 0, sample_flags()).unwrap();
        tables.add_node(1., 0).unwrap();
        tables.add_edge(0., 1., 2, 0).unwrap();
        tables.add_edge(0., 1., 2, 1).unwrap();
        tables
    }

    fn simplify(
        samples: &[i32],
        flags: SimplificationFlags,
        tables: &mut TableCollection,
    ) -> Result<Vec<NodeId>, SimplificationError> {
        let mut output = SimplificationOutput::new();
        simplify_tables(&ids(samples), flags, tables, &mut output)?;
        Ok(output.idmap)
    }

    #[test]
    fn test_minimal_input_is_unchanged() {
        let mut tables = cherry();
        let idmap = simplify(&[0, 1], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[0, 1, 2]));
        assert_eq!(tables.num_nodes(), 3);
        assert_eq!(tables.edges(), cherry().edges());
        assert!(tables.node(0).is_sample());
        assert!(tables.node(1).is_sample());
        assert!(!tables.node(2).is_sample());
        assert!(!tables.is_indexed());
    }

    #[test]
    fn test_single_sample_of_cherry() {
        let mut tables = cherry();
        let idmap = simplify(&[1], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[-1, 0, -1]));
        assert_eq!(tables.num_nodes(), 1);
        assert_eq!(tables.num_edges(), 0);
    }

    #[test]
    fn test_unary_chain_collapses() {
        let mut tables = TableCollection::new(1.).unwrap();
        tables.add_node(2., 0).unwrap();
        tables.add_node(1., 0).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_edge(0., 1., 0, 1).unwrap();
        tables.add_edge(0., 1., 1, 2).unwrap();
        let idmap = simplify(&[2], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[-1, -1, 0]));
        assert_eq!(tables.num_nodes(), 1);
        assert_eq!(tables.num_edges(), 0);
        assert!(tables.node(0).is_sample());
    }

    #[test]
    fn test_empty_samples() {
        let mut tables = cherry();
        let idmap = simplify(&[], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[-1, -1, -1]));
        assert_eq!(tables.num_nodes(), 0);
        assert_eq!(tables.num_edges(), 0);
    }

    #[test]
    fn test_bad_samples() {
        let mut tables = cherry();
        assert_eq!(
            simplify(&[0, 3], SimplificationFlags::default(), &mut tables).unwrap_err(),
            SimplificationError::InvalidSample {
                sample: NodeId::from(3)
            }
        );
        assert_eq!(
            simplify(&[-1], SimplificationFlags::default(), &mut tables).unwrap_err(),
            SimplificationError::InvalidSample {
                sample: NodeId::NULL
            }
        );
        assert_eq!(
            simplify(&[0, 1, 0], SimplificationFlags::default(), &mut tables).unwrap_err(),
            SimplificationError::DuplicateSample {
                sample: NodeId::from(0)
            }
        );
        // Failed calls leave the tables alone.
        assert_eq!(tables.edges(), cherry().edges());
    }

    #[test]
    fn test_invalid_tables() {
        let mut tables = cherry();
        tables.add_edge(0., 1., 0, 1).unwrap();
        assert!(matches!(
            simplify(&[0, 1], SimplificationFlags::default(), &mut tables),
            Err(SimplificationError::Tables(_))
        ));
    }

    #[test]
    fn test_unsorted_edges() {
        let mut tables = TableCollection::new(10.).unwrap();
        tables.add_node_with_flags(0., 0, sample_flags()).unwrap();
        tables.add_node_with_flags(0., 0, sample_flags()).unwrap();
        tables.add_node(1., 0).unwrap();
        tables.add_node(2., 0).unwrap();
        tables.add_edge(5., 10., 2, 1).unwrap();
        tables.add_edge(0., 10., 3, 2).unwrap();
        tables.add_edge(0., 5., 2, 1).unwrap();
        tables.add_edge(0., 10., 2, 0).unwrap();
        let idmap = simplify(&[0, 1], SimplificationFlags::default(), &mut tables).unwrap();
        // 3 is unary above 2, where 0 and 1 coalesce.
        assert_eq!(idmap, ids(&[0, 1, 2, -1]));
        assert_eq!(tables.num_nodes(), 3);
        assert_eq!(tables.num_edges(), 2);
        for e in tables.edges() {
            assert_eq!(e.parent, 2);
            assert_eq!(e.left, 0.);
            assert_eq!(e.right, 10.);
        }
    }

    #[test]
    fn test_partial_coalescence() {
        // 0 and 1 coalesce in 2 on [0, 5)
        // and in 3 on [5, 10).
        let mut tables = TableCollection::new(10.).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_node(1., 0).unwrap();
        tables.add_node(2., 0).unwrap();
        tables.add_edge(0., 5., 2, 0).unwrap();
        tables.add_edge(0., 5., 2, 1).unwrap();
        tables.add_edge(5., 10., 3, 0).unwrap();
        tables.add_edge(5., 10., 3, 1).unwrap();
        tables.add_edge(0., 5., 3, 2).unwrap();
        let idmap = simplify(&[0, 1], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[0, 1, 2, 3]));
        let expected = vec![
            Edge {
                left: 0.0.into(),
                right: 5.0.into(),
                parent: 2.into(),
                child: 0.into(),
            },
            Edge {
                left: 0.0.into(),
                right: 5.0.into(),
                parent: 2.into(),
                child: 1.into(),
            },
            Edge {
                left: 5.0.into(),
                right: 10.0.into(),
                parent: 3.into(),
                child: 0.into(),
            },
            Edge {
                left: 5.0.into(),
                right: 10.0.into(),
                parent: 3.into(),
                child: 1.into(),
            },
        ];
        assert_eq!(tables.edges(), expected.as_slice());
    }

    #[test]
    fn test_touching_edges_are_squashed() {
        let mut tables = TableCollection::new(10.).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_node(1., 0).unwrap();
        tables.add_edge(0., 4., 2, 0).unwrap();
        tables.add_edge(4., 10., 2, 0).unwrap();
        tables.add_edge(0., 10., 2, 1).unwrap();
        simplify(&[0, 1], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(tables.num_edges(), 2);
        for e in tables.edges() {
            assert_eq!(e.left, 0.);
            assert_eq!(e.right, 10.);
        }
    }

    #[test]
    fn test_internal_sample() {
        // 0 -> 1 -> 2 with 0 and 1 both samples.
        let mut tables = TableCollection::new(1.).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_node(1., 0).unwrap();
        tables.add_node(2., 0).unwrap();
        tables.add_edge(0., 1., 1, 0).unwrap();
        tables.add_edge(0., 1., 2, 1).unwrap();
        let idmap = simplify(&[0, 1], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[0, 1, -1]));
        assert_eq!(tables.num_edges(), 1);
        assert_eq!(tables.edge(0).parent, 1);
        assert_eq!(tables.edge(0).child, 0);
        assert!(tables.node(1).is_sample());
        assert_eq!(tables.node(1).time, 1.);
    }

    #[test]
    fn test_unreached_ancient_sample() {
        let mut tables = cherry();
        tables.add_node(3., 0).unwrap();
        let idmap = simplify(&[0, 1, 3], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[0, 1, 2, 3]));
        assert!(tables.node(3).is_sample());
        assert_eq!(tables.num_edges(), 2);
    }

    #[test]
    fn test_mutations_follow_ancestry() {
        let mut tables = TableCollection::new(10.).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_node(1., 0).unwrap();
        tables.add_node(2., 0).unwrap();
        tables.add_node(0., 0).unwrap();
        tables.add_edge(0., 10., 2, 0).unwrap();
        tables.add_edge(0., 10., 2, 1).unwrap();
        tables.add_edge(0., 10., 3, 2).unwrap();
        tables.add_edge(0., 10., 3, 4).unwrap();
        // On the sample
        tables.add_site(1., vec![0]).unwrap();
        tables.add_mutation(0, 0, vec![1]).unwrap();
        // On the root, above the samples' MRCA
        tables.add_site(2., vec![0]).unwrap();
        tables.add_mutation(1, 3, vec![1]).unwrap();
        // Only ancestral to the dropped node 4
        tables.add_site(3., vec![0]).unwrap();
        tables.add_mutation(2, 4, vec![1]).unwrap();
        // No mutations at all
        tables.add_site(4., vec![0]).unwrap();
        // Two mutations at one site
        tables.add_site(5., vec![0]).unwrap();
        tables.add_mutation(4, 2, vec![1]).unwrap();
        tables.add_mutation(4, 1, vec![0]).unwrap();
        let before = tables.clone();

        let idmap = simplify(&[0, 1], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&[0, 1, 2, -1, -1]));
        let positions = tables.sites().iter().map(|s| s.position.raw()).collect::<Vec<_>>();
        assert_eq!(positions, vec![1., 2., 5.]);
        let muts = tables
            .mutations()
            .iter()
            .map(|m| (m.site.raw(), m.node.raw()))
            .collect::<Vec<_>>();
        // Node 3 is unary over 2, so its mutation moves to 2.
        assert_eq!(muts, vec![(0, 0), (1, 2), (2, 1), (2, 2)]);

        let mut tables = before;
        simplify(&[0, 1], SimplificationFlags::empty(), &mut tables).unwrap();
        let positions = tables.sites().iter().map(|s| s.position.raw()).collect::<Vec<_>>();
        assert_eq!(positions, vec![1., 2., 3., 4., 5.]);
        assert_eq!(tables.num_mutations(), 4);
    }

    #[test]
    fn test_simplify_is_idempotent_on_small_example() {
        let mut tables = TableCollection::new(10.).unwrap();
        for _ in 0..3 {
            tables.add_node(0., 0).unwrap();
        }
        tables.add_node(1., 0).unwrap();
        tables.add_node(2., 0).unwrap();
        tables.add_node(3., 0).unwrap();
        tables.add_edge(0., 6., 3, 0).unwrap();
        tables.add_edge(0., 10., 3, 1).unwrap();
        tables.add_edge(6., 10., 4, 0).unwrap();
        tables.add_edge(0., 10., 4, 2).unwrap();
        tables.add_edge(0., 10., 5, 3).unwrap();
        tables.add_edge(0., 10., 5, 4).unwrap();
        simplify(&[0, 1, 2], SimplificationFlags::default(), &mut tables).unwrap();
        let once = tables.clone();
        let idmap = simplify(&[0, 1, 2], SimplificationFlags::default(), &mut tables).unwrap();
        assert_eq!(idmap, ids(&(0..once.num_nodes() as i32).collect::<Vec<_>>()));
        assert_eq!(tables.nodes(), once.nodes());
        assert_eq!(tables.edges(), once.edges());
    }
}
