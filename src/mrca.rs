//! Constant-time most recent common ancestor queries.
//!
//! [`AncestorIndex`] implements the Schieber-Vishkin
//! algorithm as described in TAOCP volume 4A, pages 164-167.
//! An oriented forest, given as a parent array, is preprocessed
//! in linear time into a "sideways heap".  Queries then take
//! constant time.

use crate::newtypes::NodeId;

/// Error type for [`AncestorIndex`].
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MrcaError {
    /// A node id does not refer to a node of the forest.
    #[error("node {node} out of range for a forest of {num_nodes} nodes")]
    NodeOutOfRange {
        /// The offending node
        node: NodeId,
        /// Size of the forest
        num_nodes: usize,
    },
}

// Index zero is the virtual root.
const LAMBDA: usize = 0;

#[inline]
fn lowest_set_bit(x: u64) -> u64 {
    x & x.wrapping_neg()
}

/// Preprocessed oriented forest answering
/// [`mrca`](AncestorIndex::mrca) queries in O(1) time.
///
/// Internally, node `i` is stored at index `i + 1`.
///
/// # Example
///
/// ```
/// use treeseq::AncestorIndex;
/// use treeseq::NodeId;
///
/// //    2
/// //  +-+-+
/// //  0   1   3
/// let parents = [2, 2, -1, -1]
///     .iter()
///     .map(|p| NodeId::from(*p))
///     .collect::<Vec<_>>();
/// let index = AncestorIndex::new(&parents).unwrap();
/// assert_eq!(index.mrca(0, 1).unwrap(), 2);
/// assert_eq!(index.mrca(0, 3).unwrap(), NodeId::NULL);
/// ```
#[derive(Clone, Debug)]
pub struct AncestorIndex {
    lambda: Vec<u32>,
    pi: Vec<u64>,
    tau: Vec<usize>,
    beta: Vec<u64>,
    alpha: Vec<u64>,
}

impl AncestorIndex {
    /// Preprocess the forest described by `parents`.
    ///
    /// `parents[i]` is the parent of node `i`, or
    /// [`NodeId::NULL`] if `i` is a root.
    ///
    /// # Errors
    ///
    /// [`MrcaError::NodeOutOfRange`] if a parent is not a valid node.
    ///
    /// # Note
    ///
    /// The parent array must not contain cycles.
    /// Nodes on a cycle are never visited, so queries
    /// involving them return meaningless values.
    pub fn new(parents: &[NodeId]) -> Result<Self, MrcaError> {
        let num_nodes = parents.len();
        let n = num_nodes + 1;
        let mut parent = vec![LAMBDA; n];
        for (i, p) in parents.iter().enumerate() {
            if !p.is_null() {
                if p.as_index() >= num_nodes {
                    return Err(MrcaError::NodeOutOfRange {
                        node: *p,
                        num_nodes,
                    });
                }
                parent[i + 1] = p.as_index() + 1;
            }
        }

        let mut rv = Self {
            lambda: vec![0; n],
            pi: vec![0; n],
            tau: vec![LAMBDA; n],
            beta: vec![0; n],
            alpha: vec![0; n],
        };
        rv.preprocess(&parent);
        Ok(rv)
    }

    fn preprocess(&mut self, parent: &[usize]) {
        let n = parent.len();
        let mut child = vec![LAMBDA; n];
        let mut sib = vec![LAMBDA; n];
        for u in 1..n {
            let v = parent[u];
            sib[u] = child[v];
            child[v] = u;
        }

        // First traversal: preorder numbers, beta, tau.
        let mut count: usize = 0;
        let mut p = child[LAMBDA];
        while p != LAMBDA {
            loop {
                count += 1;
                self.pi[p] = count as u64;
                self.tau[count] = LAMBDA;
                self.lambda[count] = if count == 1 {
                    0
                } else {
                    1 + self.lambda[count >> 1]
                };
                if child[p] != LAMBDA {
                    p = child[p];
                } else {
                    break;
                }
            }
            self.beta[p] = count as u64;
            loop {
                self.tau[self.beta[p] as usize] = parent[p];
                if sib[p] != LAMBDA {
                    p = sib[p];
                    break;
                }
                p = parent[p];
                if p == LAMBDA {
                    break;
                }
                let h = self.lambda[(count as u64 & self.pi[p].wrapping_neg()) as usize];
                self.beta[p] = (((count as u64) >> h) | 1) << h;
            }
        }

        // Second traversal: alpha.
        self.lambda[LAMBDA] = self.lambda[count];
        self.pi[LAMBDA] = 0;
        self.beta[LAMBDA] = 0;
        self.alpha[LAMBDA] = 0;
        p = child[LAMBDA];
        while p != LAMBDA {
            loop {
                self.alpha[p] = self.alpha[parent[p]] | lowest_set_bit(self.beta[p]);
                if child[p] != LAMBDA {
                    p = child[p];
                } else {
                    break;
                }
            }
            loop {
                if sib[p] != LAMBDA {
                    p = sib[p];
                    break;
                }
                p = parent[p];
                if p == LAMBDA {
                    break;
                }
            }
        }
    }

    /// The number of nodes in the forest.
    pub fn num_nodes(&self) -> usize {
        self.pi.len() - 1
    }

    fn internal_index<N: Into<NodeId>>(&self, u: N) -> Result<usize, MrcaError> {
        let u = u.into();
        if u.is_null() || u.as_index() >= self.num_nodes() {
            Err(MrcaError::NodeOutOfRange {
                node: u,
                num_nodes: self.num_nodes(),
            })
        } else {
            Ok(u.as_index() + 1)
        }
    }

    // Nearest ancestor of x lying on the path
    // whose representative has level h.
    fn ancestor_at_level(&self, x: usize, h: u32, j: u64) -> usize {
        if j == self.beta[x] {
            x
        } else {
            let l = self.lambda[(self.alpha[x] & ((1u64 << h) - 1)) as usize];
            self.tau[(((self.beta[x] >> l) | 1) << l) as usize]
        }
    }

    /// Return the most recent common ancestor
    /// of `x` and `y`.
    ///
    /// Returns [`NodeId::NULL`] if the nodes are in different trees.
    ///
    /// # Errors
    ///
    /// [`MrcaError::NodeOutOfRange`] if `x` or `y` are not nodes
    /// of the forest.
    pub fn mrca<X: Into<NodeId>, Y: Into<NodeId>>(&self, x: X, y: Y) -> Result<NodeId, MrcaError> {
        let x = self.internal_index(x)?;
        let y = self.internal_index(y)?;

        let (bx, by) = (self.beta[x], self.beta[y]);
        let h = if bx <= by {
            self.lambda[(by & bx.wrapping_neg()) as usize]
        } else {
            self.lambda[(bx & by.wrapping_neg()) as usize]
        };
        let k = self.alpha[x] & self.alpha[y] & (1u64 << h).wrapping_neg();
        let h = self.lambda[lowest_set_bit(k) as usize];
        let j = ((bx >> h) | 1) << h;
        let xhat = self.ancestor_at_level(x, h, j);
        let yhat = self.ancestor_at_level(y, h, j);
        let z = if self.pi[xhat] <= self.pi[yhat] {
            xhat
        } else {
            yhat
        };
        if z == LAMBDA {
            Ok(NodeId::NULL)
        } else {
            // The forest size fits in i32, as do the ids.
            Ok(NodeId::from((z - 1) as i32))
        }
    }
}


#[cfg(test)]
mod test_mrca {
    use super::naive::naive_mrca;
    use super::*;

    fn to_ids(parents: &[i32]) -> Vec<NodeId> {
        parents.iter().map(|p| NodeId::from(*p)).collect()
    }

    fn check_all_pairs(parents: &[NodeId]) {
        let index = AncestorIndex::new(parents).unwrap();
        assert_eq!(index.num_nodes(), parents.len());
        for x in 0..parents.len() {
            for y in 0..parents.len() {
                assert_eq!(
                    index.mrca(x as i32, y as i32).unwrap(),
                    naive_mrca(parents, x, y),
                    "{} {}",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_single_node() {
        let index = AncestorIndex::new(&to_ids(&[-1])).unwrap();
        assert_eq!(index.mrca(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_empty_forest() {
        let index = AncestorIndex::new(&[]).unwrap();
        assert_eq!(index.num_nodes(), 0);
        assert!(index.mrca(0, 0).is_err());
    }

    #[test]
    fn test_cherry() {
        check_all_pairs(&to_ids(&[2, 2, -1]));
    }

    #[test]
    fn test_caterpillar() {
        //         6
        //       +-+-+
        //       5   |
        //     +-+-+ |
        //     4   | |
        //   +-+-+ | |
        //   0   1 2 3
        check_all_pairs(&to_ids(&[4, 4, 5, 6, 5, 6, -1]));
    }

    #[test]
    fn test_forest_with_singletons() {
        check_all_pairs(&to_ids(&[-1, 5, 5, -1, 6, 6, -1, 0, 0]));
    }

    #[test]
    fn test_parents_listed_before_children() {
        check_all_pairs(&to_ids(&[-1, 0, 0, 1, 1, 2, 2, 3, 3, 6]));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            AncestorIndex::new(&to_ids(&[3, -1])).unwrap_err(),
            MrcaError::NodeOutOfRange {
                node: NodeId::from(3),
                num_nodes: 2
            }
        );
        let index = AncestorIndex::new(&to_ids(&[2, 2, -1])).unwrap();
        assert!(index.mrca(0, 3).is_err());
        assert!(index.mrca(-1, 0).is_err());
        assert!(index.mrca(NodeId::NULL, 1).is_err());
    }

    #[test]
    fn test_cycle_terminates() {
        // 1 and 2 point at one another and are never visited.
        let index = AncestorIndex::new(&to_ids(&[-1, 2, 1])).unwrap();
        assert_eq!(index.mrca(0, 0).unwrap(), 0);
        let _ = index.mrca(1, 2).unwrap();
    }
}
