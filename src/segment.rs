use crate::newtypes::{NodeId, Position};

/// A segment is a half-open
/// interval of [``Position``]s
/// associated with a [``NodeId``].
///
/// Segments are linked into chains
/// of ancestral material via `next`,
/// an index into a [`SegmentArena`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Left edge of interval
    pub left: Position,
    /// Right edge of interval
    pub right: Position,
    /// The node
    pub node: NodeId,
    /// The following segment of the chain
    pub next: Option<usize>,
}

impl Segment {
    /// Create a new instance.
    pub fn new(left: Position, right: Position, node: NodeId) -> Self {
        Segment {
            left,
            right,
            node,
            next: None,
        }
    }
}

/// Violations of the segment chain invariants.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SegmentError {
    /// A segment with `left >= right`.
    #[error("empty segment [{left}, {right})")]
    EmptySegment {
        /// Left edge
        left: Position,
        /// Right edge
        right: Position,
    },
    /// Two neighbors of a chain overlap or are out of order.
    #[error("segment starting at {left} follows one ending at {previous_right}")]
    UnorderedChain {
        /// Right edge of the earlier segment
        previous_right: Position,
        /// Left edge of the later segment
        left: Position,
    },
    /// A split position outside of `(left, right)`.
    #[error("cannot split [{left}, {right}) at {at}")]
    InvalidSplit {
        /// Left edge
        left: Position,
        /// Right edge
        right: Position,
        /// Requested position
        at: Position,
    },
}

/// Index-addressed storage of [`Segment`] with
/// reuse of freed slots.
#[derive(Default, Debug)]
pub struct SegmentArena {
    segments: Vec<Segment>,
    live: Vec<bool>,
    free_list: Vec<usize>,
}

impl SegmentArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new segment and return its index.
    ///
    /// # Panics
    ///
    /// If `left >= right`.
    pub fn alloc(
        &mut self,
        left: Position,
        right: Position,
        node: NodeId,
        next: Option<usize>,
    ) -> usize {
        assert!(left < right, "empty segment [{}, {})", left, right);
        let seg = Segment {
            next,
            ..Segment::new(left, right, node)
        };
        match self.free_list.pop() {
            Some(i) => {
                self.segments[i] = seg;
                self.live[i] = true;
                i
            }
            None => {
                self.segments.push(seg);
                self.live.push(true);
                self.segments.len() - 1
            }
        }
    }

    /// Return a slot to the arena.
    ///
    /// The slot will be handed out again
    /// by a later [`SegmentArena::alloc`].
    pub fn free(&mut self, idx: usize) {
        debug_assert!(self.live[idx], "double free of segment {}", idx);
        self.live[idx] = false;
        self.free_list.push(idx);
    }

    /// Free every segment of the chain starting at `head`.
    pub fn free_chain(&mut self, head: Option<usize>) {
        let mut current = head;
        while let Some(i) = current {
            current = self.segments[i].next;
            self.free(i);
        }
    }

    /// Split the segment at `idx` into `[left, at)`, kept
    /// at `idx`, and `[at, right)`, which is linked in as
    /// its successor.
    ///
    /// Returns the index of the right-hand piece.
    pub fn split(&mut self, idx: usize, at: Position) -> Result<usize, SegmentError> {
        let seg = self.segments[idx];
        if at <= seg.left || at >= seg.right {
            return Err(SegmentError::InvalidSplit {
                left: seg.left,
                right: seg.right,
                at,
            });
        }
        let rhs = self.alloc(at, seg.right, seg.node, seg.next);
        let lhs = &mut self.segments[idx];
        lhs.right = at;
        lhs.next = Some(rhs);
        Ok(rhs)
    }

    /// Iterate over the indexes of a chain.
    pub fn chain(&self, head: Option<usize>) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(head, move |i| self.segments[*i].next)
    }

    /// Check that all segments of a chain are non-empty,
    /// sorted, and non-overlapping.
    pub fn check_chain(&self, head: Option<usize>) -> Result<(), SegmentError> {
        let mut previous_right: Option<Position> = None;
        for i in self.chain(head) {
            let seg = &self.segments[i];
            if seg.left >= seg.right {
                return Err(SegmentError::EmptySegment {
                    left: seg.left,
                    right: seg.right,
                });
            }
            if let Some(r) = previous_right {
                if r > seg.left {
                    return Err(SegmentError::UnorderedChain {
                        previous_right: r,
                        left: seg.left,
                    });
                }
            }
            previous_right = Some(seg.right);
        }
        Ok(())
    }

    /// Number of segments not on the free list.
    pub fn num_live(&self) -> usize {
        self.segments.len() - self.free_list.len()
    }

    /// Free all segments.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.live.clear();
        self.free_list.clear();
    }
}

impl std::ops::Index<usize> for SegmentArena {
    type Output = Segment;

    fn index(&self, idx: usize) -> &Segment {
        &self.segments[idx]
    }
}

impl std::ops::IndexMut<usize> for SegmentArena {
    fn index_mut(&mut self, idx: usize) -> &mut Segment {
        &mut self.segments[idx]
    }
}

#[cfg(test)]
mod test_segments {
    use super::*;

    fn pos(x: f64) -> Position {
        Position::from(x)
    }

    #[test]
    fn test_alloc_reuses_freed_slots() {
        let mut arena = SegmentArena::new();
        let a = arena.alloc(pos(0.), pos(1.), NodeId::from(0), None);
        let b = arena.alloc(pos(1.), pos(2.), NodeId::from(0), None);
        assert_eq!(arena.num_live(), 2);
        arena.free(a);
        assert_eq!(arena.num_live(), 1);
        let c = arena.alloc(pos(5.), pos(6.), NodeId::from(1), None);
        assert_eq!(c, a);
        assert_ne!(b, c);
        assert_eq!(arena[c].left, 5.);
        assert_eq!(arena.num_live(), 2);
        arena.clear();
        assert_eq!(arena.num_live(), 0);
    }

    #[test]
    fn test_new_segment_is_unlinked() {
        let seg = Segment::new(pos(2.), pos(3.), NodeId::from(7));
        assert_eq!(seg.next, None);
        let mut arena = SegmentArena::new();
        let i = arena.alloc(pos(2.), pos(3.), NodeId::from(7), None);
        assert_eq!(arena[i], seg);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_double_free() {
        let mut arena = SegmentArena::new();
        let a = arena.alloc(pos(0.), pos(1.), NodeId::from(0), None);
        arena.free(a);
        arena.free(a);
    }

    #[test]
    #[should_panic]
    fn test_alloc_empty_segment() {
        let mut arena = SegmentArena::new();
        arena.alloc(pos(1.), pos(1.), NodeId::from(0), None);
    }

    #[test]
    fn test_split() {
        let mut arena = SegmentArena::new();
        let tail = arena.alloc(pos(20.), pos(30.), NodeId::from(3), None);
        let head = arena.alloc(pos(0.), pos(10.), NodeId::from(3), Some(tail));
        let rhs = arena.split(head, pos(4.)).unwrap();
        assert_eq!(arena[head].right, 4.);
        assert_eq!(arena[rhs].left, 4.);
        assert_eq!(arena[rhs].right, 10.);
        assert_eq!(arena[rhs].node, 3);
        assert_eq!(arena[rhs].next, Some(tail));
        assert_eq!(
            arena.chain(Some(head)).collect::<Vec<_>>(),
            vec![head, rhs, tail]
        );
        assert!(arena.check_chain(Some(head)).is_ok());

        for bad in [0., 4., 11.] {
            assert!(matches!(
                arena.split(head, pos(bad)),
                Err(SegmentError::InvalidSplit { .. })
            ));
        }
    }

    #[test]
    fn test_check_chain() {
        let mut arena = SegmentArena::new();
        let tail = arena.alloc(pos(5.), pos(30.), NodeId::from(3), None);
        let head = arena.alloc(pos(0.), pos(10.), NodeId::from(3), Some(tail));
        assert_eq!(
            arena.check_chain(Some(head)),
            Err(SegmentError::UnorderedChain {
                previous_right: pos(10.),
                left: pos(5.)
            })
        );
        arena[tail].left = pos(10.);
        assert!(arena.check_chain(Some(head)).is_ok());
        assert!(arena.check_chain(None).is_ok());
        arena.free_chain(Some(head));
        assert_eq!(arena.num_live(), 0);
    }
}
