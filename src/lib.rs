//! Tree sequence tables, tree iteration, and
//! simplification implemented from the ground up in rust.
//!
//! The data model follows `tskit`:
//!
//! 1. Time increases into the past.
//!    Thus, parent nodes have time values *greater than*
//!    those of their children.
//! 2. The data layout is "array of structures": each table
//!    is a `Vec` of row types such as [``Node``] and [``Edge``].
//! 3. Genomic locations are [``Position``], a wrapper
//!    around [``f64``].
//!
//! The main entry points are:
//!
//! * [``TreeSequence::tree_iterator``] to visit the trees
//!   along the genome and [``TreeSequence::edge_differences``]
//!   to obtain the edges that change between them.
//! * [``AncestorIndex``] for constant time MRCA queries
//!   within a tree.
//! * [``simplify_tables``] to reduce tables to the history
//!   of a set of samples.

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod error;
mod mrca;
mod newtypes;
mod position_map;
mod segment;
mod simplification;
mod tables;
mod trees;

pub mod prelude;

pub use error::TreeSeqError;
pub use mrca::{AncestorIndex, MrcaError};
pub use newtypes::*;
pub use position_map::PositionMap;
pub use segment::{Segment, SegmentArena, SegmentError};
pub use simplification::{
    simplify_tables, SimplificationError, SimplificationFlags, SimplificationOutput,
};
pub use tables::*;
pub use trees::*;

/// Get the treeseq version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
