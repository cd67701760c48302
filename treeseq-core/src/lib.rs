//! Strongly typed scalars shared by the `treeseq` crates.
//!
//! Coordinates ([`Position`]) and times ([`Time`]) are thin wrappers
//! around `f64` that are totally ordered, so that they can key
//! ordered maps and heaps.  Row ids wrap `i32` and use `-1` as
//! their `NULL` value.

use thiserror::Error;

mod macros;
mod newtypes;
mod position;
pub mod prelude;
mod time;

pub use newtypes::{EdgeId, MutationId, NodeId, PopulationId, SiteId};
pub use position::Position;
pub use time::Time;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("invalid position: {0:?}")]
    PositionError(f64),
    #[error("invalid time: {0:?}")]
    TimeError(f64),
    #[error("{0}")]
    ConversionError(String),
}
