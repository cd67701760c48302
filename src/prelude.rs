//! # Prelude
//!
//! Contains definitions that are useful to
//! have global
//!
//! ## Examples
//!
//! ```
//! use treeseq::prelude::*;
//! ```

pub use crate::newtypes::*;
pub use crate::simplification::*;
pub use crate::tables::*;
pub use crate::trees::*;
pub use crate::{AncestorIndex, MrcaError, TreeSeqError};
