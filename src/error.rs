//! Error handling
use thiserror::Error;

/// Primary error type.
///
/// Each member redirects the error type
/// of one part of the crate, so that
/// client code can use `?` across them.
#[derive(Error, Debug, PartialEq)]
pub enum TreeSeqError {
    /// A redirection of a [``crate::TablesError``]
    #[error("{value}")]
    TablesError {
        /// The redirected error
        #[from]
        value: crate::TablesError,
    },
    /// A redirection of a [``crate::TreesError``]
    #[error("{value}")]
    TreesError {
        /// The redirected error
        #[from]
        value: crate::TreesError,
    },
    /// A redirection of a [``crate::MrcaError``]
    #[error("{value}")]
    MrcaError {
        /// The redirected error
        #[from]
        value: crate::MrcaError,
    },
    /// A redirection of a [``crate::SimplificationError``]
    #[error("{value}")]
    SimplificationError {
        /// The redirected error
        #[from]
        value: crate::SimplificationError,
    },
}
