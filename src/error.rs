use thiserror::Error;

/// Errors returned by [`AvlTree`](crate::AvlTree) operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// The key is not present in the tree.
    #[error("key not found")]
    NotFound,
    /// The handle was obtained before an operation that removed nodes from its tree.
    #[error("handle invalidated by a removal")]
    Invalidated,
    /// The handle was obtained from a different tree.
    #[error("handle belongs to a different tree")]
    ForeignHandle,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
