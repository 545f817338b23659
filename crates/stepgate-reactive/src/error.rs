use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReactiveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A value was read before anything propagated into it.
    #[error("value read before it was initialized")]
    Uninitialized,

    /// A one-way binding was requested on a cell that already has one.
    #[error("cell is already bound to another source")]
    AlreadyBound,
}
