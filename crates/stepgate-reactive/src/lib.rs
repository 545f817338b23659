#![forbid(unsafe_code)]

//! Reactive cells and derived values for stepgate.
//!
//! This crate provides the change-propagation primitives the wizard layer is
//! built on:
//!
//! - [`Observable`]: a mutable, shared cell that notifies subscribers
//!   synchronously on every `set`.
//! - [`Subscription`]: RAII guard that stops delivery when dropped.
//! - [`Derived`]: a read-only value computed from one or more sources via
//!   `map`, `combine2`/`combine3`/`combine_all` and `select`.
//! - [`ObservableList`]: an ordered, mutable collection whose aggregate over
//!   per-item derived values stays correct as items come and go.
//!
//! # Architecture
//!
//! Every handle wraps an `Rc<RefCell<..>>` node, so the whole graph is
//! single-threaded (`!Send`). Propagation is eager and depth-first: when a
//! cell changes, each dependent recomputes and re-notifies its own
//! subscribers before `set` returns.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order, exactly once per `set`.
//! 2. Identical writes are not deduplicated; dependents always recompute.
//! 3. Subscribing pushes the current value immediately when one exists.
//! 4. A derived value over an uninitialized source stays uninitialized and
//!    never invokes its compute function.
//! 5. Diamond-shaped graphs may observe transient intermediate states (no
//!    glitch-freedom guarantee).
//!
//! # Example
//!
//! ```
//! use stepgate_reactive::{Derived, Observable, Source};
//!
//! let width = Observable::new(10);
//! let height = Observable::new(20);
//! let area = Derived::combine2(&width, &height, |w, h| w * h);
//! assert_eq!(area.get().unwrap(), 200);
//!
//! width.set(5);
//! assert_eq!(area.get().unwrap(), 100);
//! ```

pub mod derived;
pub mod error;
pub mod list;
pub mod logging;
pub mod observable;

pub use derived::{Derived, Source};
pub use error::{ReactiveError, Result};
pub use list::ObservableList;
pub use observable::{Observable, Subscription};
