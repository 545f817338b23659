#![forbid(unsafe_code)]

//! Validators bound to a single input cell.
//!
//! A [`Requirement<T>`] owns a data cell (uninitialized until bound or set)
//! and an error derived from it: `None` while the data is valid, `Some(msg)`
//! otherwise. Three constructors cover the common shapes:
//!
//! - [`Requirement::simple`]: a pure function from the data to an error.
//! - [`Requirement::transform`]: convert the data first and delegate the
//!   error to an inner requirement over the converted value.
//! - [`Requirement::new`]: any derived computation over the data, for
//!   validators that read other cells too.
//!
//! # Example
//!
//! ```
//! use stepgate_reactive::Observable;
//! use stepgate_wizard::Requirement;
//!
//! let name = Observable::new(String::new());
//! let required = Requirement::simple(|s: &String| {
//!     s.is_empty().then(|| "required".to_string())
//! });
//! required.data().bind(&name);
//! assert_eq!(required.message(), Some("required".to_string()));
//!
//! name.set("Ada".into());
//! assert!(required.is_valid());
//! ```

use std::fmt;
use std::rc::Rc;

use stepgate_reactive::{Derived, Observable, Source};

/// How a requirement computes its error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    Simple,
    Transform,
    Custom,
}

/// A validator over one input cell.
///
/// Cloning creates a new handle to the **same** requirement.
pub struct Requirement<T> {
    data: Observable<T>,
    error: Derived<Option<String>>,
    kind: RequirementKind,
}

impl<T> Clone for Requirement<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            kind: self.kind,
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Requirement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement")
            .field("kind", &self.kind)
            .field("data", &self.data.try_get())
            .field("error", &self.error.try_get())
            .finish()
    }
}

impl<T: Clone + 'static> Requirement<T> {
    /// General form: `validator` receives a read-only view of the data cell
    /// and returns the error stream.
    ///
    /// The view only emits once the data cell holds a value, so the error
    /// stays uninitialized (pending) until then unless the validator itself
    /// emits earlier.
    pub fn new(validator: impl FnOnce(Derived<T>) -> Derived<Option<String>>) -> Self {
        Self::build(RequirementKind::Custom, validator)
    }

    /// `error = validator(data)`, recomputed on every data emission.
    pub fn simple(validator: impl Fn(&T) -> Option<String> + 'static) -> Self {
        Self::build(RequirementKind::Simple, |data| data.map(validator))
    }

    /// Validate `transform(data)` with `inner`.
    ///
    /// The inner requirement's data cell is bound to the transformed data and
    /// its error becomes this requirement's error.
    ///
    /// # Panics
    ///
    /// Panics if `inner`'s data cell is already bound to another source.
    pub fn transform<U>(transform: impl Fn(&T) -> U + 'static, inner: Requirement<U>) -> Self
    where
        U: Clone + 'static,
    {
        Self::build(RequirementKind::Transform, move |data| {
            inner.data.bind(&data.map(transform));
            inner.error
        })
    }

    fn build(
        kind: RequirementKind,
        validator: impl FnOnce(Derived<T>) -> Derived<Option<String>>,
    ) -> Self {
        let data = Observable::uninit();
        let error = validator(data.read_only());
        Self { data, error, kind }
    }

    /// The input cell. Bind it to a field, or set it directly.
    #[must_use]
    pub fn data(&self) -> Observable<T> {
        self.data.clone()
    }

    #[must_use]
    pub fn error(&self) -> Derived<Option<String>> {
        self.error.clone()
    }

    #[must_use]
    pub fn kind(&self) -> RequirementKind {
        self.kind
    }

    /// `true` once the error has been computed and is `None`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self.error.try_get(), Some(None))
    }

    /// The current error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.error.try_get().flatten()
    }
}

/// Type-erased view of a requirement, as stored in a step.
pub trait Validated {
    fn error(&self) -> Derived<Option<String>>;

    fn kind(&self) -> RequirementKind;

    fn is_valid(&self) -> bool {
        matches!(self.error().try_get(), Some(None))
    }
}

impl<T: Clone + 'static> Validated for Requirement<T> {
    fn error(&self) -> Derived<Option<String>> {
        self.error.clone()
    }

    fn kind(&self) -> RequirementKind {
        self.kind
    }
}

impl<V: Validated + ?Sized> Validated for Rc<V> {
    fn error(&self) -> Derived<Option<String>> {
        (**self).error()
    }

    fn kind(&self) -> RequirementKind {
        (**self).kind()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
