#![forbid(unsafe_code)]

//! Multi-step form validation and navigation gating.
//!
//! - [`Requirement`]: a validator bound to one input cell, exposing an
//!   optional error message as a derived value.
//! - [`Step`]: an ordered list of requirements plus displayable content,
//!   with an aggregate "all valid" flag.
//! - [`Wizard`]: the ordered steps plus `active`/`progress` cells and the
//!   derived Prev/Next/Jump/Finish gates.
//!
//! Everything here is built from `stepgate-reactive` cells, so every derived
//! flag is already up to date when the `set` that changed an input returns.

pub mod error;
pub mod marker;
pub mod requirement;
pub mod step;
pub mod wizard;

pub use error::{Result, WizardError};
pub use marker::{MarkerFill, MarkerState, MarkerTone};
pub use requirement::{Requirement, RequirementKind, Validated};
pub use step::Step;
pub use wizard::{NavState, Wizard};
