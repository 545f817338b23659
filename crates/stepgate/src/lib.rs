#![forbid(unsafe_code)]

//! stepgate public facade crate.
//!
//! Re-exports the reactive cells and the wizard state machine under one
//! roof. Most users only need the prelude:
//!
//! ```
//! use stepgate::prelude::*;
//!
//! let name = Observable::new(String::new());
//! let required = Requirement::simple(|s: &String| s.is_empty().then(|| "required".into()));
//! required.data().bind(&name);
//!
//! let wizard = Wizard::new([
//!     Step::new("Name", ()).with_requirement(required),
//!     Step::new("Done", ()),
//! ])?;
//! assert_eq!(wizard.next_enabled().get(), Ok(false));
//!
//! name.set("Ada".into());
//! wizard.next()?;
//! assert_eq!(wizard.finish_enabled().get(), Ok(true));
//! # Ok::<(), WizardError>(())
//! ```

pub use stepgate_reactive as reactive;
pub use stepgate_wizard as wizard;

#[cfg(feature = "tracing-json")]
pub use stepgate_reactive::logging::init_json;

pub mod prelude {
    pub use stepgate_reactive::{
        Derived, Observable, ObservableList, ReactiveError, Source, Subscription,
    };
    pub use stepgate_wizard::{
        MarkerFill, MarkerState, MarkerTone, NavState, Requirement, RequirementKind, Step,
        Validated, Wizard, WizardError,
    };
}
