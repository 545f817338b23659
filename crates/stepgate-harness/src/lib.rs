#![forbid(unsafe_code)]

//! Headless form controls and reference wizard fixtures.
//!
//! The controls in [`widgets`] stand in for a real UI toolkit: each one is a
//! bundle of cells that a renderer would bind to. [`flight`] assembles them
//! into a two-step flight-booking wizard, and [`script`] drives that wizard
//! through scripted user actions while recording a JSONL transcript.

pub mod error;
pub mod flight;
pub mod script;
pub mod widgets;

pub use error::{HarnessError, Result};
pub use flight::{FlightBooking, FlightDetails, FlightType, Page, PersonalData};
pub use script::{Action, Field, Outcome, Transcript};
pub use widgets::{ChoiceBox, FieldStyle, TextField};
