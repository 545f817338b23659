#![forbid(unsafe_code)]

//! Scripted user sessions against the flight-booking wizard.
//!
//! An [`Action`] is one user gesture. [`FlightBooking::apply`] performs it
//! the way a UI would: edits on a disabled field and clicks on a disabled
//! button are refused, and nothing changes. A [`Transcript`] records every
//! step as one JSON object per line for later inspection.

use serde_json::json;
use stepgate::prelude::*;

use crate::flight::{FlightBooking, FlightType};
use crate::widgets::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    StartDate,
    ReturnDate,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::StartDate,
        Field::ReturnDate,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::StartDate => "start_date",
            Self::ReturnDate => "return_date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Type(Field, String),
    Choose(FlightType),
    Prev,
    Next,
    Jump(usize),
    Finish,
}

impl Action {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Type(..) => "type",
            Self::Choose(_) => "choose",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Jump(_) => "jump",
            Self::Finish => "finish",
        }
    }
}

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub accepted: bool,
    pub state: NavState,
    /// Why a navigation action was refused.
    pub error: Option<WizardError>,
}

impl FlightBooking {
    #[must_use]
    pub fn field(&self, field: Field) -> &TextField {
        match field {
            Field::Name => &self.personal.name,
            Field::Email => &self.personal.email,
            Field::Phone => &self.personal.phone,
            Field::StartDate => &self.details.start_date,
            Field::ReturnDate => &self.details.return_date,
        }
    }

    pub fn apply(&self, action: &Action) -> Outcome {
        let nav = match action {
            Action::Type(field, text) => {
                let accepted = self.field(*field).type_text(text.clone());
                return self.outcome(accepted, None);
            }
            Action::Choose(flight_type) => {
                let accepted = self.details.flight_type.select(*flight_type);
                return self.outcome(accepted, None);
            }
            Action::Prev => self.wizard.prev(),
            Action::Next => self.wizard.next(),
            Action::Jump(index) => self.wizard.jump(*index),
            Action::Finish => self.wizard.finish(),
        };
        match nav {
            Ok(_) => self.outcome(true, None),
            Err(err) => self.outcome(false, Some(err)),
        }
    }

    fn outcome(&self, accepted: bool, error: Option<WizardError>) -> Outcome {
        Outcome {
            accepted,
            state: self.wizard.state(),
            error,
        }
    }
}

/// JSONL log of a scripted session.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `action` to `booking` and record the result.
    pub fn run(&mut self, booking: &FlightBooking, action: &Action) -> Outcome {
        let outcome = booking.apply(action);
        self.record(booking, action, &outcome);
        outcome
    }

    pub fn record(&mut self, booking: &FlightBooking, action: &Action, outcome: &Outcome) {
        let detail = match action {
            Action::Type(field, text) => json!({ "field": field.as_str(), "text": text }),
            Action::Choose(flight_type) => json!({ "choice": flight_type.to_string() }),
            Action::Jump(index) => json!({ "index": index }),
            _ => json!(null),
        };
        let line = json!({
            "seq": self.lines.len(),
            "action": action.name(),
            "detail": detail,
            "accepted": outcome.accepted,
            "error": outcome.error.as_ref().map(WizardError::reason),
            "active": outcome.state.active,
            "progress": outcome.state.progress,
            "next_enabled": booking.wizard.next_enabled().try_get(),
            "finish_enabled": booking.wizard.finish_enabled().try_get(),
        });
        tracing::debug!(message = "script.step", action = action.name(), accepted = outcome.accepted);
        self.lines.push(line.to_string());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}
