#![forbid(unsafe_code)]

//! Two-step flight-booking wizard.
//!
//! Step one collects personal data (name, email, optional phone). Step two
//! collects the flight type and travel dates. The return date is checked
//! against the already parsed start date, and its field is disabled for
//! one-way flights.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDate;
use regex::Regex;
use stepgate::prelude::*;

use crate::error::Result;
use crate::widgets::{ChoiceBox, TextField};

pub const ERROR_REQUIRED: &str = "required";
pub const ERROR_EMAIL: &str = "must be valid email";
pub const ERROR_PHONE: &str = "must be valid phone number";
pub const ERROR_DATE_FORMAT: &str = "must be date of form YYYY-MM-DD";
pub const ERROR_RETURN_BEFORE_START: &str = "return date must not be before start date";

const EMAIL_PATTERN: &str = r"^[a-z.+]+@[a-z.]+\.[a-z]+$";
const PHONE_PATTERN: &str = r"^\+?[0-9 ]+$";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightType {
    OneWay,
    Return,
}

impl FlightType {
    pub const ALL: [FlightType; 2] = [FlightType::OneWay, FlightType::Return];
}

impl fmt::Display for FlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OneWay => "one-way flight",
            Self::Return => "return flight",
        })
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone)]
pub struct PersonalData {
    pub name: TextField,
    pub email: TextField,
    pub phone: TextField,
}

#[derive(Debug, Clone)]
pub struct FlightDetails {
    pub flight_type: ChoiceBox<FlightType>,
    pub start_date: TextField,
    pub return_date: TextField,
    /// Parsed start date, as seen by its inner date requirement.
    pub parsed_start: Derived<Option<NaiveDate>>,
    /// Parsed return date, as seen by its inner date requirement.
    pub parsed_return: Derived<Option<NaiveDate>>,
}

/// Content shown for each step.
#[derive(Debug, Clone)]
pub enum Page {
    Personal(PersonalData),
    Details(FlightDetails),
}

/// The assembled wizard plus direct handles on every control.
pub struct FlightBooking {
    pub wizard: Wizard<Page>,
    pub personal: PersonalData,
    pub details: FlightDetails,
    bookings: Rc<Cell<u32>>,
}

impl fmt::Debug for FlightBooking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlightBooking")
            .field("wizard", &self.wizard)
            .field("bookings", &self.bookings.get())
            .finish()
    }
}

impl FlightBooking {
    /// Build the wizard with both date fields preset to `today`.
    ///
    /// # Errors
    ///
    /// Fails if a validation pattern does not compile.
    pub fn new(today: NaiveDate) -> Result<Self> {
        let email_pattern = Regex::new(EMAIL_PATTERN)?;
        let phone_pattern = Regex::new(PHONE_PATTERN)?;

        let (personal, personal_step) = personal_step(email_pattern, phone_pattern);
        let (details, details_step) = details_step(&format_date(today));
        let wizard = Wizard::new([personal_step, details_step])?;

        let bookings = Rc::new(Cell::new(0));
        let counter = Rc::clone(&bookings);
        wizard.set_on_finish(move || {
            counter.set(counter.get() + 1);
            tracing::info!(message = "flight.booked", count = counter.get());
        });

        Ok(Self {
            wizard,
            personal,
            details,
            bookings,
        })
    }

    /// [`FlightBooking::new`] with the local calendar date.
    ///
    /// # Errors
    ///
    /// See [`FlightBooking::new`].
    pub fn today() -> Result<Self> {
        Self::new(chrono::Local::now().date_naive())
    }

    /// How many times the wizard has been finished.
    #[must_use]
    pub fn bookings(&self) -> u32 {
        self.bookings.get()
    }
}

fn personal_step(email_pattern: Regex, phone_pattern: Regex) -> (PersonalData, Step<Page>) {
    let name = Requirement::simple(|s: &String| s.is_empty().then(|| ERROR_REQUIRED.to_string()));
    let email = Requirement::simple(move |s: &String| {
        if s.is_empty() {
            Some(ERROR_REQUIRED.to_string())
        } else if email_pattern.is_match(s) {
            None
        } else {
            Some(ERROR_EMAIL.to_string())
        }
    });
    // Optional, but checked when present.
    let phone = Requirement::simple(move |s: &String| {
        (!s.is_empty() && !phone_pattern.is_match(s)).then(|| ERROR_PHONE.to_string())
    });

    let data = PersonalData {
        name: TextField::new("Name", ""),
        email: TextField::new("Email", ""),
        phone: TextField::new("Phone", ""),
    };
    data.name.attach(&name);
    data.email.attach(&email);
    data.phone.attach(&phone);

    let step = Step::new("Personal Data", Page::Personal(data.clone()))
        .with_requirement(name)
        .with_requirement(email)
        .with_requirement(phone);
    (data, step)
}

fn details_step(initial_date: &str) -> (FlightDetails, Step<Page>) {
    let flight_type = ChoiceBox::new(FlightType::ALL, FlightType::OneWay);
    let one_way = flight_type.is(FlightType::OneWay);

    let start_parsed = Requirement::simple(|date: &Option<NaiveDate>| {
        date.is_none().then(|| ERROR_DATE_FORMAT.to_string())
    });
    let start_date = start_parsed.data();
    let parsed_start = start_date.read_only();
    let start = Requirement::transform(|s: &String| parse_date(s), start_parsed);

    let return_parsed = {
        let one_way = one_way.clone();
        Requirement::new(move |data: Derived<Option<NaiveDate>>| {
            data.select(move |date: &Option<NaiveDate>| match *date {
                Some(back) => Derived::combine2(&start_date, &one_way, move |start, one_way| {
                    match start {
                        Some(start) if !*one_way && back < *start => {
                            Some(ERROR_RETURN_BEFORE_START.to_string())
                        }
                        _ => None,
                    }
                }),
                None => Derived::constant(Some(ERROR_DATE_FORMAT.to_string())),
            })
        })
    };
    let parsed_return = return_parsed.data().read_only();
    let back = Requirement::transform(|s: &String| parse_date(s), return_parsed);

    let details = FlightDetails {
        flight_type,
        start_date: TextField::new("start date", initial_date),
        return_date: TextField::new("return date", initial_date),
        parsed_start,
        parsed_return,
    };
    details.start_date.attach(&start);
    details.return_date.attach(&back);
    details.return_date.disable_when(&one_way);

    let step = Step::new("Flight Details", Page::Details(details.clone()))
        .with_requirement(start)
        .with_requirement(back);
    (details, step)
}
