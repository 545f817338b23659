#![forbid(unsafe_code)]

//! Headless stand-ins for form controls.
//!
//! A control is a bundle of cells. Attaching a [`Requirement`] wires the
//! control's value into the requirement's data cell and its error back into
//! the control's tooltip and style.

use std::fmt;

use stepgate::prelude::*;

/// Visual state of a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldStyle {
    #[default]
    Normal,
    Error,
}

/// A labelled single-line text input.
///
/// Cloning creates a new handle to the **same** field.
#[derive(Clone)]
pub struct TextField {
    label: String,
    text: Observable<String>,
    disabled: Observable<bool>,
    error: Observable<Option<String>>,
    tooltip: Derived<Option<String>>,
    style: Derived<FieldStyle>,
}

impl fmt::Debug for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextField")
            .field("label", &self.label)
            .field("text", &self.text.try_get())
            .field("disabled", &self.disabled.try_get())
            .field("error", &self.error.try_get())
            .finish()
    }
}

impl TextField {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        let error: Observable<Option<String>> = Observable::new(None);
        let tooltip = error.map(Option::clone);
        let style = error.map(|e: &Option<String>| {
            if e.is_some() {
                FieldStyle::Error
            } else {
                FieldStyle::Normal
            }
        });
        Self {
            label: label.into(),
            text: Observable::new(text.into()),
            disabled: Observable::new(false),
            error,
            tooltip,
            style,
        }
    }

    /// Validate this field's text with `requirement`.
    ///
    /// # Panics
    ///
    /// Panics if the requirement's data cell, or this field's error display,
    /// is already bound.
    pub fn attach(&self, requirement: &Requirement<String>) {
        requirement.data().bind(&self.text);
        self.error.bind(&requirement.error());
    }

    /// Disable the field while `flag` is `true`.
    pub fn disable_when(&self, flag: &impl Source<bool>) {
        self.disabled.bind(flag);
    }

    /// Simulate the user typing: replaces the text unless the field is
    /// disabled. Returns whether the edit was accepted.
    pub fn type_text(&self, text: impl Into<String>) -> bool {
        if self.is_disabled() {
            return false;
        }
        self.text.set(text.into());
        true
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn text(&self) -> Observable<String> {
        self.text.clone()
    }

    #[must_use]
    pub fn disabled(&self) -> Derived<bool> {
        self.disabled.read_only()
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.try_get().unwrap_or(false)
    }

    /// Error text shown on hover, if any.
    #[must_use]
    pub fn tooltip(&self) -> Derived<Option<String>> {
        self.tooltip.clone()
    }

    #[must_use]
    pub fn style(&self) -> Derived<FieldStyle> {
        self.style.clone()
    }
}

/// A drop-down over a fixed set of items.
///
/// Cloning creates a new handle to the **same** choice box.
#[derive(Clone)]
pub struct ChoiceBox<T> {
    items: Vec<T>,
    selected: Observable<T>,
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for ChoiceBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChoiceBox")
            .field("items", &self.items)
            .field("selected", &self.selected.try_get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ChoiceBox<T> {
    pub fn new(items: impl IntoIterator<Item = T>, initial: T) -> Self {
        Self {
            items: items.into_iter().collect(),
            selected: Observable::new(initial),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Select `value`. Values not among the items are ignored.
    pub fn select(&self, value: T) -> bool {
        if !self.items.contains(&value) {
            return false;
        }
        self.selected.set(value);
        true
    }

    #[must_use]
    pub fn selected(&self) -> Derived<T> {
        self.selected.read_only()
    }

    /// `true` while `value` is selected.
    #[must_use]
    pub fn is(&self, value: T) -> Derived<bool> {
        self.selected.map(move |current| *current == value)
    }
}
