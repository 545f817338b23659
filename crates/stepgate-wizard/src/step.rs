#![forbid(unsafe_code)]

//! One page of a wizard.

use std::fmt;
use std::rc::Rc;

use stepgate_reactive::{Derived, Observable, ObservableList};

use crate::requirement::Validated;

/// A titled page with displayable content and a list of requirements.
///
/// `all_valid` is `true` exactly when every requirement's error has been
/// computed and is `None`. A requirement still waiting for data counts as
/// invalid; a step with no requirements is valid.
///
/// Cloning creates a new handle to the **same** step.
pub struct Step<C> {
    title: Observable<String>,
    content: Observable<C>,
    requirements: ObservableList<Rc<dyn Validated>>,
    all_valid: Derived<bool>,
}

impl<C> Clone for Step<C> {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            content: self.content.clone(),
            requirements: self.requirements.clone(),
            all_valid: self.all_valid.clone(),
        }
    }
}

impl<C: Clone + 'static> fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("title", &self.title.try_get())
            .field("requirements", &self.requirements.len())
            .field("all_valid", &self.all_valid.try_get())
            .finish()
    }
}

impl<C: Clone + 'static> Step<C> {
    pub fn new(title: impl Into<String>, content: C) -> Self {
        let requirements: ObservableList<Rc<dyn Validated>> = ObservableList::new();
        let all_valid = requirements.aggregate(
            |requirement| requirement.error(),
            |errors| errors.iter().all(|error| matches!(error, Some(None))),
        );
        Self {
            title: Observable::new(title.into()),
            content: Observable::new(content),
            requirements,
            all_valid,
        }
    }

    /// Builder form of [`Step::add_requirement`].
    #[must_use]
    pub fn with_requirement(self, requirement: impl Validated + 'static) -> Self {
        self.add_requirement(requirement);
        self
    }

    pub fn add_requirement(&self, requirement: impl Validated + 'static) {
        self.requirements.push(Rc::new(requirement));
    }

    /// The live requirement list. Pushing or removing here updates
    /// `all_valid` immediately.
    #[must_use]
    pub fn requirements(&self) -> &ObservableList<Rc<dyn Validated>> {
        &self.requirements
    }

    #[must_use]
    pub fn title(&self) -> Observable<String> {
        self.title.clone()
    }

    #[must_use]
    pub fn content(&self) -> Observable<C> {
        self.content.clone()
    }

    #[must_use]
    pub fn all_valid(&self) -> Derived<bool> {
        self.all_valid.clone()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.all_valid.try_get().unwrap_or(false)
    }

    /// Current error messages, in requirement order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.requirements
            .to_vec()
            .iter()
            .filter_map(|requirement| requirement.error().try_get().flatten())
            .collect()
    }
}
