#![forbid(unsafe_code)]

//! The wizard navigation state machine.
//!
//! # Design
//!
//! A [`Wizard`] owns an ordered, non-empty list of [`Step`]s and two cells:
//! `active` (the step on screen) and `progress` (the furthest step ever
//! reached by moving forward). Every gate is a derived value over those two
//! cells and the steps' `all_valid` flags:
//!
//! ```text
//! prev_enabled   = active > 0
//! next_enabled   = active < last && (active < progress || current_valid)
//! jump_enabled i = i <= progress
//! finish_enabled = progress == last && all_steps_valid
//! ```
//!
//! Actions consult the gate they belong to. A disabled action is rejected
//! with a [`WizardError`] and leaves both cells untouched.
//!
//! # Invariants
//!
//! 1. `0 <= active <= progress <= last` after construction and every action.
//! 2. `progress` never decreases.
//! 3. `prev` and `jump` never change `progress`; `next` raises it only when
//!    moving past it.
//! 4. `content` and `title` always follow the active step.

use std::cell::{Cell, RefCell};
use std::fmt;

use stepgate_reactive::{Derived, Observable, Source};

use crate::error::{Result, WizardError};
use crate::marker::MarkerState;
use crate::step::Step;

/// Snapshot of the two navigation cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NavState {
    pub active: usize,
    pub progress: usize,
}

type FinishCallback = Box<dyn FnMut()>;

pub struct Wizard<C> {
    steps: Vec<Step<C>>,
    active: Observable<usize>,
    progress: Observable<usize>,
    current_valid: Derived<bool>,
    all_steps_valid: Derived<bool>,
    prev_enabled: Derived<bool>,
    next_enabled: Derived<bool>,
    finish_enabled: Derived<bool>,
    jump_enabled: Vec<Derived<bool>>,
    markers: Vec<Derived<MarkerState>>,
    content: Derived<C>,
    title: Derived<String>,
    on_finish: RefCell<Option<FinishCallback>>,
    on_finish_epoch: Cell<u64>,
}

impl<C: Clone + 'static> fmt::Debug for Wizard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("steps", &self.steps.len())
            .field("state", &self.state())
            .field("next_enabled", &self.next_enabled.try_get())
            .field("finish_enabled", &self.finish_enabled.try_get())
            .finish()
    }
}

impl<C: Clone + 'static> Wizard<C> {
    /// Build a wizard positioned on the first step.
    ///
    /// # Errors
    ///
    /// [`WizardError::NoSteps`] if `steps` is empty.
    pub fn new(steps: impl IntoIterator<Item = Step<C>>) -> Result<Self> {
        let steps: Vec<Step<C>> = steps.into_iter().collect();
        if steps.is_empty() {
            return Err(WizardError::NoSteps);
        }
        let last = steps.len() - 1;

        let active = Observable::new(0usize);
        let progress = Observable::new(0usize);

        let valid: Vec<Derived<bool>> = steps.iter().map(Step::all_valid).collect();
        let current_valid = {
            let valid = valid.clone();
            active.select(move |&i| valid[i.min(last)].clone())
        };
        let all_steps_valid = Derived::combine_all(valid.clone(), |flags| flags.iter().all(|v| *v));

        let prev_enabled = active.map(|&a| a > 0);
        let next_enabled = Derived::combine3(&active, &progress, &current_valid, move |&a, &p, &v| {
            a < last && (a < p || v)
        });
        let finish_enabled =
            Derived::combine2(&progress, &all_steps_valid, move |&p, &v| p == last && v);

        let jump_enabled = (0..steps.len())
            .map(|i| progress.map(move |&p| i <= p))
            .collect();
        let markers = valid
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Derived::combine3(&active, &progress, v, move |&a, &p, &v| {
                    MarkerState::resolve(i, a, p, v)
                })
            })
            .collect();

        let content = {
            let contents: Vec<Observable<C>> = steps.iter().map(Step::content).collect();
            active.select(move |&i| contents[i.min(last)].read_only())
        };
        let title = {
            let titles: Vec<Observable<String>> = steps.iter().map(Step::title).collect();
            active.select(move |&i| titles[i.min(last)].read_only())
        };

        Ok(Self {
            steps,
            active,
            progress,
            current_valid,
            all_steps_valid,
            prev_enabled,
            next_enabled,
            finish_enabled,
            jump_enabled,
            markers,
            content,
            title,
            on_finish: RefCell::new(None),
            on_finish_epoch: Cell::new(0),
        })
    }

    // --- Structure ---------------------------------------------------------

    #[must_use]
    pub fn steps(&self) -> &[Step<C>] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, index: usize) -> Option<&Step<C>> {
        self.steps.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`; a wizard has at least one step.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    // --- Read handles ------------------------------------------------------

    #[must_use]
    pub fn active(&self) -> Derived<usize> {
        self.active.read_only()
    }

    #[must_use]
    pub fn progress(&self) -> Derived<usize> {
        self.progress.read_only()
    }

    #[must_use]
    pub fn state(&self) -> NavState {
        NavState {
            active: self.active.try_get().unwrap_or_default(),
            progress: self.progress.try_get().unwrap_or_default(),
        }
    }

    /// Validity of the active step.
    #[must_use]
    pub fn current_valid(&self) -> Derived<bool> {
        self.current_valid.clone()
    }

    #[must_use]
    pub fn all_steps_valid(&self) -> Derived<bool> {
        self.all_steps_valid.clone()
    }

    #[must_use]
    pub fn prev_enabled(&self) -> Derived<bool> {
        self.prev_enabled.clone()
    }

    #[must_use]
    pub fn next_enabled(&self) -> Derived<bool> {
        self.next_enabled.clone()
    }

    #[must_use]
    pub fn finish_enabled(&self) -> Derived<bool> {
        self.finish_enabled.clone()
    }

    #[must_use]
    pub fn jump_enabled(&self, index: usize) -> Option<Derived<bool>> {
        self.jump_enabled.get(index).cloned()
    }

    #[must_use]
    pub fn marker(&self, index: usize) -> Option<Derived<MarkerState>> {
        self.markers.get(index).cloned()
    }

    /// Content of the active step.
    #[must_use]
    pub fn content(&self) -> Derived<C> {
        self.content.clone()
    }

    /// Title of the active step.
    #[must_use]
    pub fn title(&self) -> Derived<String> {
        self.title.clone()
    }

    // --- Actions -----------------------------------------------------------

    /// Move to the previous step.
    ///
    /// # Errors
    ///
    /// [`WizardError::AtFirstStep`] on the first step.
    pub fn prev(&self) -> Result<NavState> {
        let before = self.state();
        if !gate(&self.prev_enabled) {
            return self.reject("prev", WizardError::AtFirstStep);
        }
        self.active.set(before.active.saturating_sub(1));
        Ok(self.moved("prev", before))
    }

    /// Move to the next step, raising `progress` when moving past it.
    ///
    /// # Errors
    ///
    /// [`WizardError::AtLastStep`] on the last step, or
    /// [`WizardError::StepInvalid`] when the active step is the furthest
    /// reached and has unmet requirements.
    pub fn next(&self) -> Result<NavState> {
        let before = self.state();
        if !gate(&self.next_enabled) {
            let err = if before.active >= self.last_index() {
                WizardError::AtLastStep
            } else {
                WizardError::StepInvalid {
                    index: before.active,
                }
            };
            return self.reject("next", err);
        }
        let target = before.active + 1;
        if target > before.progress {
            self.progress.set(target);
        }
        self.active.set(target);
        let after = self.moved("next", before);
        assert!(
            after.progress >= before.progress,
            "wizard progress decreased from {} to {}",
            before.progress,
            after.progress
        );
        Ok(after)
    }

    /// Jump to an already reached step.
    ///
    /// # Errors
    ///
    /// [`WizardError::OutOfRange`] for an index past the last step, or
    /// [`WizardError::NotReached`] for a step beyond `progress`.
    pub fn jump(&self, index: usize) -> Result<NavState> {
        let before = self.state();
        let Some(enabled) = self.jump_enabled.get(index) else {
            return self.reject(
                "jump",
                WizardError::OutOfRange {
                    index,
                    len: self.steps.len(),
                },
            );
        };
        if !gate(enabled) {
            return self.reject(
                "jump",
                WizardError::NotReached {
                    index,
                    progress: before.progress,
                },
            );
        }
        self.active.set(index);
        let after = self.moved("jump", before);
        assert_eq!(
            after.progress, before.progress,
            "jump must not change wizard progress"
        );
        Ok(after)
    }

    /// Run the finish callback, if any.
    ///
    /// The callback is taken out of its slot while it runs, so it may call
    /// back into the wizard, including [`Wizard::set_on_finish`].
    ///
    /// # Errors
    ///
    /// [`WizardError::FinishBlocked`] unless the last step has been reached
    /// and every step is valid.
    pub fn finish(&self) -> Result<NavState> {
        let state = self.state();
        if !gate(&self.finish_enabled) {
            return self.reject(
                "finish",
                WizardError::FinishBlocked {
                    progress: state.progress,
                    last: self.last_index(),
                    all_valid: gate(&self.all_steps_valid),
                },
            );
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "wizard.finish",
            active = state.active,
            progress = state.progress
        );

        let epoch = self.on_finish_epoch.get();
        let callback = self.on_finish.borrow_mut().take();
        if let Some(mut callback) = callback {
            callback();
            if self.on_finish_epoch.get() == epoch {
                *self.on_finish.borrow_mut() = Some(callback);
            }
        }
        Ok(self.state())
    }

    pub fn set_on_finish(&self, callback: impl FnMut() + 'static) {
        self.on_finish_epoch.set(self.on_finish_epoch.get() + 1);
        *self.on_finish.borrow_mut() = Some(Box::new(callback));
    }

    pub fn clear_on_finish(&self) {
        self.on_finish_epoch.set(self.on_finish_epoch.get() + 1);
        *self.on_finish.borrow_mut() = None;
    }

    #[must_use]
    pub fn has_on_finish(&self) -> bool {
        self.on_finish.borrow().is_some()
    }

    // --- Internals ---------------------------------------------------------

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn moved(&self, action: &'static str, before: NavState) -> NavState {
        let after = self.state();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = action_event(action),
            from = before.active,
            to = after.active,
            progress = after.progress
        );
        debug_assert!(after.active <= after.progress && after.progress <= self.last_index());
        after
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn reject(&self, action: &'static str, err: WizardError) -> Result<NavState> {
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "wizard.rejected", action, reason = err.reason());
        Err(err)
    }
}

fn gate(flag: &Derived<bool>) -> bool {
    flag.try_get().unwrap_or(false)
}

#[cfg(feature = "tracing")]
fn action_event(action: &str) -> &'static str {
    match action {
        "prev" => "wizard.prev",
        "next" => "wizard.next",
        _ => "wizard.jump",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{MarkerFill, MarkerTone};
    use crate::requirement::Requirement;
    use std::rc::Rc;

    fn required() -> Requirement<String> {
        Requirement::simple(|s: &String| s.is_empty().then(|| "required".to_string()))
    }

    /// Two steps, each with one required text field.
    fn two_step() -> (Wizard<&'static str>, Observable<String>, Observable<String>) {
        let f1 = Observable::new(String::new());
        let f2 = Observable::new(String::new());
        let (r1, r2) = (required(), required());
        r1.data().bind(&f1);
        r2.data().bind(&f2);
        let wizard = Wizard::new([
            Step::new("One", "page one").with_requirement(r1),
            Step::new("Two", "page two").with_requirement(r2),
        ])
        .unwrap();
        (wizard, f1, f2)
    }

    #[test]
    fn empty_wizard_is_rejected() {
        let err = Wizard::<()>::new(Vec::new()).unwrap_err();
        assert_eq!(err, WizardError::NoSteps);
    }

    #[test]
    fn starts_on_first_step() {
        let (w, _, _) = two_step();
        assert_eq!(w.state(), NavState::default());
        assert_eq!(w.title().get(), Ok("One".to_string()));
        assert_eq!(w.content().get(), Ok("page one"));
        assert_eq!(w.prev_enabled().get(), Ok(false));
        assert_eq!(w.next_enabled().get(), Ok(false));
        assert_eq!(w.finish_enabled().get(), Ok(false));
    }

    #[test]
    fn next_gated_by_current_step() {
        let (w, f1, _) = two_step();
        assert_eq!(w.next(), Err(WizardError::StepInvalid { index: 0 }));
        assert_eq!(w.state(), NavState::default());

        f1.set("x".into());
        assert_eq!(w.next_enabled().get(), Ok(true));
        assert_eq!(
            w.next(),
            Ok(NavState {
                active: 1,
                progress: 1
            })
        );
        assert_eq!(w.title().get(), Ok("Two".to_string()));
        assert_eq!(w.next_enabled().get(), Ok(false));
        assert_eq!(w.next(), Err(WizardError::AtLastStep));
    }

    #[test]
    fn finish_requires_every_step() {
        let (w, f1, f2) = two_step();
        f1.set("x".into());
        w.next().unwrap();
        assert_eq!(w.finish_enabled().get(), Ok(false));

        f2.set("y".into());
        assert_eq!(w.finish_enabled().get(), Ok(true));

        f1.set(String::new());
        assert_eq!(w.finish_enabled().get(), Ok(false));
        assert!(matches!(
            w.finish(),
            Err(WizardError::FinishBlocked {
                progress: 1,
                last: 1,
                all_valid: false
            })
        ));
    }

    #[test]
    fn prev_keeps_progress_and_reached_steps_stay_open() {
        let (w, f1, _) = two_step();
        f1.set("x".into());
        w.next().unwrap();
        assert_eq!(
            w.prev(),
            Ok(NavState {
                active: 0,
                progress: 1
            })
        );
        assert_eq!(w.prev(), Err(WizardError::AtFirstStep));

        // Behind progress, Next does not require the current step to be valid.
        f1.set(String::new());
        assert_eq!(w.current_valid().get(), Ok(false));
        assert_eq!(w.next_enabled().get(), Ok(true));
        assert_eq!(w.next().map(|s| s.active), Ok(1));
    }

    #[test]
    fn jump_only_to_reached_steps() {
        let (w, f1, _) = two_step();
        assert_eq!(w.jump_enabled(1).map(|j| j.get()), Some(Ok(false)));
        assert_eq!(
            w.jump(1),
            Err(WizardError::NotReached {
                index: 1,
                progress: 0
            })
        );
        assert_eq!(w.jump(5), Err(WizardError::OutOfRange { index: 5, len: 2 }));

        f1.set("x".into());
        w.next().unwrap();
        assert_eq!(w.jump(0).map(|s| s.active), Ok(0));
        assert_eq!(w.jump(1).map(|s| s.progress), Ok(1));
        assert!(w.jump_enabled(7).is_none());
    }

    #[test]
    fn single_step_wizard_can_finish_immediately() {
        let w = Wizard::new([Step::new("Only", ())]).unwrap();
        assert_eq!(w.finish_enabled().get(), Ok(true));
        assert_eq!(w.next(), Err(WizardError::AtLastStep));
        assert_eq!(w.prev(), Err(WizardError::AtFirstStep));
        assert_eq!(w.finish(), Ok(NavState::default()));
    }

    #[test]
    fn finish_runs_callback_every_time() {
        let w = Wizard::new([Step::new("Only", ())]).unwrap();
        let runs = Rc::new(Cell::new(0));
        let seen = Rc::clone(&runs);
        w.set_on_finish(move || seen.set(seen.get() + 1));
        w.finish().unwrap();
        w.finish().unwrap();
        assert_eq!(runs.get(), 2);

        w.clear_on_finish();
        assert!(!w.has_on_finish());
        w.finish().unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn finish_callback_may_reenter_wizard() {
        let w = Rc::new(Wizard::new([Step::new("Only", ())]).unwrap());
        let inner = Rc::downgrade(&w);
        let observed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&observed);
        w.set_on_finish(move || {
            if let Some(w) = inner.upgrade() {
                flag.set(w.finish_enabled().get() == Ok(true));
                // Replacing the callback from inside it wins over the restore.
                w.clear_on_finish();
            }
        });
        w.finish().unwrap();
        assert!(observed.get());
        assert!(!w.has_on_finish());
    }

    #[test]
    fn markers_follow_navigation() {
        let (w, f1, _) = two_step();
        let m0 = w.marker(0).unwrap();
        let m1 = w.marker(1).unwrap();
        assert_eq!(m0.get().map(|m| m.fill), Ok(MarkerFill::Invalid));
        assert_eq!(m1.get().map(|m| m.stroke), Ok(MarkerTone::Untouched));

        f1.set("x".into());
        assert_eq!(m0.get().map(|m| m.fill), Ok(MarkerFill::Valid));
        w.next().unwrap();
        assert_eq!(m0.get().map(|m| m.fill), Ok(MarkerFill::Transparent));
        assert_eq!(m0.get().map(|m| m.stroke), Ok(MarkerTone::Valid));
        let m1_now = m1.get().unwrap();
        assert_eq!(m1_now.stroke, MarkerTone::Invalid);
        assert!(m1_now.clickable);
        assert!(w.marker(2).is_none());
    }

    #[test]
    fn requirements_added_later_gate_immediately() {
        let w = Wizard::new([Step::new("A", ()), Step::new("B", ())]).unwrap();
        assert_eq!(w.next_enabled().get(), Ok(true));
        w.step(0).unwrap().add_requirement(required());
        assert_eq!(w.next_enabled().get(), Ok(false));
        assert_eq!(w.all_steps_valid().get(), Ok(false));
    }

    #[test]
    fn step_title_edits_show_through() {
        let (w, _, _) = two_step();
        w.step(0).unwrap().title().set("Renamed".into());
        assert_eq!(w.title().get(), Ok("Renamed".to_string()));
        // Editing an inactive step leaves the shown title alone.
        w.step(1).unwrap().title().set("Other".into());
        assert_eq!(w.title().get(), Ok("Renamed".to_string()));
    }
}
