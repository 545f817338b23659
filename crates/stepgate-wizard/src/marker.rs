#![forbid(unsafe_code)]

//! Progress-marker appearance for each step.

/// Outline colour of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerTone {
    Valid,
    Invalid,
    /// Step not reached yet.
    Untouched,
}

/// Fill of a marker; only the active step is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerFill {
    Valid,
    Invalid,
    Transparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerState {
    pub stroke: MarkerTone,
    pub fill: MarkerFill,
    /// Clicking jumps to this step.
    pub clickable: bool,
}

impl MarkerState {
    #[must_use]
    pub fn resolve(index: usize, active: usize, progress: usize, valid: bool) -> Self {
        let reached = index <= progress;
        let stroke = match (reached, valid) {
            (false, _) => MarkerTone::Untouched,
            (true, true) => MarkerTone::Valid,
            (true, false) => MarkerTone::Invalid,
        };
        let fill = match (index == active, valid) {
            (false, _) => MarkerFill::Transparent,
            (true, true) => MarkerFill::Valid,
            (true, false) => MarkerFill::Invalid,
        };
        Self {
            stroke,
            fill,
            clickable: reached,
        }
    }
}
