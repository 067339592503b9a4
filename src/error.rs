use crate::coords::PlotCoords;
use crate::rules::{CityId, UnitId};
use thiserror::Error;

/// Internal-consistency failures.
///
/// These mark a genuine invariant violation (a game object referencing an
/// entry the tracking layer never registered), not a recoverable business
/// case. Callers decide whether to propagate or to skip the affected
/// decision for the turn; "not found / not applicable" outcomes are modelled
/// as `Option` values, never as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("no city registered with id {0:?}")]
    MissingCity(CityId),
    #[error("no unit registered with id {0:?}")]
    MissingUnit(UnitId),
    #[error("stored plot key disagrees with recomputed key at {0:?}")]
    PlotKeyMismatch(PlotCoords),
    #[error("construct items target different buildables and cannot merge")]
    MergeTargetMismatch,
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
