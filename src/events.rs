use crate::coords::PlotCoords;
use crate::rules::{BuildingType, ImprovementType};
use serde::{Deserialize, Serialize};

/// Events emitted by `CityData::advance_turn`.
///
/// Handlers batch these into a single needs-reoptimise flag per simulated
/// turn rather than re-optimising after every micro-event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CityEvent {
    PopulationChange(i32),
    HappyCapChange(i32),
    HealthCapChange(i32),
    BuildingDone(BuildingType),
    ImprovementUpgraded(PlotCoords, ImprovementType),
    CultureBorderExpanded(u8),
    PlotControlChanged(PlotCoords),
    GreatPersonBorn,
}

impl CityEvent {
    /// Whether this event invalidates the current plot/specialist assignment.
    pub fn invalidates_assignment(&self) -> bool {
        !matches!(self, CityEvent::GreatPersonBorn)
    }
}
