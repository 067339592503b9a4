//! Worker mission selection from the dot-map improvement data.

use crate::coords::{self, PlotCoords};
use crate::host::{GameView, HostCommand, MissionKind, UnitSnapshot};
use crate::map_analysis::MapAnalysis;
use crate::output::OutputWeights;
use crate::rules::*;
use log::trace;

/// Value gained by improving a plot, for mission ranking.
fn improvement_gain(
    analysis: &MapAnalysis,
    coords: PlotCoords,
    weights: &OutputWeights,
) -> Option<(ImprovementType, i64)> {
    let info = analysis.plot_key_info(coords)?;
    let (improvement, yield_) = info.best_improvement(weights)?;
    let gain = (yield_.food - info.current_yield.food) as i64 * weights.food as i64
        + (yield_.production - info.current_yield.production) as i64
            * weights.production as i64
        + (yield_.commerce - info.current_yield.commerce) as i64
            * weights.gold.max(weights.research) as i64;
    (gain > 0).then_some((improvement, gain))
}

/// Pick the next build mission for a worker: the highest-gain achievable
/// improvement on a plot we own near one of our cities, closest first on
/// ties. Shared plots defer to their assigned improvement city, so two
/// cities never queue conflicting builds for one plot.
pub fn next_worker_mission(
    view: &dyn GameView,
    analysis: &MapAnalysis,
    player: PlayerId,
    unit: &UnitSnapshot,
) -> Option<HostCommand> {
    let weights = OutputWeights::standard();
    let mut best: Option<(PlotCoords, ImprovementType, i64, u32)> = None;

    for city_id in view.player_cities(player) {
        let Some(city) = view.city(city_id) else {
            continue;
        };
        for coords in coords::workable_plots(city.coords, city.culture_level) {
            let Some(plot) = view.plot(coords) else {
                continue;
            };
            if plot.owner != Some(player) || plot.improvement.is_some() {
                continue;
            }
            if let Some(owner) = analysis.shared_plots().improvement_owner(coords) {
                if owner != city_id {
                    continue;
                }
            }
            let Some((improvement, gain)) = improvement_gain(analysis, coords, &weights)
            else {
                continue;
            };
            let distance = unit.coords.step_distance(coords);
            let better = match best {
                Some((_, _, best_gain, best_distance)) => {
                    gain > best_gain || (gain == best_gain && distance < best_distance)
                }
                None => true,
            };
            if better {
                best = Some((coords, improvement, gain, distance));
            }
        }
    }

    let (coords, improvement, gain, _) = best?;
    trace!(
        target: "tactics",
        "worker {:?}: improving {:?} with {:?} (gain {})",
        unit.id, coords, improvement, gain
    );
    Some(HostCommand::PushMission {
        unit: unit.id,
        mission: MissionKind::BuildImprovement(improvement),
        target: Some(coords),
    })
}
