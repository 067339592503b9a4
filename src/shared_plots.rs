//! Arbitration of plots workable by more than one of the player's cities.
//!
//! A plot lives in the shared index iff at least two cities could work it.
//! Exactly one city at a time is credited with working a shared plot; all
//! eligible cities stay candidates and the assignment is re-arbitrated by
//! comparative simulation whenever city state changes.

use crate::city_data::CityData;
use crate::city_optimiser::{self, GrowthPolicy};
use crate::coords::PlotCoords;
use crate::host::HostCommand;
use crate::output::OutputWeights;
use crate::rules::{CityId, RuleSet};
use fnv::{FnvHashMap, FnvHashSet};
use log::debug;
use serde::{Deserialize, Serialize};

/// One plot contested between cities.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharedPlot {
    pub coords: PlotCoords,
    pub possible_cities: FnvHashSet<CityId>,
    /// Arbitration winner currently credited with working the plot.
    pub assigned_city: Option<CityId>,
    /// Which city owns the plot's improvement decision. Distinct from the
    /// working assignment; workers key off this.
    pub assigned_improvement_city: Option<CityId>,
}

/// Per-city reverse index into the shared plots.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CitySharedPlots {
    pub shared_plots: FnvHashSet<PlotCoords>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SharedPlotIndex {
    shared_plots: FnvHashMap<PlotCoords, SharedPlot>,
    city_shared: FnvHashMap<CityId, CitySharedPlots>,
}

impl SharedPlotIndex {
    /// Register the set of cities able to work a plot. Creates, updates or
    /// removes the entry so the ">= 2 cities" membership invariant holds,
    /// keeping both directions of the index consistent.
    pub fn set_candidates(
        &mut self,
        coords: PlotCoords,
        cities: FnvHashSet<CityId>,
        host_working_city: Option<CityId>,
    ) {
        if cities.len() < 2 {
            self.remove_plot(coords);
            return;
        }
        for &city in &cities {
            self.city_shared
                .entry(city)
                .or_default()
                .shared_plots
                .insert(coords);
        }
        match self.shared_plots.get_mut(&coords) {
            Some(entry) => {
                // Cities that dropped out lose their reverse entries and any
                // assignment they held.
                for gone in entry.possible_cities.difference(&cities) {
                    if let Some(reverse) = self.city_shared.get_mut(gone) {
                        reverse.shared_plots.remove(&coords);
                    }
                }
                if entry
                    .assigned_city
                    .map(|c| !cities.contains(&c))
                    .unwrap_or(false)
                {
                    entry.assigned_city = None;
                }
                if entry
                    .assigned_improvement_city
                    .map(|c| !cities.contains(&c))
                    .unwrap_or(false)
                {
                    entry.assigned_improvement_city = None;
                }
                entry.possible_cities = cities;
            }
            None => {
                let assigned = host_working_city.filter(|c| cities.contains(c));
                self.shared_plots.insert(
                    coords,
                    SharedPlot {
                        coords,
                        possible_cities: cities,
                        assigned_city: assigned,
                        assigned_improvement_city: assigned,
                    },
                );
            }
        }
    }

    /// Drop a plot from both directions of the index.
    pub fn remove_plot(&mut self, coords: PlotCoords) {
        if let Some(entry) = self.shared_plots.remove(&coords) {
            for city in entry.possible_cities {
                if let Some(reverse) = self.city_shared.get_mut(&city) {
                    reverse.shared_plots.remove(&coords);
                }
            }
        }
    }

    /// Remove a city from every `possible_cities` set; entries that fall
    /// below two candidates leave the index entirely.
    pub fn remove_city(&mut self, city: CityId) {
        let affected = self
            .city_shared
            .remove(&city)
            .map(|c| c.shared_plots)
            .unwrap_or_default();
        for coords in affected {
            let drop_entry = match self.shared_plots.get_mut(&coords) {
                Some(entry) => {
                    entry.possible_cities.remove(&city);
                    if entry.assigned_city == Some(city) {
                        entry.assigned_city = None;
                    }
                    if entry.assigned_improvement_city == Some(city) {
                        entry.assigned_improvement_city = None;
                    }
                    entry.possible_cities.len() < 2
                }
                None => false,
            };
            if drop_entry {
                self.remove_plot(coords);
            }
        }
    }

    pub fn plot(&self, coords: PlotCoords) -> Option<&SharedPlot> {
        self.shared_plots.get(&coords)
    }

    pub fn city_plots(&self, city: CityId) -> Option<&CitySharedPlots> {
        self.city_shared.get(&city)
    }

    pub fn plots(&self) -> impl Iterator<Item = &SharedPlot> {
        self.shared_plots.values()
    }

    pub fn improvement_owner(&self, coords: PlotCoords) -> Option<CityId> {
        self.shared_plots
            .get(&coords)
            .and_then(|p| p.assigned_improvement_city)
    }

    /// Re-arbitrate every shared plot against the given city models.
    ///
    /// Each candidate's value is read with the plot workable and then with
    /// it withheld, in that order -- the comparison is a delta, not two
    /// independent absolutes. The plot goes to the city that loses the most
    /// by not working it; with no strict improvement over the incumbent,
    /// the incumbent keeps it.
    pub fn arbitrate(
        &mut self,
        cities: &mut FnvHashMap<CityId, CityData>,
        rules: &RuleSet,
        weights: &OutputWeights,
    ) -> Vec<HostCommand> {
        let mut commands = Vec::new();

        for entry in self.shared_plots.values_mut() {
            let mut best: Option<(CityId, i64)> = None;
            let mut incumbent_loss: Option<i64> = None;

            for &city in &entry.possible_cities {
                let Some(data) = cities.get(&city) else {
                    continue;
                };
                let with = {
                    let mut branch = data.clone();
                    set_locked(&mut branch, entry.coords, false);
                    city_optimiser::projected_value(
                        &branch,
                        rules,
                        weights,
                        GrowthPolicy::Maintain,
                    )
                };
                let without = {
                    let mut branch = data.clone();
                    set_locked(&mut branch, entry.coords, true);
                    city_optimiser::projected_value(
                        &branch,
                        rules,
                        weights,
                        GrowthPolicy::Maintain,
                    )
                };
                let loss = with - without;
                if entry.assigned_city == Some(city) {
                    incumbent_loss = Some(loss);
                }
                if best.map(|(_, b)| loss > b).unwrap_or(true) {
                    best = Some((city, loss));
                }
            }

            let Some((winner, winner_loss)) = best else {
                continue;
            };
            // Tie-break: keep the previous assignment unless the challenger
            // strictly improves on it.
            let final_city = match (entry.assigned_city, incumbent_loss) {
                (Some(incumbent), Some(loss)) if winner_loss <= loss => incumbent,
                _ => winner,
            };

            if entry.assigned_city != Some(final_city) {
                debug!(
                    target: "map",
                    "shared plot {:?} reassigned {:?} -> {:?}",
                    entry.coords, entry.assigned_city, final_city
                );
                entry.assigned_city = Some(final_city);
                if entry.assigned_improvement_city.is_none() {
                    entry.assigned_improvement_city = Some(final_city);
                }
                commands.push(HostCommand::SetWorkingCityOverride {
                    coords: entry.coords,
                    city: Some(final_city),
                });
            }

            // Reflect the arbitration in every candidate's live model.
            for &city in &entry.possible_cities {
                if let Some(data) = cities.get_mut(&city) {
                    set_locked(data, entry.coords, city != final_city);
                }
            }
        }

        commands
    }
}

fn set_locked(data: &mut CityData, coords: PlotCoords, locked: bool) {
    for plot in &mut data.plots {
        if plot.coords == coords {
            plot.locked = locked;
            if locked {
                plot.worked = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i32]) -> FnvHashSet<CityId> {
        ids.iter().map(|&i| CityId(i)).collect()
    }

    #[test]
    fn singleton_candidate_never_enters_index() {
        let mut index = SharedPlotIndex::default();
        index.set_candidates(PlotCoords::new(3, 3), set(&[1]), None);
        assert!(index.plot(PlotCoords::new(3, 3)).is_none());
    }

    #[test]
    fn two_way_consistency_on_city_removal() {
        let mut index = SharedPlotIndex::default();
        let coords = PlotCoords::new(4, 4);
        index.set_candidates(coords, set(&[1, 2]), Some(CityId(1)));

        let entry = index.plot(coords).unwrap();
        assert_eq!(entry.possible_cities.len(), 2);
        assert_eq!(entry.assigned_city, Some(CityId(1)));
        assert!(index
            .city_plots(CityId(2))
            .unwrap()
            .shared_plots
            .contains(&coords));

        // Dropping one city takes the entry below two candidates: the plot
        // must leave the index entirely, in both directions.
        index.remove_city(CityId(1));
        assert!(index.plot(coords).is_none());
        assert!(index
            .city_plots(CityId(2))
            .map(|c| !c.shared_plots.contains(&coords))
            .unwrap_or(true));
    }

    #[test]
    fn three_cities_drop_to_two_keeps_entry() {
        let mut index = SharedPlotIndex::default();
        let coords = PlotCoords::new(5, 5);
        index.set_candidates(coords, set(&[1, 2, 3]), Some(CityId(3)));
        index.remove_city(CityId(3));

        let entry = index.plot(coords).unwrap();
        assert_eq!(entry.possible_cities, set(&[1, 2]));
        assert_eq!(entry.assigned_city, None);
    }
}
