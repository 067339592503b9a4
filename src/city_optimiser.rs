//! Plot and specialist assignment under a multi-objective value function.
//!
//! Given per-output weights and a growth policy, assigns the city's
//! workable citizens to plots and specialist slots to maximise the weighted
//! output, then repairs the assignment until the policy's net-food
//! constraint holds. Re-run whenever the candidate plot set or the city's
//! modifiers change.

use crate::city_data::CityData;
use crate::output::{CityOutput, OutputWeights, PlotYield};
use crate::rules::RuleSet;
use itertools::Itertools;
use log::trace;

/// Net-food policy constraining the assignment.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GrowthPolicy {
    /// Require a positive surplus when one is achievable.
    Grow,
    /// Require a non-negative surplus when one is achievable.
    Maintain,
    /// No food constraint; maximise weighted value outright.
    Starve,
}

/// Result of an optimisation pass.
#[derive(Clone, Debug)]
pub struct OptimisedAssignment {
    pub output: CityOutput,
    pub weighted_value: i64,
    pub food_surplus: i32,
}

fn plot_value(yield_: PlotYield, weights: &OutputWeights) -> i64 {
    // Commerce is valued at the better of the gold/research weights; the
    // slider decides later where it actually goes.
    yield_.food as i64 * weights.food as i64
        + yield_.production as i64 * weights.production as i64
        + yield_.commerce as i64 * weights.gold.max(weights.research) as i64
}

/// Assign worked plots and specialists in `data` in place.
pub fn optimise(
    data: &mut CityData,
    rules: &RuleSet,
    weights: &OutputWeights,
    policy: GrowthPolicy,
) -> OptimisedAssignment {
    for plot in &mut data.plots {
        plot.worked = false;
    }
    data.specialists.clear();

    let workers = data.workable_citizens();

    // Rank candidate plots by weighted value, best first.
    let mut candidates: Vec<usize> = data
        .plots
        .iter()
        .enumerate()
        .filter(|(_, p)| p.controlled && !p.locked)
        .map(|(i, _)| i)
        .sorted_by_key(|&i| -plot_value(data.plots[i].yield_, weights))
        .collect();

    let plot_count = candidates.len().min(workers.max(0) as usize);
    for &index in candidates.iter().take(plot_count) {
        data.plots[index].worked = true;
    }
    candidates.drain(..plot_count);

    // Spare citizens fill specialist slots, best slot first.
    let spare = (workers.max(0) as usize).saturating_sub(plot_count);
    let slots = data
        .specialist_slots
        .iter()
        .copied()
        .sorted_by_key(|&s| {
            let def = rules.specialist(s);
            -(plot_value(def.yield_, weights)
                + def.commerce.gold as i64 * weights.gold as i64
                + def.commerce.research as i64 * weights.research as i64
                + def.commerce.culture as i64 * weights.culture as i64
                + def.gpp as i64 * weights.gpp as i64)
        })
        .take(spare)
        .collect::<Vec<_>>();
    data.specialists = slots;

    // Repair the assignment until the growth policy's food bound holds.
    // Swap the lowest-value worked plot for the highest-food unworked one;
    // each swap strictly increases food, so the loop is bounded.
    let required = match policy {
        GrowthPolicy::Grow => 1,
        GrowthPolicy::Maintain => 0,
        GrowthPolicy::Starve => i32::MIN,
    };
    while policy != GrowthPolicy::Starve && data.food_surplus(rules) < required {
        let worst_worked = data
            .plots
            .iter()
            .enumerate()
            .filter(|(_, p)| p.worked)
            .min_by_key(|(_, p)| (plot_value(p.yield_, weights), p.yield_.food));
        let best_food = candidates
            .iter()
            .copied()
            .max_by_key(|&i| data.plots[i].yield_.food);

        match (worst_worked, best_food) {
            (Some((worked_index, worked)), Some(swap_index))
                if data.plots[swap_index].yield_.food > worked.yield_.food =>
            {
                trace!(
                    target: "optimiser",
                    "city {:?}: swapping {:?} for {:?} to satisfy {:?}",
                    data.city, worked.coords, data.plots[swap_index].coords, policy
                );
                data.plots[worked_index].worked = false;
                data.plots[swap_index].worked = true;
                candidates.retain(|&i| i != swap_index);
                candidates.push(worked_index);
            }
            _ => break, // no swap can raise food further
        }
    }

    let output = data.output(rules);
    OptimisedAssignment {
        output,
        weighted_value: output.weighted(weights),
        food_surplus: data.food_surplus(rules),
    }
}

/// Optimise a clone and report the value without mutating the live data.
pub fn projected_value(
    data: &CityData,
    rules: &RuleSet,
    weights: &OutputWeights,
    policy: GrowthPolicy,
) -> i64 {
    let mut scratch = data.clone();
    optimise(&mut scratch, rules, weights, policy).weighted_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city_data::PlotOutput;
    use crate::coords::PlotCoords;
    use crate::output::Commerce;
    use crate::rules::*;
    use std::collections::VecDeque;

    fn city_with_plots(plots: Vec<(i32, i32, i32)>) -> CityData {
        CityData {
            city: CityId(0),
            owner: PlayerId(0),
            centre: PlotCoords::new(10, 10),
            population: 2,
            stored_food: 0,
            culture: 0,
            culture_level: 2,
            gpp: 0,
            buildings: Vec::new(),
            centre_yield: PlotYield::new(2, 1, 1),
            plots: plots
                .into_iter()
                .enumerate()
                .map(|(i, (f, p, c))| PlotOutput {
                    coords: PlotCoords::new(i as i16, 0),
                    ring: 1,
                    yield_: PlotYield::new(f, p, c),
                    bonus: None,
                    improvement: None,
                    upgrade: None,
                    worked: false,
                    locked: false,
                    controlled: true,
                })
                .collect(),
            specialist_slots: Vec::new(),
            specialists: Vec::new(),
            modifiers: Default::default(),
            rates: Default::default(),
            flat_yield: PlotYield::default(),
            flat_commerce: Commerce::default(),
            queue: VecDeque::new(),
            maintenance: 0,
            base_happy: 6,
            base_health: 6,
            bonus_happy: 0,
            bonus_health: 0,
        }
    }

    #[test]
    fn grow_policy_swaps_in_food_plots() {
        let rules = RuleSet::default();
        // Two production monsters and one food plot; production-heavy
        // weights would pick the mines, but Grow must pull in the farm.
        let mut data = city_with_plots(vec![(0, 5, 0), (0, 5, 0), (4, 0, 0)]);
        let weights = OutputWeights {
            food: 1,
            production: 10,
            gold: 1,
            research: 1,
            culture: 0,
            gpp: 0,
        };
        optimise(&mut data, &rules, &weights, GrowthPolicy::Grow);
        assert!(
            data.plots[2].worked,
            "food plot must be worked under Grow policy"
        );
        assert!(data.food_surplus(&rules) >= 1);
    }

    #[test]
    fn starve_policy_ignores_food() {
        let rules = RuleSet::default();
        let mut data = city_with_plots(vec![(0, 5, 0), (0, 5, 0), (4, 0, 0)]);
        let weights = OutputWeights {
            food: 1,
            production: 10,
            gold: 1,
            research: 1,
            culture: 0,
            gpp: 0,
        };
        optimise(&mut data, &rules, &weights, GrowthPolicy::Starve);
        assert!(data.plots[0].worked && data.plots[1].worked);
        assert!(!data.plots[2].worked);
    }

    #[test]
    fn worked_plots_bounded_by_population(){
        let rules = RuleSet::default();
        let mut data = city_with_plots(vec![(2, 1, 0), (2, 1, 0), (2, 1, 0), (2, 1, 0)]);
        data.population = 2;
        optimise(
            &mut data,
            &rules,
            &OutputWeights::standard(),
            GrowthPolicy::Maintain,
        );
        assert_eq!(data.plots.iter().filter(|p| p.worked).count(), 2);
    }
}
