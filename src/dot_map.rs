//! Dot-map aggregates: per-candidate-site workable plot data.
//!
//! A `DotMapItem` is rebuilt wholesale whenever the map analysis reports
//! dirty plot state; it never updates incrementally. Yield work is
//! deduplicated through [`KeyInfo`] entries keyed by canonical plot key.

use crate::area::SubAreaId;
use crate::coords::PlotCoords;
use crate::host::PlotSnapshot;
use crate::output::{OutputWeights, PlotYield};
use crate::plot_info::{self, PlotKey};
use crate::rules::*;
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// Everything achievable on a plot, derived once per canonical key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyInfo {
    pub key: PlotKey,
    pub current_yield: PlotYield,
    pub improvements: Vec<(ImprovementType, PlotYield)>,
    pub bonus: Option<BonusType>,
    pub is_water: bool,
}

impl KeyInfo {
    pub fn for_plot(plot: &PlotSnapshot, rules: &RuleSet) -> KeyInfo {
        KeyInfo {
            key: PlotKey::for_plot(plot),
            current_yield: plot_info::base_yield(plot, rules),
            improvements: plot_info::achievable_improvements(plot, rules),
            bonus: plot.bonus,
            is_water: plot.is_water(rules),
        }
    }

    /// The best yield achievable on this plot, improved or not, ranked by
    /// the given weights.
    pub fn best_yield(&self, weights: &OutputWeights) -> PlotYield {
        let value = |y: PlotYield| {
            y.food as i64 * weights.food as i64
                + y.production as i64 * weights.production as i64
                + y.commerce as i64 * weights.gold.max(weights.research) as i64
        };
        self.improvements
            .iter()
            .map(|&(_, y)| y)
            .chain(std::iter::once(self.current_yield))
            .max_by_key(|&y| value(y))
            .unwrap_or(self.current_yield)
    }

    /// The improvement achieving the best yield, if improving helps at all.
    pub fn best_improvement(&self, weights: &OutputWeights) -> Option<(ImprovementType, PlotYield)> {
        let best = self.best_yield(weights);
        if best == self.current_yield {
            return None;
        }
        self.improvements
            .iter()
            .copied()
            .find(|&(_, y)| y == best)
    }
}

/// One workable plot of a candidate city site.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DotMapPlotData {
    pub coords: PlotCoords,
    pub ring: u8,
    pub info: KeyInfo,
    /// An existing city of ours can also work this plot.
    pub shared_with_existing: bool,
}

/// Aggregate data for one candidate city-founding site.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DotMapItem {
    pub city_plot: PlotCoords,
    pub sub_area: SubAreaId,
    pub plots: Vec<DotMapPlotData>,
    pub bonuses: FnvHashSet<BonusType>,
}

impl DotMapItem {
    pub fn new(city_plot: PlotCoords, sub_area: SubAreaId) -> DotMapItem {
        DotMapItem {
            city_plot,
            sub_area,
            plots: Vec::new(),
            bonuses: FnvHashSet::default(),
        }
    }

    pub fn push_plot(&mut self, plot: DotMapPlotData) {
        if let Some(bonus) = plot.info.bonus {
            self.bonuses.insert(bonus);
        }
        self.plots.push(plot);
    }

    /// Summed best achievable yield over the site's workable plots.
    pub fn projected_yield(&self, weights: &OutputWeights) -> PlotYield {
        let mut total = PlotYield::default();
        for plot in &self.plots {
            total += plot.info.best_yield(weights);
        }
        total
    }

    /// Happiness/health contribution of the site's bonus set.
    pub fn bonus_effects(&self, rules: &RuleSet) -> (i32, i32) {
        let mut happy = 0;
        let mut health = 0;
        for &bonus in &self.bonuses {
            let def = rules.bonus(bonus);
            happy += def.happy;
            health += def.health;
        }
        (happy, health)
    }

    /// Turns until each ring's plots could all be worked, simulated with a
    /// greedy best-food assignment. Values are clamped to the horizon.
    pub fn growth_turns(&self, rules: &RuleSet, weights: &OutputWeights, horizon: i32) -> [i32; 2] {
        let ring_count = |ring: u8| self.plots.iter().filter(|p| p.ring == ring).count() as i32;
        let ring1 = ring_count(1);
        let ring2 = ring_count(2);

        // Food-ranked best yields, for greedy plot working as pop grows.
        let mut foods: Vec<i32> = self
            .plots
            .iter()
            .map(|p| p.info.best_yield(weights).food)
            .collect();
        foods.sort_unstable_by(|a, b| b.cmp(a));

        let mut turns = [horizon; 2];
        let mut population = 1i32;
        let mut stored = 0i32;
        for turn in 0..horizon {
            if population >= ring1 && turns[0] == horizon {
                turns[0] = turn;
            }
            if population >= ring1 + ring2 && turns[1] == horizon {
                turns[1] = turn;
                break;
            }
            // City centre feeds two; each citizen works the next-best plot.
            let food: i32 = 2 + foods.iter().take(population as usize).sum::<i32>();
            stored += food - population * rules.scalars.food_per_pop;
            if stored >= rules.growth_threshold(population) {
                stored -= rules.growth_threshold(population);
                population += 1;
            }
        }
        turns
    }
}
