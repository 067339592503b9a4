//! Canonical plot signatures and achievable yield computation.
//!
//! Two plots with the same [`PlotKey`] are guaranteed identical current and
//! achievable (yield, improvement) pairs, which lets the dot-map deduplicate
//! the yield work across the whole revealed map. Everything that feeds the
//! key must therefore also be everything [`base_yield`] and
//! [`achievable_improvements`] read.

use crate::host::PlotSnapshot;
use crate::output::PlotYield;
use crate::rules::*;
use serde::{Deserialize, Serialize};

/// Canonical signature of a plot's terrain, feature, bonus, route and
/// improvement state.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PlotKey(u64);

const FLAG_HILLS: u64 = 1;
const FLAG_RIVER: u64 = 2;
const FLAG_FRESH_WATER: u64 = 4;
const FLAG_COASTAL: u64 = 8;

fn pack_opt(byte: Option<u8>) -> u64 {
    match byte {
        Some(v) => v as u64 + 1,
        None => 0,
    }
}

impl PlotKey {
    /// Compute the canonical key for a plot's current state.
    pub fn for_plot(plot: &PlotSnapshot) -> PlotKey {
        let mut packed = plot.terrain.0 as u64;
        packed |= pack_opt(plot.feature.map(|f| f.0)) << 8;
        packed |= pack_opt(plot.bonus.map(|b| b.0)) << 16;
        packed |= pack_opt(plot.route.map(|r| r.0)) << 24;
        packed |= pack_opt(plot.improvement.map(|i| i.0)) << 32;

        let mut flags = 0u64;
        if plot.is_hills {
            flags |= FLAG_HILLS;
        }
        if plot.is_river {
            flags |= FLAG_RIVER;
        }
        if plot.is_fresh_water {
            flags |= FLAG_FRESH_WATER;
        }
        if plot.is_coastal {
            flags |= FLAG_COASTAL;
        }
        packed |= flags << 40;

        PlotKey(packed)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Current yield of a plot in its present state (improvement included).
pub fn base_yield(plot: &PlotSnapshot, rules: &RuleSet) -> PlotYield {
    let mut yield_ = rules.terrain(plot.terrain).yield_;

    // Hills trade food for production on passable land.
    if plot.is_hills && !plot.is_water(rules) {
        yield_.production += 1;
        yield_.food = (yield_.food - 1).max(0);
    }
    if plot.is_river {
        yield_.commerce += 1;
    }
    if let Some(feature) = plot.feature {
        yield_ += rules.feature(feature).yield_change;
    }
    if let Some(bonus) = plot.bonus {
        yield_ += rules.bonus(bonus).yield_change;
    }
    if let Some(improvement) = plot.improvement {
        let def = rules.improvement(improvement);
        yield_ += def.yield_change;
        if plot.is_fresh_water {
            yield_ += def.fresh_water_change;
        }
    }
    if let Some(route) = plot.route {
        yield_.commerce += rules.route(route).commerce_change;
    }

    PlotYield {
        food: yield_.food.max(0),
        production: yield_.production.max(0),
        commerce: yield_.commerce.max(0),
    }
}

fn improvement_valid(plot: &PlotSnapshot, def: &ImprovementDef, rules: &RuleSet) -> bool {
    if plot.is_water(rules) || plot.is_impassable(rules) {
        return false;
    }
    if plot.is_hills && !def.valid_on_hills {
        return false;
    }
    if !plot.is_hills && !def.valid_on_flat {
        return false;
    }
    if def.requires_irrigation && !plot.is_fresh_water {
        return false;
    }
    if !def.valid_terrains.is_empty() && !def.valid_terrains.contains(&plot.terrain) {
        return false;
    }
    // A present feature must be removable to make way for the improvement.
    if let Some(feature) = plot.feature {
        if !rules.feature(feature).removable {
            return false;
        }
    }
    true
}

/// All (improvement, resulting yield) pairs achievable on this plot,
/// ignoring tech gating (the tactics layer applies tech filters).
///
/// Depends only on the fields captured by [`PlotKey::for_plot`], preserving
/// the key deduplication invariant.
pub fn achievable_improvements(
    plot: &PlotSnapshot,
    rules: &RuleSet,
) -> Vec<(ImprovementType, PlotYield)> {
    let mut out = Vec::new();

    for improvement in rules.improvement_types() {
        let def = rules.improvement(improvement);
        if !improvement_valid(plot, def, rules) {
            continue;
        }

        // Building over a removable feature loses the feature's yield.
        let mut resulting = {
            let mut stripped = plot.clone();
            stripped.improvement = None;
            if stripped
                .feature
                .map(|f| rules.feature(f).removable)
                .unwrap_or(false)
            {
                stripped.feature = None;
            }
            base_yield(&stripped, rules)
        };
        resulting += def.yield_change;
        if plot.is_fresh_water {
            resulting += def.fresh_water_change;
        }
        if let Some(bonus) = plot.bonus {
            if def.connects_bonuses.contains(&bonus) {
                resulting += rules.bonus(bonus).yield_change;
            }
        }

        out.push((
            improvement,
            PlotYield {
                food: resulting.food.max(0),
                production: resulting.production.max(0),
                commerce: resulting.commerce.max(0),
            },
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PlotCoords;

    fn plot(terrain: u8) -> PlotSnapshot {
        PlotSnapshot {
            coords: PlotCoords::new(0, 0),
            terrain: TerrainType(terrain),
            feature: None,
            bonus: None,
            route: None,
            improvement: None,
            owner: None,
            city: None,
            working_city: None,
            is_hills: false,
            is_river: false,
            is_fresh_water: false,
            is_coastal: false,
            has_goody_hut: false,
        }
    }

    #[test]
    fn key_is_stable_for_unchanged_plot() {
        let mut p = plot(1);
        p.bonus = Some(BonusType(2));
        p.is_river = true;
        let key = PlotKey::for_plot(&p);
        assert_eq!(PlotKey::for_plot(&p), key);
    }

    #[test]
    fn key_distinguishes_improvement_state() {
        let bare = plot(1);
        let mut mined = plot(1);
        mined.improvement = Some(ImprovementType(1));
        assert_ne!(PlotKey::for_plot(&bare), PlotKey::for_plot(&mined));
    }

    #[test]
    fn key_distinguishes_feature_and_bonus() {
        let bare = plot(1);
        let mut forested = plot(1);
        forested.feature = Some(FeatureType(0));
        let mut bonused = plot(1);
        bonused.bonus = Some(BonusType(0));

        let keys = [
            PlotKey::for_plot(&bare),
            PlotKey::for_plot(&forested),
            PlotKey::for_plot(&bonused),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
    }
}
