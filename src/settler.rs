//! City-site scoring and settler targeting.
//!
//! Rebuilds the dot map from `MapAnalysis::plot_values`, scores every
//! candidate site, writes the host's per-plot found-value cache back via
//! commands, and hands live settlers non-overlapping destinations. The whole
//! pass is memoized per turn; most turns it is a no-op.

use crate::constants::*;
use crate::coords::{self, PlotCoords};
use crate::dot_map::{DotMapItem, DotMapPlotData};
use crate::host::{GameView, HostCommand, UnitSnapshot};
use crate::map_analysis::MapAnalysis;
use crate::output::{OutputWeights, PlotYield};
use crate::rules::*;
use fnv::FnvHashMap;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Scored attributes of one candidate city site.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct SiteInfo {
    pub coords: PlotCoords,
    pub found_value: i32,
    /// Bonus-resource quality of the site, as a percentage weight.
    pub bonus_percent: i32,
    /// How quickly the site's rings come into work.
    pub growth_score: i32,
    /// Primary sort key; see `rank_sites`.
    pub composite: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlerManager {
    player: PlayerId,
    turn_last_calculated: Option<u32>,
    dot_map: FnvHashMap<PlotCoords, DotMapItem>,
    /// Ranked candidate sites, best first.
    sites: Vec<SiteInfo>,
    /// Live settler destinations; no two entries are ever closer than the
    /// separation radius.
    destinations: FnvHashMap<UnitId, PlotCoords>,
}

impl SettlerManager {
    pub fn new(player: PlayerId) -> SettlerManager {
        SettlerManager {
            player,
            turn_last_calculated: None,
            dot_map: FnvHashMap::default(),
            sites: Vec::new(),
            destinations: FnvHashMap::default(),
        }
    }

    pub fn sites(&self) -> &[SiteInfo] {
        &self.sites
    }

    pub fn dot_map(&self) -> &FnvHashMap<PlotCoords, DotMapItem> {
        &self.dot_map
    }

    pub fn destination_of(&self, unit: UnitId) -> Option<PlotCoords> {
        self.destinations.get(&unit).copied()
    }

    /// Forget a settler that died or completed its mission.
    pub fn remove_unit(&mut self, unit: UnitId) {
        self.destinations.remove(&unit);
    }

    /// Recompute site values. Memoized per turn; repeat calls within a turn
    /// return no commands.
    pub fn analyse_plot_values(
        &mut self,
        view: &dyn GameView,
        analysis: &mut MapAnalysis,
    ) -> Vec<HostCommand> {
        let turn = view.current_turn();
        if self.turn_last_calculated == Some(turn) {
            return Vec::new();
        }
        self.turn_last_calculated = Some(turn);

        // A player who cannot sustain research is in no state to expand;
        // suppress site scoring outright rather than rank bad options.
        if let Some(player) = view.player(self.player) {
            if player.num_cities > 0
                && player.max_research_rate < MIN_RESEARCH_RATE_FOR_EXPANSION
            {
                info!(
                    target: "settler",
                    "player {:?}: research rate {}% below expansion floor, sites cleared",
                    self.player, player.max_research_rate
                );
                self.sites.clear();
                self.dot_map.clear();
                return Vec::new();
            }
        }

        analysis.update_plot_values(view);
        self.rebuild_dot_map(view, analysis);

        let weights = OutputWeights::standard();
        let mut commands = Vec::new();
        let scored = self.score_sites(view, analysis, &weights);
        for &(coords, found, _, _, _) in &scored {
            commands.push(HostCommand::SetFoundValue {
                player: self.player,
                coords,
                value: found,
            });
        }
        self.rank_sites(scored);

        debug!(
            target: "settler",
            "player {:?}: turn {}, {} candidate sites ranked",
            self.player,
            turn,
            self.sites.len()
        );
        commands
    }

    /// Best founding destination for a settler, respecting the separation
    /// radius against other live settlers. An existing destination is kept
    /// while it remains a scored site.
    pub fn best_plot_for(
        &mut self,
        view: &dyn GameView,
        analysis: &MapAnalysis,
        unit: &UnitSnapshot,
    ) -> Option<PlotCoords> {
        // First city: stay close to the start. Compare only the current
        // plot and its ring of neighbours, not the global ranking.
        if view
            .player(self.player)
            .map(|p| p.num_cities == 0)
            .unwrap_or(false)
        {
            let choice = std::iter::once(unit.coords)
                .chain(unit.coords.neighbours())
                .filter(|&c| analysis.could_found_at(view, c))
                .max_by_key(|&c| self.site_value(c));
            if let Some(coords) = choice {
                self.destinations.insert(unit.id, coords);
                return Some(coords);
            }
        }

        let taken: Vec<PlotCoords> = self
            .destinations
            .iter()
            .filter(|(&id, _)| id != unit.id)
            .map(|(_, &c)| c)
            .collect();
        let separated = |c: PlotCoords| {
            taken
                .iter()
                .all(|&t| t.step_distance(c) > SETTLER_TARGET_SEPARATION)
        };

        if let Some(current) = self.destinations.get(&unit.id).copied() {
            if self.sites.iter().any(|s| s.coords == current) {
                return Some(current);
            }
            // The destination dropped out of the ranking; a neighbouring
            // foundable plot that still scores keeps the settler on course,
            // as long as it stays clear of the other settlers' targets.
            if let Some(shifted) = current
                .neighbours()
                .filter(|&c| separated(c) && self.sites.iter().any(|s| s.coords == c))
                .max_by_key(|&c| self.site_value(c))
            {
                self.destinations.insert(unit.id, shifted);
                return Some(shifted);
            }
            self.destinations.remove(&unit.id);
        }

        let choice = self
            .sites
            .iter()
            .find(|site| separated(site.coords))
            .map(|site| site.coords)?;
        self.destinations.insert(unit.id, choice);
        Some(choice)
    }

    // ---- internals ----

    fn site_value(&self, coords: PlotCoords) -> i64 {
        self.sites
            .iter()
            .find(|s| s.coords == coords)
            .map(|s| s.composite)
            .unwrap_or(0)
    }

    fn rebuild_dot_map(&mut self, view: &dyn GameView, analysis: &MapAnalysis) {
        self.dot_map.clear();

        let our_cities: Vec<PlotCoords> = view
            .player_cities(self.player)
            .into_iter()
            .filter_map(|id| view.city(id))
            .map(|c| c.coords)
            .collect();

        for (&sub_area, sites) in analysis.plot_values() {
            for (&centre, workable) in sites {
                let mut item = DotMapItem::new(centre, sub_area);
                for &plot_coords in workable {
                    if plot_coords == centre {
                        continue;
                    }
                    let Some(ring) = coords::fat_cross_ring(centre, plot_coords) else {
                        continue;
                    };
                    let Some(info) = analysis.plot_key_info(plot_coords) else {
                        continue;
                    };
                    let shared = our_cities
                        .iter()
                        .any(|&c| coords::fat_cross_ring(c, plot_coords).is_some());
                    item.push_plot(DotMapPlotData {
                        coords: plot_coords,
                        ring,
                        info: info.clone(),
                        shared_with_existing: shared,
                    });
                }
                if !item.plots.is_empty() {
                    self.dot_map.insert(centre, item);
                }
            }
        }
    }

    /// Raw per-site scores: (coords, found value, bonus percent, growth
    /// score, projected yield).
    fn score_sites(
        &self,
        view: &dyn GameView,
        analysis: &MapAnalysis,
        weights: &OutputWeights,
    ) -> Vec<(PlotCoords, i32, i32, i32, PlotYield)> {
        let rules = view.rules();
        let num_cities = view
            .player(self.player)
            .map(|p| p.num_cities)
            .unwrap_or(0);

        self.dot_map
            .values()
            .map(|item| {
                let mut yield_total = PlotYield::default();
                let mut value = 0i64;
                for plot in &item.plots {
                    let best = plot.info.best_yield(weights);
                    let plot_value = best.food as i64 * weights.food as i64
                        + best.production as i64 * weights.production as i64
                        + best.commerce as i64 * weights.gold.max(weights.research) as i64;
                    // A plot an existing city can also work is only half a
                    // reason to found here.
                    if plot.shared_with_existing {
                        value += plot_value / 2;
                    } else {
                        value += plot_value;
                        yield_total += best;
                    }
                }

                // Marginal upkeep of adding this city to the empire.
                let distance = analysis
                    .closest_city(view, item.city_plot)
                    .map(|(_, d)| d)
                    .unwrap_or(0);
                let upkeep =
                    city_maintenance_cost(rules, distance, num_cities + 1);
                let found = (value - upkeep as i64).max(0) as i32;

                let bonus_percent = self.bonus_percent(view, rules, item);
                let growth = growth_score(item, rules, weights);

                (item.city_plot, found, bonus_percent, growth, yield_total)
            })
            .collect()
    }

    /// Percentage weight of the site's bonus resources. New connections
    /// count for more than duplicates of what the empire already has.
    fn bonus_percent(&self, view: &dyn GameView, rules: &RuleSet, item: &DotMapItem) -> i32 {
        let mut percent = 0;
        for &bonus in &item.bonuses {
            let def = rules.bonus(bonus);
            percent += 10 + 5 * (def.happy + def.health).max(0);
            if !view.has_bonus_connected(self.player, bonus) {
                percent += 15;
            }
        }
        percent.min(100)
    }

    /// Apply the per-yield filter, compute composites, sort.
    fn rank_sites(&mut self, scored: Vec<(PlotCoords, i32, i32, i32, PlotYield)>) {
        let max_food = scored.iter().map(|s| s.4.food).max().unwrap_or(0);
        let max_production = scored.iter().map(|s| s.4.production).max().unwrap_or(0);
        let max_commerce = scored.iter().map(|s| s.4.commerce).max().unwrap_or(0);
        let max_found = scored.iter().map(|s| s.1).max().unwrap_or(0);

        let passes = |y: &PlotYield| {
            y.food * 100 >= max_food * SITE_YIELD_FILTER_PERCENT
                || y.production * 100 >= max_production * SITE_YIELD_FILTER_PERCENT
                || y.commerce * 100 >= max_commerce * SITE_YIELD_FILTER_PERCENT
        };

        self.sites = scored
            .into_iter()
            .filter(|(_, _, _, _, yield_)| passes(yield_))
            .map(|(coords, found, bonus_percent, growth_score, _)| SiteInfo {
                coords,
                found_value: found,
                bonus_percent,
                growth_score,
                composite: bonus_percent as i64 * max_found as i64 / 100 + found as i64,
            })
            .sorted_by_key(|s| (-s.composite, -(s.growth_score as i64)))
            .collect();
    }
}

/// Marginal maintenance of one more city, in tenths of gold per turn:
/// the new city's own upkeep plus the rise every existing city pays as the
/// empire's city count goes up. `num_cities` includes the new city.
fn city_maintenance_cost(rules: &RuleSet, distance: u32, num_cities: u32) -> i32 {
    let scalars = &rules.scalars;
    let own = crate::city_data::city_maintenance(scalars, distance, num_cities, 0);
    let existing = num_cities.saturating_sub(1);
    let per_city_rise = crate::city_data::city_maintenance(scalars, 0, num_cities, 0)
        - crate::city_data::city_maintenance(scalars, 0, existing, 0);
    own + existing as i32 * per_city_rise
}

/// Two-ring growth score: each ring contributes its weight times the share
/// of the horizon left once the ring can be fully worked.
fn growth_score(item: &DotMapItem, rules: &RuleSet, weights: &OutputWeights) -> i32 {
    let turns = item.growth_turns(rules, weights, GROWTH_HORIZON_TURNS);
    (1u8..=2)
        .map(|ring| {
            (ring as i32 + 1) * (GROWTH_HORIZON_TURNS - turns[ring as usize - 1]).max(0)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dot_map::KeyInfo;
    use crate::plot_info::PlotKey;

    fn key_info(food: i32, production: i32, commerce: i32) -> KeyInfo {
        KeyInfo {
            key: PlotKey::for_plot(&crate::host::PlotSnapshot {
                coords: PlotCoords::new(0, 0),
                terrain: TerrainType(0),
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
            }),
            current_yield: PlotYield::new(food, production, commerce),
            improvements: Vec::new(),
            bonus: None,
            is_water: false,
        }
    }

    fn site(plots: &[(i32, i32, i32)]) -> DotMapItem {
        let mut item = DotMapItem::new(PlotCoords::new(10, 10), crate::area::SubAreaId(0));
        for (i, &(f, p, c)) in plots.iter().enumerate() {
            item.push_plot(DotMapPlotData {
                coords: PlotCoords::new(i as i16, 0),
                ring: 1,
                info: key_info(f, p, c),
                shared_with_existing: false,
            });
        }
        item
    }

    #[test]
    fn growth_score_rewards_faster_sites() {
        let rules = RuleSet::default();
        let weights = OutputWeights::standard();
        let fertile = site(&[(3, 0, 0), (3, 0, 0), (3, 0, 0)]);
        let barren = site(&[(1, 0, 0), (1, 0, 0), (1, 0, 0)]);
        assert!(
            growth_score(&fertile, &rules, &weights) >= growth_score(&barren, &rules, &weights)
        );
    }

    #[test]
    fn rank_sites_filters_uniformly_weak_sites() {
        let mut manager = SettlerManager::new(PlayerId(0));
        let strong = (
            PlotCoords::new(1, 1),
            100,
            0,
            0,
            PlotYield::new(10, 10, 10),
        );
        let weak = (PlotCoords::new(9, 9), 10, 0, 0, PlotYield::new(1, 1, 1));
        manager.rank_sites(vec![strong, weak]);
        assert_eq!(manager.sites.len(), 1);
        assert_eq!(manager.sites[0].coords, PlotCoords::new(1, 1));
    }

    #[test]
    fn rank_sites_keeps_specialised_sites() {
        let mut manager = SettlerManager::new(PlayerId(0));
        let balanced = (
            PlotCoords::new(1, 1),
            100,
            0,
            0,
            PlotYield::new(10, 10, 10),
        );
        // Weak overall but a production specialist: survives the filter.
        let forge = (PlotCoords::new(9, 9), 30, 0, 0, PlotYield::new(1, 8, 1));
        manager.rank_sites(vec![balanced, forge]);
        assert_eq!(manager.sites.len(), 2);
    }

    fn site_at(x: i16, y: i16, composite: i64) -> SiteInfo {
        SiteInfo {
            coords: PlotCoords::new(x, y),
            found_value: composite as i32,
            bonus_percent: 0,
            growth_score: 0,
            composite,
        }
    }

    #[test]
    fn shifted_destination_keeps_the_separation_radius() {
        let mut world = crate::fixture::FixtureWorld::new(12, 12);
        world.add_player(PlayerId(0));
        world.add_city(CityId(1), PlayerId(0), PlotCoords::new(0, 0), 2);
        let analysis = MapAnalysis::new(&world, PlayerId(0));

        let mut manager = SettlerManager::new(PlayerId(0));
        manager.sites = vec![
            site_at(4, 4, 100),
            site_at(6, 6, 90),
            site_at(10, 10, 80),
        ];
        manager.destinations.insert(UnitId(1), PlotCoords::new(4, 4));
        // Unit 2's destination is no longer a ranked site.
        manager.destinations.insert(UnitId(2), PlotCoords::new(6, 5));

        let unit = UnitSnapshot {
            id: UnitId(2),
            owner: PlayerId(0),
            unit_type: UnitType(0),
            coords: PlotCoords::new(6, 5),
            ai_kind: UnitAiKind::Settle,
        };
        let target = manager.best_plot_for(&world, &analysis, &unit).unwrap();
        // (6,6) neighbours the stale destination but sits two steps from
        // unit 1's target; the far site must win instead.
        assert_eq!(target, PlotCoords::new(10, 10));
        assert!(PlotCoords::new(4, 4).step_distance(target) > SETTLER_TARGET_SEPARATION);
    }

    #[test]
    fn expansion_cost_charges_existing_cities_too() {
        let rules = RuleSet::default();
        let own_only = crate::city_data::city_maintenance(&rules.scalars, 5, 4, 0);
        assert!(city_maintenance_cost(&rules, 5, 4) > own_only);
    }

    #[test]
    fn bonus_weight_breaks_found_value_ties_up() {
        let mut manager = SettlerManager::new(PlayerId(0));
        let plain = (PlotCoords::new(1, 1), 100, 0, 0, PlotYield::new(8, 8, 8));
        let bonused = (PlotCoords::new(5, 5), 100, 50, 0, PlotYield::new(8, 8, 8));
        manager.rank_sites(vec![plain, bonused]);
        assert_eq!(manager.sites[0].coords, PlotCoords::new(5, 5));
    }
}
