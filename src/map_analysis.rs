//! Incremental per-player map knowledge.
//!
//! Owns the revealed-plot counters, the canonical-key cache, the bonus and
//! goody-hut registries, the shared-plot index and the plot-value structure
//! the settler layer consumes. Host update notifications funnel in through
//! the `update_plot_*` methods; the expensive re-derivations run lazily off
//! the dirty-plot set when `update_plot_values` drains it.

use crate::area::{SubAreaId, SubAreaRegistry};
use crate::coords::{self, PlotCoords, FAT_CROSS};
use crate::dot_map::KeyInfo;
use crate::error::AdvisorError;
use crate::host::{GameView, PlotSnapshot};
use crate::plot_info::PlotKey;
use crate::rules::*;
use crate::shared_plots::SharedPlotIndex;
use fnv::{FnvHashMap, FnvHashSet};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Candidate city plots per sub-area, each with the set of workable plots
/// currently counting towards its value.
pub type PlotValues = FnvHashMap<SubAreaId, FnvHashMap<PlotCoords, FnvHashSet<PlotCoords>>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapAnalysis {
    player: PlayerId,
    registry: SubAreaRegistry,
    /// Canonical key of each revealed plot, kept in lockstep with the host.
    plot_keys: FnvHashMap<PlotCoords, PlotKey>,
    /// Achievable-yield data deduplicated across plots sharing a key.
    key_cache: FnvHashMap<PlotKey, KeyInfo>,
    plot_values: PlotValues,
    /// Revealed bonus locations, indexed by sub-area.
    bonuses: FnvHashMap<SubAreaId, FnvHashMap<BonusType, Vec<PlotCoords>>>,
    goody_huts: FnvHashSet<PlotCoords>,
    seen_sub_areas: FnvHashSet<SubAreaId>,
    revealed_count: u32,
    total_plots: u32,
    /// Revealed-plot count per sub-area, measured against the registry's
    /// per-sub-area plot totals.
    sub_area_known: FnvHashMap<SubAreaId, u32>,
    /// Rival-owned plots whose owning city we have not seen yet; the
    /// military side watches these borders.
    unknown_hostile_plots: FnvHashSet<PlotCoords>,
    /// Plots whose state changed since the last `update_plot_values` pass.
    updated_plots: FnvHashSet<PlotCoords>,
    shared_plots: SharedPlotIndex,
}

impl MapAnalysis {
    /// Full scan of the revealed map. Run once at load or map regeneration.
    pub fn new(view: &dyn GameView, player: PlayerId) -> MapAnalysis {
        let registry = SubAreaRegistry::build(view);
        let (width, height) = view.map_size();
        let mut analysis = MapAnalysis {
            player,
            registry,
            plot_keys: FnvHashMap::default(),
            key_cache: FnvHashMap::default(),
            plot_values: PlotValues::default(),
            bonuses: FnvHashMap::default(),
            goody_huts: FnvHashSet::default(),
            seen_sub_areas: FnvHashSet::default(),
            revealed_count: 0,
            total_plots: width as u32 * height as u32,
            sub_area_known: FnvHashMap::default(),
            unknown_hostile_plots: FnvHashSet::default(),
            updated_plots: FnvHashSet::default(),
            shared_plots: SharedPlotIndex::default(),
        };

        for y in 0..height {
            for x in 0..width {
                let coords = PlotCoords::new(x, y);
                if view.is_revealed(coords, player) {
                    analysis.register_revealed(view, coords);
                }
            }
        }

        info!(
            target: "map",
            "player {:?}: initial scan, {}/{} plots revealed, {} sub-areas seen",
            player,
            analysis.revealed_count,
            analysis.total_plots,
            analysis.seen_sub_areas.len()
        );
        analysis
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn registry(&self) -> &SubAreaRegistry {
        &self.registry
    }

    pub fn shared_plots(&self) -> &SharedPlotIndex {
        &self.shared_plots
    }

    pub fn shared_plots_mut(&mut self) -> &mut SharedPlotIndex {
        &mut self.shared_plots
    }

    pub fn percent_revealed(&self) -> u32 {
        if self.total_plots == 0 {
            return 0;
        }
        self.revealed_count * 100 / self.total_plots
    }

    pub fn is_fully_known(&self) -> bool {
        self.revealed_count == self.total_plots
    }

    /// Whether every plot of a sub-area has been revealed.
    pub fn sub_area_fully_known(&self, id: SubAreaId) -> bool {
        let total = self.registry.sub_area(id).map(|s| s.num_plots).unwrap_or(0);
        total > 0 && self.sub_area_known.get(&id).copied().unwrap_or(0) >= total
    }

    /// Rival-owned plots with no visible owning city.
    pub fn unknown_hostile_plots(&self) -> impl Iterator<Item = PlotCoords> + '_ {
        self.unknown_hostile_plots.iter().copied()
    }

    pub fn goody_huts(&self) -> impl Iterator<Item = PlotCoords> + '_ {
        self.goody_huts.iter().copied()
    }

    pub fn key_info(&self, key: PlotKey) -> Option<&KeyInfo> {
        self.key_cache.get(&key)
    }

    pub fn plot_key(&self, coords: PlotCoords) -> Option<PlotKey> {
        self.plot_keys.get(&coords).copied()
    }

    /// Key info for a plot, looked up through its cached key.
    pub fn plot_key_info(&self, coords: PlotCoords) -> Option<&KeyInfo> {
        self.plot_keys
            .get(&coords)
            .and_then(|key| self.key_cache.get(key))
    }

    /// Revealed locations of a bonus within one sub-area.
    pub fn bonus_plots(&self, sub_area: SubAreaId, bonus: BonusType) -> &[PlotCoords] {
        self.bonuses
            .get(&sub_area)
            .and_then(|m| m.get(&bonus))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All revealed bonuses of a sub-area.
    pub fn sub_area_bonuses(
        &self,
        sub_area: SubAreaId,
    ) -> impl Iterator<Item = (BonusType, &[PlotCoords])> {
        self.bonuses
            .get(&sub_area)
            .into_iter()
            .flatten()
            .map(|(&b, v)| (b, v.as_slice()))
    }

    // ---- host update notifications ----

    /// A plot became visible. Returns true when it opened a sub-area the
    /// player had never seen, which is the exploration layer's cue to
    /// re-plan.
    pub fn update_plot_revealed(&mut self, view: &dyn GameView, coords: PlotCoords) -> bool {
        if self.plot_keys.contains_key(&coords) {
            return false;
        }
        let new_sub_area = self.register_revealed(view, coords);
        if new_sub_area {
            debug!(
                target: "map",
                "player {:?}: plot {:?} opened a new sub-area",
                self.player, coords
            );
        }
        new_sub_area
    }

    /// Cultural ownership of a plot changed hands.
    ///
    /// Keeps the shared-plot index in step: a plot of ours workable by two
    /// or more of our cities enters arbitration; losing the plot drops it.
    pub fn update_plot_culture(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        new_owner: Option<PlayerId>,
    ) {
        self.updated_plots.insert(coords);

        // A culture flip can expose or resolve a hostile border on the plot
        // itself and on its neighbours.
        self.evaluate_hostile(view, coords);
        for neighbour in coords.neighbours() {
            self.evaluate_hostile(view, neighbour);
        }

        if new_owner != Some(self.player) {
            self.shared_plots.remove_plot(coords);
            return;
        }

        let mut candidates: FnvHashSet<CityId> = FnvHashSet::default();
        for city_id in view.player_cities(self.player) {
            if let Some(city) = view.city(city_id) {
                let workable = coords::fat_cross_ring(city.coords, coords)
                    .map(|ring| ring == 1 || city.culture_level >= 2)
                    .unwrap_or(false);
                if workable {
                    candidates.insert(city_id);
                }
            }
        }
        let working = view.plot(coords).and_then(|p| p.working_city);
        self.shared_plots.set_candidates(coords, candidates, working);
    }

    pub fn update_plot_bonus(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        bonus: Option<BonusType>,
    ) {
        self.refresh_plot(view, coords, |plot| plot.bonus == bonus);
    }

    pub fn update_plot_feature(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        feature: Option<FeatureType>,
    ) {
        self.refresh_plot(view, coords, |plot| plot.feature == feature);
    }

    pub fn update_plot_improvement(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        improvement: Option<ImprovementType>,
    ) {
        self.refresh_plot(view, coords, |plot| plot.improvement == improvement);
    }

    pub fn update_plot_route(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        route: Option<RouteType>,
    ) {
        self.refresh_plot(view, coords, |plot| plot.route == route);
    }

    /// A goody hut was collected or destroyed.
    pub fn clear_goody_hut(&mut self, coords: PlotCoords) {
        self.goody_huts.remove(&coords);
    }

    // ---- derived structures ----

    /// Drain the dirty-plot set into the plot-value structure. Each dirty
    /// plot is processed exactly once: it is re-attached to every candidate
    /// city plot whose cross covers it while it stays claimable, and
    /// detached everywhere once another player holds it.
    pub fn update_plot_values(&mut self, view: &dyn GameView) {
        let dirty: Vec<PlotCoords> = self.updated_plots.drain().collect();
        for coords in dirty {
            let claimable = view
                .plot(coords)
                .map(|p| p.owner.is_none() || p.owner == Some(self.player))
                .unwrap_or(false);

            // Candidate centres are exactly the plots whose fat cross
            // contains this one; the cross is symmetric.
            let centres = FAT_CROSS
                .iter()
                .map(|&(dx, dy)| coords.offset(dx, dy))
                .chain(std::iter::once(coords));

            for centre in centres {
                if !self.could_found_at(view, centre) {
                    self.remove_candidate_site(centre);
                    continue;
                }
                let Some(sub_area) = self.registry.sub_area_at(centre) else {
                    continue;
                };
                let sites = self.plot_values.entry(sub_area).or_default();
                if claimable {
                    sites.entry(centre).or_default().insert(coords);
                } else if let Some(plots) = sites.get_mut(&centre) {
                    plots.remove(&coords);
                }
            }
        }
    }

    pub fn plot_values(&self) -> &PlotValues {
        &self.plot_values
    }

    /// Whether a city could legally be founded on the plot.
    pub fn could_found_at(&self, view: &dyn GameView, coords: PlotCoords) -> bool {
        if !view.is_revealed(coords, self.player) {
            return false;
        }
        let Some(plot) = view.plot(coords) else {
            return false;
        };
        let rules = view.rules();
        if plot.is_water(rules) || plot.is_impassable(rules) || plot.city.is_some() {
            return false;
        }
        plot.owner.is_none() || plot.owner == Some(self.player)
    }

    /// The player's closest city reachable from a plot, with its step
    /// distance. Searches the plot's own sub-area; from water the bordering
    /// sub-areas are searched too, so a coastal city counts as reachable
    /// from the sea it sits on.
    pub fn closest_city(
        &self,
        view: &dyn GameView,
        from: PlotCoords,
    ) -> Option<(CityId, u32)> {
        let start_sub_area = self.registry.sub_area_at(from)?;
        let mut allowed: FnvHashSet<SubAreaId> = FnvHashSet::default();
        allowed.insert(start_sub_area);
        if self
            .registry
            .sub_area(start_sub_area)
            .map(|s| s.is_water)
            .unwrap_or(false)
        {
            allowed.extend(self.registry.bordering(start_sub_area));
        }

        let player = self.player;
        let path = pathfinding::directed::bfs::bfs(
            &from,
            |&coords| {
                coords
                    .neighbours()
                    .filter(|next| {
                        self.registry
                            .sub_area_at(*next)
                            .map(|id| allowed.contains(&id))
                            .unwrap_or(false)
                    })
                    .collect::<Vec<_>>()
            },
            |&coords| {
                view.plot(coords)
                    .and_then(|p| p.city)
                    .and_then(|id| view.city(id))
                    .map(|c| c.owner == player)
                    .unwrap_or(false)
            },
        )?;

        let destination = *path.last()?;
        let city = view.plot(destination)?.city?;
        Some((city, path.len() as u32 - 1))
    }

    // ---- internals ----

    /// Record a freshly revealed plot. Returns true for a new sub-area.
    fn register_revealed(&mut self, view: &dyn GameView, coords: PlotCoords) -> bool {
        let Some(plot) = view.plot(coords) else {
            return false;
        };
        self.revealed_count += 1;
        self.index_plot(&plot, view.rules());
        self.updated_plots.insert(coords);
        self.evaluate_hostile(view, coords);

        if plot.has_goody_hut {
            self.goody_huts.insert(coords);
        }

        match self.registry.sub_area_at(coords) {
            Some(id) => {
                *self.sub_area_known.entry(id).or_default() += 1;
                self.seen_sub_areas.insert(id)
            }
            None => false,
        }
    }

    /// (Re)classify a plot as an unknown-hostile border entry: owned by a
    /// rival with no visible city accounting for it.
    fn evaluate_hostile(&mut self, view: &dyn GameView, coords: PlotCoords) {
        let hostile = view
            .plot(coords)
            .map(|p| match p.owner {
                Some(owner) if owner != self.player => p
                    .working_city
                    .or(p.city)
                    .and_then(|id| view.city(id))
                    .is_none(),
                _ => false,
            })
            .unwrap_or(false);
        if hostile {
            self.unknown_hostile_plots.insert(coords);
        } else {
            self.unknown_hostile_plots.remove(&coords);
        }
    }

    /// Re-derive a plot's key after a host change notification. The check
    /// closure validates the notification payload against the host's own
    /// state; a disagreement means our model missed an update, so the
    /// recomputed state wins.
    fn refresh_plot(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        payload_matches: impl Fn(&PlotSnapshot) -> bool,
    ) {
        let Some(plot) = view.plot(coords) else {
            return;
        };
        if !payload_matches(&plot) {
            warn!(target: "map", "{}", AdvisorError::PlotKeyMismatch(coords));
        }
        self.remove_plot_index(coords, view.rules());
        self.index_plot(&plot, view.rules());
        self.updated_plots.insert(coords);
    }

    fn index_plot(&mut self, plot: &PlotSnapshot, rules: &RuleSet) {
        let key = PlotKey::for_plot(plot);
        self.plot_keys.insert(plot.coords, key);
        self.key_cache
            .entry(key)
            .or_insert_with(|| KeyInfo::for_plot(plot, rules));

        if let (Some(bonus), Some(sub_area)) = (plot.bonus, self.registry.sub_area_at(plot.coords))
        {
            let locations = self
                .bonuses
                .entry(sub_area)
                .or_default()
                .entry(bonus)
                .or_default();
            if !locations.contains(&plot.coords) {
                locations.push(plot.coords);
            }
        }
    }

    fn remove_plot_index(&mut self, coords: PlotCoords, _rules: &RuleSet) {
        self.plot_keys.remove(&coords);
        if let Some(sub_area) = self.registry.sub_area_at(coords) {
            if let Some(per_bonus) = self.bonuses.get_mut(&sub_area) {
                for locations in per_bonus.values_mut() {
                    locations.retain(|&c| c != coords);
                }
            }
        }
    }

    fn remove_candidate_site(&mut self, centre: PlotCoords) {
        if let Some(sub_area) = self.registry.sub_area_at(centre) {
            if let Some(sites) = self.plot_values.get_mut(&sub_area) {
                sites.remove(&centre);
            }
        }
    }
}
