//! Per-player integration: owns the analysis layers and drives the turn
//! update sequence from host callbacks.
//!
//! Everything is single-threaded and turn-driven. Expensive recomputation
//! hides behind dirty flags; host mutations accumulate in a command buffer
//! the embedding glue drains with [`Player::take_commands`].

use crate::city_data::CityData;
use crate::city_optimiser::{self, GrowthPolicy};
use crate::construct_item::{Buildable, ConstructItem};
use crate::coords::{self, PlotCoords};
use crate::error::{AdvisorError, Result};
use crate::host::{GameView, HostCommand, MissionKind, UnitSnapshot};
use crate::map_analysis::MapAnalysis;
use crate::output::OutputWeights;
use crate::rules::*;
use crate::settler::SettlerManager;
use crate::tactics::{building, unit as unit_tactics, worker, CityAssessment, PlayerTactics};
use fnv::{FnvHashMap, FnvHashSet};
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// A city under management.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct City {
    pub data: CityData,
    /// Construction choice must be re-run before it is next read.
    pub construction_dirty: bool,
    #[serde(skip)]
    pub chosen_build: Option<ConstructItem>,
}

/// A unit under management.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitType,
    pub coords: PlotCoords,
    pub ai_kind: UnitAiKind,
}

/// Persisted record of one military objective.
///
/// Field order is load-bearing for the save stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MilitaryMissionData {
    pub targets: FnvHashSet<PlotCoords>,
    pub assigned_units: Vec<UnitId>,
    /// Acceptable unit types per required slot.
    pub required_units: Vec<Vec<UnitType>>,
    pub reachable_plots: Vec<PlotCoords>,
    pub dynamic_reachable_plots: Vec<PlotCoords>,
    pub closest_city: Option<CityId>,
    pub mission: MissionKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    analysis: MapAnalysis,
    settler: SettlerManager,
    cities: FnvHashMap<CityId, City>,
    units: FnvHashMap<UnitId, Unit>,
    missions: Vec<MilitaryMissionData>,
    #[serde(skip)]
    tactics: PlayerTactics,
    /// Tactics are not persisted, so a freshly loaded player must rebuild
    /// them on its first turn.
    #[serde(skip, default = "dirty_after_load")]
    tactics_dirty: bool,
    #[serde(skip)]
    commands: Vec<HostCommand>,
}

fn dirty_after_load() -> bool {
    true
}

impl Player {
    pub fn new(view: &dyn GameView, id: PlayerId) -> Player {
        let analysis = MapAnalysis::new(view, id);
        let mut player = Player {
            id,
            analysis,
            settler: SettlerManager::new(id),
            cities: FnvHashMap::default(),
            units: FnvHashMap::default(),
            missions: Vec::new(),
            tactics: PlayerTactics::default(),
            tactics_dirty: true,
            commands: Vec::new(),
        };
        for city_id in view.player_cities(id) {
            player.add_city(view, city_id);
        }
        player
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn analysis(&self) -> &MapAnalysis {
        &self.analysis
    }

    pub fn settler(&self) -> &SettlerManager {
        &self.settler
    }

    pub fn city(&self, id: CityId) -> Result<&City> {
        self.cities.get(&id).ok_or(AdvisorError::MissingCity(id))
    }

    pub fn city_mut(&mut self, id: CityId) -> Result<&mut City> {
        self.cities.get_mut(&id).ok_or(AdvisorError::MissingCity(id))
    }

    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(&id).ok_or(AdvisorError::MissingUnit(id))
    }

    /// Drain the buffered host mutations.
    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    // ---- host lifecycle callbacks ----

    pub fn add_city(&mut self, view: &dyn GameView, id: CityId) {
        let Some(snapshot) = view.city(id) else {
            warn!(target: "player", "{}", AdvisorError::MissingCity(id));
            return;
        };
        let data = CityData::for_city(view, &snapshot);
        self.cities.insert(
            id,
            City {
                data,
                construction_dirty: true,
                chosen_build: None,
            },
        );
        self.tactics_dirty = true;
        info!(target: "player", "player {:?}: city {:?} registered", self.id, id);
    }

    pub fn remove_city(&mut self, id: CityId) {
        self.cities.remove(&id);
        self.analysis.shared_plots_mut().remove_city(id);
        self.tactics_dirty = true;
    }

    pub fn add_unit(&mut self, snapshot: &UnitSnapshot) {
        self.units.insert(
            snapshot.id,
            Unit {
                id: snapshot.id,
                unit_type: snapshot.unit_type,
                coords: snapshot.coords,
                ai_kind: snapshot.ai_kind,
            },
        );
    }

    pub fn remove_unit(&mut self, id: UnitId) {
        self.units.remove(&id);
        self.settler.remove_unit(id);
    }

    pub fn unit_moved(&mut self, id: UnitId, coords: PlotCoords) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.coords = coords;
        }
    }

    pub fn tech_acquired(&mut self, _tech: TechType) {
        self.tactics_dirty = true;
    }

    /// A hostile city appeared in our view: record a minimal objective so
    /// the military side has the persisted context the save format expects.
    pub fn notify_hostile_city(&mut self, view: &dyn GameView, coords: PlotCoords) {
        let closest_city = self.analysis.closest_city(view, coords).map(|(c, _)| c);
        self.missions.push(MilitaryMissionData {
            targets: std::iter::once(coords).collect(),
            assigned_units: Vec::new(),
            required_units: Vec::new(),
            reachable_plots: Vec::new(),
            dynamic_reachable_plots: Vec::new(),
            closest_city,
            mission: MissionKind::MoveTo,
        });
    }

    pub fn missions(&self) -> &[MilitaryMissionData] {
        &self.missions
    }

    // ---- map change notifications ----

    pub fn plot_revealed(&mut self, view: &dyn GameView, coords: PlotCoords) {
        if self.analysis.update_plot_revealed(view, coords) {
            // New sub-area: candidate sites may have appeared.
            self.tactics_dirty = true;
        }
    }

    pub fn plot_culture_changed(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        new_owner: Option<PlayerId>,
    ) {
        self.analysis.update_plot_culture(view, coords, new_owner);
        self.mark_cities_near(coords);
    }

    pub fn plot_improvement_changed(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        improvement: Option<ImprovementType>,
    ) {
        self.analysis.update_plot_improvement(view, coords, improvement);
        self.mark_cities_near(coords);
    }

    pub fn plot_bonus_changed(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        bonus: Option<BonusType>,
    ) {
        self.analysis.update_plot_bonus(view, coords, bonus);
        self.mark_cities_near(coords);
    }

    pub fn plot_feature_changed(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        feature: Option<FeatureType>,
    ) {
        self.analysis.update_plot_feature(view, coords, feature);
        self.mark_cities_near(coords);
    }

    pub fn plot_route_changed(
        &mut self,
        view: &dyn GameView,
        coords: PlotCoords,
        route: Option<RouteType>,
    ) {
        self.analysis.update_plot_route(view, coords, route);
    }

    /// Flag for a rebuild every city whose cross covers the plot.
    fn mark_cities_near(&mut self, coords: PlotCoords) {
        for city in self.cities.values_mut() {
            if coords::fat_cross_ring(city.data.centre, coords).is_some() {
                city.construction_dirty = true;
            }
        }
    }

    // ---- the turn update sequence ----

    /// One full update pass, run at the start of the player's turn:
    /// refresh tactics, score sites, arbitrate shared plots, choose per-city
    /// construction, issue settler and worker missions.
    pub fn update_turn(&mut self, view: &dyn GameView) {
        if self.tactics_dirty {
            self.tactics = PlayerTactics::rebuild(view, self.id);
            self.tactics_dirty = false;
        }

        let settler_commands = self.settler.analyse_plot_values(view, &mut self.analysis);
        self.commands.extend(settler_commands);

        self.refresh_city_data(view);
        self.arbitrate_shared_plots(view);
        self.choose_city_builds(view);
        self.issue_unit_missions(view);
    }

    fn refresh_city_data(&mut self, view: &dyn GameView) {
        for (&id, city) in &mut self.cities {
            if !city.construction_dirty {
                continue;
            }
            if let Some(snapshot) = view.city(id) {
                city.data = CityData::for_city(view, &snapshot);
            }
        }
    }

    fn arbitrate_shared_plots(&mut self, view: &dyn GameView) {
        let mut datas: FnvHashMap<CityId, CityData> = self
            .cities
            .iter()
            .map(|(&id, city)| (id, city.data.clone()))
            .collect();
        let commands = self.analysis.shared_plots_mut().arbitrate(
            &mut datas,
            view.rules(),
            &OutputWeights::standard(),
        );
        for (id, data) in datas {
            if let Some(city) = self.cities.get_mut(&id) {
                city.data = data;
            }
        }
        self.commands.extend(commands);
    }

    fn choose_city_builds(&mut self, view: &dyn GameView) {
        let rules = view.rules();
        let weights = OutputWeights::standard();
        let num_cities = self.cities.len();

        // Comparative ranks over the player's own cities.
        let outputs: FnvHashMap<CityId, crate::output::CityOutput> = self
            .cities
            .iter()
            .map(|(&id, city)| (id, city.data.output(rules)))
            .collect();
        let production_order: Vec<CityId> = outputs
            .iter()
            .sorted_by_key(|(_, o)| -(o.production as i64))
            .map(|(&id, _)| id)
            .collect();
        let commerce_order: Vec<CityId> = outputs
            .iter()
            .sorted_by_key(|(_, o)| -((o.gold + o.research) as i64))
            .map(|(&id, _)| id)
            .collect();

        let live_units: Vec<UnitSnapshot> = self
            .units
            .values()
            .map(|u| UnitSnapshot {
                id: u.id,
                owner: self.id,
                unit_type: u.unit_type,
                coords: u.coords,
                ai_kind: u.ai_kind,
            })
            .collect();

        let ids: Vec<CityId> = self.cities.keys().copied().sorted().collect();
        for id in ids {
            let Some(city) = self.cities.get(&id) else {
                continue;
            };
            if !city.construction_dirty && city.chosen_build.is_some() {
                continue;
            }

            let culture_pressure = coords::workable_plots(
                city.data.centre,
                city.data.culture_level,
            )
            .any(|c| {
                view.plot(c)
                    .map(|p| p.owner.is_some() && p.owner != Some(self.id))
                    .unwrap_or(false)
            });
            let assessment = CityAssessment {
                data: &city.data,
                production_rank: production_order.iter().position(|&c| c == id).unwrap_or(0),
                commerce_rank: commerce_order.iter().position(|&c| c == id).unwrap_or(0),
                num_cities,
                culture_pressure,
            };

            // Unit demand outranks economic construction only when the
            // cascade would otherwise fall through to a process.
            let build = building::select_city_build(view, self.id, &self.tactics, &assessment);
            let choice = match build {
                Some(item) if !matches!(item.buildable, Buildable::Process(_)) => Some(item),
                fallback => unit_tactics::select_city_train(
                    view,
                    self.id,
                    &self.tactics,
                    &self.analysis,
                    &self.settler,
                    &live_units,
                )
                .or(fallback),
            };

            let Some(city) = self.cities.get_mut(&id) else {
                continue;
            };
            if let Some(item) = &choice {
                Self::apply_choice(&mut city.data, rules, item);
                debug!(
                    target: "tactics",
                    "city {:?}: chose {:?}", id, item.buildable
                );
            }
            city.chosen_build = choice;
            city.construction_dirty = false;

            city_optimiser::optimise(
                &mut city.data,
                rules,
                &weights,
                GrowthPolicy::Grow,
            );
        }
    }

    fn apply_choice(data: &mut CityData, rules: &RuleSet, item: &ConstructItem) {
        data.queue.clear();
        match item.buildable {
            Buildable::Building(b) => data.push_building(rules, b),
            Buildable::Unit(u) => data.push_unit(rules, u),
            Buildable::Process(p) => data.push_process(p),
            // Projects and improvements are not city-queue items here; the
            // host builds projects, workers build improvements.
            Buildable::Project(_) | Buildable::Improvement(_) => {}
        }
    }

    fn issue_unit_missions(&mut self, view: &dyn GameView) {
        let unit_list: Vec<Unit> = self.units.values().cloned().collect();
        for unit in unit_list {
            match unit.ai_kind {
                UnitAiKind::Settle => {
                    let snapshot = UnitSnapshot {
                        id: unit.id,
                        owner: self.id,
                        unit_type: unit.unit_type,
                        coords: unit.coords,
                        ai_kind: unit.ai_kind,
                    };
                    let Some(target) =
                        self.settler.best_plot_for(view, &self.analysis, &snapshot)
                    else {
                        continue;
                    };
                    let mission = if target == unit.coords {
                        MissionKind::FoundCity
                    } else {
                        MissionKind::MoveTo
                    };
                    self.commands.push(HostCommand::PushMission {
                        unit: unit.id,
                        mission,
                        target: Some(target),
                    });
                }
                UnitAiKind::Worker => {
                    let snapshot = UnitSnapshot {
                        id: unit.id,
                        owner: self.id,
                        unit_type: unit.unit_type,
                        coords: unit.coords,
                        ai_kind: unit.ai_kind,
                    };
                    if let Some(command) =
                        worker::next_worker_mission(view, &self.analysis, self.id, &snapshot)
                    {
                        self.commands.push(command);
                    }
                }
                _ => {}
            }
        }
    }
}
