//! The boundary with the closed host engine.
//!
//! Reads go through [`GameView`]; writes never happen directly -- the
//! analysis layers return [`HostCommand`] values and the embedding glue is
//! responsible for applying them against the engine. This keeps the whole
//! crate compilable and testable without the engine present.

use crate::coords::PlotCoords;
use crate::rules::*;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of one map plot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlotSnapshot {
    pub coords: PlotCoords,
    pub terrain: TerrainType,
    pub feature: Option<FeatureType>,
    pub bonus: Option<BonusType>,
    pub route: Option<RouteType>,
    pub improvement: Option<ImprovementType>,
    pub owner: Option<PlayerId>,
    /// City occupying this plot, if any.
    pub city: Option<CityId>,
    /// Working-city pointer the host currently holds for this plot.
    pub working_city: Option<CityId>,
    pub is_hills: bool,
    pub is_river: bool,
    pub is_fresh_water: bool,
    pub is_coastal: bool,
    pub has_goody_hut: bool,
}

impl PlotSnapshot {
    pub fn is_water(&self, rules: &RuleSet) -> bool {
        rules.terrain(self.terrain).is_water
    }

    pub fn is_impassable(&self, rules: &RuleSet) -> bool {
        rules.terrain(self.terrain).is_impassable
    }
}

/// Read-only snapshot of one city.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub id: CityId,
    pub owner: PlayerId,
    pub coords: PlotCoords,
    pub population: i32,
    pub culture: i32,
    pub culture_level: u8,
    pub stored_food: i32,
    pub is_coastal: bool,
    pub is_capital: bool,
    pub buildings: Vec<BuildingType>,
}

/// Read-only snapshot of one player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub team: TeamId,
    pub gold: i32,
    pub gold_rate: i32,
    /// Highest research slider percentage sustainable without losing gold.
    pub max_research_rate: i32,
    pub current_research_rate: i32,
    pub num_cities: u32,
}

/// Read-only snapshot of one unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub owner: PlayerId,
    pub unit_type: UnitType,
    pub coords: PlotCoords,
    pub ai_kind: UnitAiKind,
}

/// Read-only view of the host engine's game state.
///
/// Mirrors the narrow set of queries the decision layers actually consume;
/// the engine's own objects never cross this boundary.
pub trait GameView {
    fn map_size(&self) -> (i16, i16);
    fn current_turn(&self) -> u32;
    fn rules(&self) -> &RuleSet;

    /// `None` when the coordinates fall off the map.
    fn plot(&self, coords: PlotCoords) -> Option<PlotSnapshot>;
    fn is_revealed(&self, coords: PlotCoords, player: PlayerId) -> bool;

    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot>;
    fn player_has_tech(&self, player: PlayerId, tech: TechType) -> bool;
    fn city(&self, id: CityId) -> Option<CitySnapshot>;
    fn player_cities(&self, player: PlayerId) -> Vec<CityId>;
    /// Number of instances of a building constructed game-wide, for
    /// world-wonder availability checks.
    fn global_building_count(&self, building: BuildingType) -> u32;
    /// Whether the player has the bonus connected to their trade network.
    fn has_bonus_connected(&self, player: PlayerId, bonus: BonusType) -> bool;

    fn in_bounds(&self, coords: PlotCoords) -> bool {
        let (w, h) = self.map_size();
        coords.x() >= 0 && coords.y() >= 0 && coords.x() < w && coords.y() < h
    }
}

/// A unit order the advisor wants pushed to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionKind {
    MoveTo,
    FoundCity,
    BuildImprovement(ImprovementType),
    BuildRoute(RouteType),
    Fortify,
    SkipTurn,
}

/// A mutation the advisor wants the host glue to apply.
///
/// Returned from the update passes; the core never calls into the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostCommand {
    PushMission {
        unit: UnitId,
        mission: MissionKind,
        target: Option<PlotCoords>,
    },
    /// Write-back of the per-plot found-value cache the host AI also reads.
    SetFoundValue {
        player: PlayerId,
        coords: PlotCoords,
        value: i32,
    },
    /// Override which city works a shared plot.
    SetWorkingCityOverride {
        coords: PlotCoords,
        city: Option<CityId>,
    },
}
