//! Static game-rule tables as supplied by the host engine.
//!
//! These are read-only descriptions of terrains, features, bonuses,
//! improvements, buildings, units, projects, processes, techs and
//! specialists. The info layer walks them into requirement/effect trees;
//! nothing in this module makes decisions.

use crate::output::{Commerce, CommerceKind, PlotYield};
use serde::{Deserialize, Serialize};

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident, $repr:ty) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
        )]
        pub struct $name(pub $repr);
    };
}

host_id!(PlayerId, i32);
host_id!(TeamId, i32);
host_id!(CityId, i32);
host_id!(UnitId, i32);
host_id!(TerrainType, u8);
host_id!(FeatureType, u8);
host_id!(BonusType, u8);
host_id!(RouteType, u8);
host_id!(ImprovementType, u8);
host_id!(SpecialistType, u8);
host_id!(BuildingType, u16);
host_id!(UnitType, u16);
host_id!(ProjectType, u16);
host_id!(ProcessType, u16);
host_id!(TechType, u16);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainDef {
    pub name: String,
    pub yield_: PlotYield,
    pub is_water: bool,
    pub is_impassable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: String,
    pub yield_change: PlotYield,
    pub health_change: i32,
    pub removable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BonusDef {
    pub name: String,
    pub yield_change: PlotYield,
    pub happy: i32,
    pub health: i32,
    /// Tech required before the bonus is visible/usable; `None` = always.
    pub reveal_tech: Option<TechType>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteDef {
    pub name: String,
    pub commerce_change: i32,
    pub prereq_tech: Option<TechType>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImprovementDef {
    pub name: String,
    pub yield_change: PlotYield,
    /// Extra yield when the plot has fresh water (farms).
    pub fresh_water_change: PlotYield,
    pub turns_to_build: u32,
    pub prereq_tech: Option<TechType>,
    /// Terrains the improvement may be built on; empty = any passable land.
    pub valid_terrains: Vec<TerrainType>,
    pub valid_on_hills: bool,
    pub valid_on_flat: bool,
    pub requires_irrigation: bool,
    /// Bonuses this improvement connects to the trade network.
    pub connects_bonuses: Vec<BonusType>,
    /// Timed in-place upgrade (cottage chains).
    pub upgrade: Option<(ImprovementType, u32)>,
    /// Improvements such as forts that anchor ownership like a city.
    pub acts_as_city: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpecialistDef {
    pub name: String,
    pub yield_: PlotYield,
    pub commerce: Commerce,
    pub gpp: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: String,
    pub cost: i32,
    pub commerce: Commerce,
    pub yield_change: PlotYield,
    /// Percentage yield modifiers (0 = none).
    pub yield_modifier: PlotYield,
    pub commerce_modifier: Commerce,
    pub happy: i32,
    pub health: i32,
    /// Percentage change to city maintenance (negative = relief).
    pub maintenance_modifier: i32,
    pub gpp: i32,
    pub specialist_slots: Vec<SpecialistType>,
    pub prereq_techs: Vec<TechType>,
    pub prereq_buildings: Vec<BuildingType>,
    /// Extra yield on worked plots carrying the bonus (wonder synergies).
    pub bonus_yield_changes: Vec<(BonusType, PlotYield)>,
    /// Bonus that must be connected before construction (e.g. stone).
    pub prereq_bonus: Option<BonusType>,
    /// World wonder: at most this many instances game-wide.
    pub max_global_instances: Option<u32>,
    /// National wonder: one per player, excluded from the government centre.
    pub is_national_wonder: bool,
    pub is_government_center: bool,
    pub victory_building: bool,
}

impl BuildingDef {
    pub fn is_world_wonder(&self) -> bool {
        self.max_global_instances.is_some()
    }
}

/// The broad role the host's unit AI assigns a unit.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum UnitAiKind {
    Settle,
    Worker,
    Attack,
    Defence,
    Explore,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitDef {
    pub name: String,
    pub cost: i32,
    pub combat: i32,
    pub moves: u32,
    pub default_ai: UnitAiKind,
    pub prereq_techs: Vec<TechType>,
    pub prereq_bonus: Option<BonusType>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectDef {
    pub name: String,
    pub cost: i32,
    pub prereq_techs: Vec<TechType>,
    pub victory_project: bool,
    pub prereq_project: Option<ProjectType>,
}

/// A process converts city production into a commerce channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessDef {
    pub name: String,
    pub commerce_kind: CommerceKind,
    /// Percent of production converted (100 = one-to-one).
    pub modifier: i32,
    pub prereq_tech: Option<TechType>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TechDef {
    pub name: String,
    pub cost: i32,
    pub and_prereqs: Vec<TechType>,
}

/// How a hurry (rush purchase) is paid for.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub enum HurryKind {
    /// Gold cost per remaining production point.
    Gold { gold_per_production: i32 },
    /// Production granted per population point sacrificed.
    Population { production_per_pop: i32 },
}

/// Game-wide scalar rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameScalars {
    /// Food each population point consumes per turn.
    pub food_per_pop: i32,
    /// Food required to grow: base + population * factor.
    pub growth_base: i32,
    pub growth_factor: i32,
    pub base_happy: i32,
    pub base_health: i32,
    /// Culture accumulated to reach each level (index = level - 1).
    pub culture_level_thresholds: Vec<i32>,
    /// Maintenance = distance_coeff * distance-to-palace
    ///             + cities_coeff * number-of-cities, in tenths of gold.
    pub maintenance_distance_coeff: i32,
    pub maintenance_cities_coeff: i32,
    /// GPP required for the first great person.
    pub gpp_threshold: i32,
    pub hurry_kinds: Vec<HurryKind>,
}

impl Default for GameScalars {
    fn default() -> Self {
        GameScalars {
            food_per_pop: 2,
            growth_base: 20,
            growth_factor: 2,
            base_happy: 4,
            base_health: 4,
            culture_level_thresholds: vec![10, 100, 500, 5000],
            maintenance_distance_coeff: 4,
            maintenance_cities_coeff: 5,
            gpp_threshold: 100,
            hurry_kinds: vec![
                HurryKind::Gold {
                    gold_per_production: 3,
                },
                HurryKind::Population {
                    production_per_pop: 30,
                },
            ],
        }
    }
}

/// The complete rule table set, loaded once from the host at game start.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub terrains: Vec<TerrainDef>,
    pub features: Vec<FeatureDef>,
    pub bonuses: Vec<BonusDef>,
    pub routes: Vec<RouteDef>,
    pub improvements: Vec<ImprovementDef>,
    pub specialists: Vec<SpecialistDef>,
    pub buildings: Vec<BuildingDef>,
    pub units: Vec<UnitDef>,
    pub projects: Vec<ProjectDef>,
    pub processes: Vec<ProcessDef>,
    pub techs: Vec<TechDef>,
    pub scalars: GameScalars,
}

impl RuleSet {
    pub fn terrain(&self, id: TerrainType) -> &TerrainDef {
        &self.terrains[id.0 as usize]
    }

    pub fn feature(&self, id: FeatureType) -> &FeatureDef {
        &self.features[id.0 as usize]
    }

    pub fn bonus(&self, id: BonusType) -> &BonusDef {
        &self.bonuses[id.0 as usize]
    }

    pub fn route(&self, id: RouteType) -> &RouteDef {
        &self.routes[id.0 as usize]
    }

    pub fn improvement(&self, id: ImprovementType) -> &ImprovementDef {
        &self.improvements[id.0 as usize]
    }

    pub fn specialist(&self, id: SpecialistType) -> &SpecialistDef {
        &self.specialists[id.0 as usize]
    }

    pub fn building(&self, id: BuildingType) -> &BuildingDef {
        &self.buildings[id.0 as usize]
    }

    pub fn unit(&self, id: UnitType) -> &UnitDef {
        &self.units[id.0 as usize]
    }

    pub fn project(&self, id: ProjectType) -> &ProjectDef {
        &self.projects[id.0 as usize]
    }

    pub fn process(&self, id: ProcessType) -> &ProcessDef {
        &self.processes[id.0 as usize]
    }

    pub fn tech(&self, id: TechType) -> &TechDef {
        &self.techs[id.0 as usize]
    }

    pub fn building_types(&self) -> impl Iterator<Item = BuildingType> {
        (0..self.buildings.len() as u16).map(BuildingType)
    }

    pub fn unit_types(&self) -> impl Iterator<Item = UnitType> {
        (0..self.units.len() as u16).map(UnitType)
    }

    pub fn project_types(&self) -> impl Iterator<Item = ProjectType> {
        (0..self.projects.len() as u16).map(ProjectType)
    }

    pub fn process_types(&self) -> impl Iterator<Item = ProcessType> {
        (0..self.processes.len() as u16).map(ProcessType)
    }

    pub fn improvement_types(&self) -> impl Iterator<Item = ImprovementType> {
        (0..self.improvements.len() as u8).map(ImprovementType)
    }

    /// Food needed for a city of the given population to grow.
    pub fn growth_threshold(&self, population: i32) -> i32 {
        self.scalars.growth_base + population * self.scalars.growth_factor
    }

    /// Culture level for an accumulated culture total (0 = no expansion yet).
    pub fn culture_level(&self, culture: i32) -> u8 {
        let mut level = 0u8;
        for &threshold in &self.scalars.culture_level_thresholds {
            if culture >= threshold {
                level += 1;
            }
        }
        level
    }
}
