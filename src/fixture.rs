//! An offline, scriptable [`GameView`] implementation.
//!
//! Used by the integration tests and by host-less experiments: a small rule
//! set in the spirit of the real game plus a mutable map the tests arrange
//! plot by plot. Nothing here is used by the decision layers themselves.

use crate::coords::PlotCoords;
use crate::host::{CitySnapshot, GameView, PlayerSnapshot, PlotSnapshot};
use crate::output::{Commerce, CommerceKind, PlotYield};
use crate::rules::*;
use fnv::{FnvHashMap, FnvHashSet};

pub const GRASSLAND: TerrainType = TerrainType(0);
pub const PLAINS: TerrainType = TerrainType(1);
pub const DESERT: TerrainType = TerrainType(2);
pub const OCEAN: TerrainType = TerrainType(3);
pub const PEAK: TerrainType = TerrainType(4);

pub const FOREST: FeatureType = FeatureType(0);

pub const WHEAT: BonusType = BonusType(0);
pub const GOLD_ORE: BonusType = BonusType(1);
pub const IRON: BonusType = BonusType(2);

pub const ROAD: RouteType = RouteType(0);

pub const FARM: ImprovementType = ImprovementType(0);
pub const MINE: ImprovementType = ImprovementType(1);
pub const COTTAGE: ImprovementType = ImprovementType(2);
pub const HAMLET: ImprovementType = ImprovementType(3);

pub const SCIENTIST: SpecialistType = SpecialistType(0);

pub const GRANARY: BuildingType = BuildingType(0);
pub const LIBRARY: BuildingType = BuildingType(1);
pub const TEMPLE: BuildingType = BuildingType(2);
pub const MARKET: BuildingType = BuildingType(3);
pub const AQUEDUCT: BuildingType = BuildingType(4);
pub const MONUMENT: BuildingType = BuildingType(5);
pub const COURTHOUSE: BuildingType = BuildingType(6);
pub const GREAT_FORGE: BuildingType = BuildingType(7);
pub const PALACE: BuildingType = BuildingType(8);
pub const FORGE: BuildingType = BuildingType(9);
pub const STONE_CIRCLE: BuildingType = BuildingType(10);

pub const SETTLER: UnitType = UnitType(0);
pub const WORKER: UnitType = UnitType(1);
pub const WARRIOR: UnitType = UnitType(2);
pub const SWORDSMAN: UnitType = UnitType(3);

pub const WEALTH: ProcessType = ProcessType(0);
pub const RESEARCH: ProcessType = ProcessType(1);

pub const AGRICULTURE: TechType = TechType(0);
pub const MINING: TechType = TechType(1);
pub const POTTERY: TechType = TechType(2);
pub const WRITING: TechType = TechType(3);
pub const CURRENCY: TechType = TechType(4);
pub const IRON_WORKING: TechType = TechType(5);
pub const CONSTRUCTION: TechType = TechType(6);

/// A rule set small enough to reason about in tests but exercising every
/// table the decision layers read.
pub fn fixture_rules() -> RuleSet {
    RuleSet {
        terrains: vec![
            TerrainDef {
                name: "grassland".into(),
                yield_: PlotYield::new(2, 0, 0),
                is_water: false,
                is_impassable: false,
            },
            TerrainDef {
                name: "plains".into(),
                yield_: PlotYield::new(1, 1, 0),
                is_water: false,
                is_impassable: false,
            },
            TerrainDef {
                name: "desert".into(),
                yield_: PlotYield::new(0, 0, 0),
                is_water: false,
                is_impassable: false,
            },
            TerrainDef {
                name: "ocean".into(),
                yield_: PlotYield::new(1, 0, 2),
                is_water: true,
                is_impassable: false,
            },
            TerrainDef {
                name: "peak".into(),
                yield_: PlotYield::new(0, 0, 0),
                is_water: false,
                is_impassable: true,
            },
        ],
        features: vec![FeatureDef {
            name: "forest".into(),
            yield_change: PlotYield::new(0, 1, 0),
            health_change: 1,
            removable: true,
        }],
        bonuses: vec![
            BonusDef {
                name: "wheat".into(),
                yield_change: PlotYield::new(1, 0, 0),
                happy: 0,
                health: 1,
                reveal_tech: None,
            },
            BonusDef {
                name: "gold ore".into(),
                yield_change: PlotYield::new(0, 0, 2),
                happy: 1,
                health: 0,
                reveal_tech: None,
            },
            BonusDef {
                name: "iron".into(),
                yield_change: PlotYield::new(0, 1, 0),
                happy: 0,
                health: 0,
                reveal_tech: Some(IRON_WORKING),
            },
        ],
        routes: vec![RouteDef {
            name: "road".into(),
            commerce_change: 0,
            prereq_tech: None,
        }],
        improvements: vec![
            ImprovementDef {
                name: "farm".into(),
                yield_change: PlotYield::new(1, 0, 0),
                fresh_water_change: PlotYield::new(1, 0, 0),
                turns_to_build: 5,
                prereq_tech: Some(AGRICULTURE),
                valid_terrains: vec![GRASSLAND, PLAINS],
                valid_on_hills: false,
                valid_on_flat: true,
                requires_irrigation: true,
                connects_bonuses: vec![WHEAT],
                upgrade: None,
                acts_as_city: false,
            },
            ImprovementDef {
                name: "mine".into(),
                yield_change: PlotYield::new(0, 2, 0),
                fresh_water_change: PlotYield::default(),
                turns_to_build: 6,
                prereq_tech: Some(MINING),
                valid_terrains: Vec::new(),
                valid_on_hills: true,
                valid_on_flat: false,
                requires_irrigation: false,
                connects_bonuses: vec![GOLD_ORE, IRON],
                upgrade: None,
                acts_as_city: false,
            },
            ImprovementDef {
                name: "cottage".into(),
                yield_change: PlotYield::new(0, 0, 1),
                fresh_water_change: PlotYield::default(),
                turns_to_build: 4,
                prereq_tech: Some(POTTERY),
                valid_terrains: vec![GRASSLAND, PLAINS],
                valid_on_hills: false,
                valid_on_flat: true,
                requires_irrigation: false,
                connects_bonuses: Vec::new(),
                upgrade: Some((HAMLET, 10)),
                acts_as_city: false,
            },
            ImprovementDef {
                name: "hamlet".into(),
                yield_change: PlotYield::new(0, 0, 2),
                fresh_water_change: PlotYield::default(),
                turns_to_build: 0,
                prereq_tech: Some(POTTERY),
                valid_terrains: vec![GRASSLAND, PLAINS],
                valid_on_hills: false,
                valid_on_flat: true,
                requires_irrigation: false,
                connects_bonuses: Vec::new(),
                upgrade: None,
                acts_as_city: false,
            },
        ],
        specialists: vec![SpecialistDef {
            name: "scientist".into(),
            yield_: PlotYield::default(),
            commerce: Commerce {
                gold: 0,
                research: 3,
                culture: 0,
            },
            gpp: 3,
        }],
        buildings: vec![
            BuildingDef {
                name: "granary".into(),
                cost: 60,
                yield_change: PlotYield::new(1, 0, 0),
                ..bare_building()
            },
            BuildingDef {
                name: "library".into(),
                cost: 90,
                commerce_modifier: Commerce {
                    gold: 0,
                    research: 25,
                    culture: 0,
                },
                commerce: Commerce {
                    gold: 0,
                    research: 0,
                    culture: 1,
                },
                specialist_slots: vec![SCIENTIST, SCIENTIST],
                prereq_techs: vec![WRITING],
                ..bare_building()
            },
            BuildingDef {
                name: "temple".into(),
                cost: 80,
                happy: 1,
                commerce: Commerce {
                    gold: 0,
                    research: 0,
                    culture: 1,
                },
                ..bare_building()
            },
            BuildingDef {
                name: "market".into(),
                cost: 150,
                commerce_modifier: Commerce {
                    gold: 25,
                    research: 0,
                    culture: 0,
                },
                prereq_techs: vec![CURRENCY],
                ..bare_building()
            },
            BuildingDef {
                name: "aqueduct".into(),
                cost: 100,
                health: 2,
                prereq_techs: vec![CONSTRUCTION],
                ..bare_building()
            },
            BuildingDef {
                name: "monument".into(),
                cost: 30,
                commerce: Commerce {
                    gold: 0,
                    research: 0,
                    culture: 1,
                },
                ..bare_building()
            },
            BuildingDef {
                name: "courthouse".into(),
                cost: 120,
                maintenance_modifier: -50,
                prereq_techs: vec![CURRENCY],
                ..bare_building()
            },
            BuildingDef {
                name: "great forge".into(),
                cost: 250,
                yield_modifier: PlotYield::new(0, 25, 0),
                bonus_yield_changes: vec![(IRON, PlotYield::new(0, 2, 0))],
                prereq_techs: vec![IRON_WORKING],
                max_global_instances: Some(1),
                ..bare_building()
            },
            BuildingDef {
                name: "palace".into(),
                cost: 160,
                commerce: Commerce {
                    gold: 2,
                    research: 0,
                    culture: 1,
                },
                is_national_wonder: true,
                is_government_center: true,
                ..bare_building()
            },
            BuildingDef {
                name: "forge".into(),
                cost: 120,
                yield_modifier: PlotYield::new(0, 25, 0),
                prereq_techs: vec![MINING],
                ..bare_building()
            },
            BuildingDef {
                name: "stone circle".into(),
                cost: 50,
                commerce: Commerce {
                    gold: 0,
                    research: 0,
                    culture: 2,
                },
                max_global_instances: Some(3),
                ..bare_building()
            },
        ],
        units: vec![
            UnitDef {
                name: "settler".into(),
                cost: 100,
                combat: 0,
                moves: 1,
                default_ai: UnitAiKind::Settle,
                prereq_techs: Vec::new(),
                prereq_bonus: None,
            },
            UnitDef {
                name: "worker".into(),
                cost: 60,
                combat: 0,
                moves: 1,
                default_ai: UnitAiKind::Worker,
                prereq_techs: Vec::new(),
                prereq_bonus: None,
            },
            UnitDef {
                name: "warrior".into(),
                cost: 15,
                combat: 2,
                moves: 1,
                default_ai: UnitAiKind::Defence,
                prereq_techs: Vec::new(),
                prereq_bonus: None,
            },
            UnitDef {
                name: "swordsman".into(),
                cost: 40,
                combat: 6,
                moves: 1,
                default_ai: UnitAiKind::Attack,
                prereq_techs: vec![IRON_WORKING],
                prereq_bonus: Some(IRON),
            },
        ],
        projects: vec![ProjectDef {
            name: "grand trial".into(),
            cost: 500,
            prereq_techs: vec![CONSTRUCTION],
            victory_project: true,
            prereq_project: None,
        }],
        processes: vec![
            ProcessDef {
                name: "wealth".into(),
                commerce_kind: CommerceKind::Gold,
                modifier: 100,
                prereq_tech: Some(CURRENCY),
            },
            ProcessDef {
                name: "research".into(),
                commerce_kind: CommerceKind::Research,
                modifier: 100,
                prereq_tech: Some(WRITING),
            },
        ],
        techs: vec![
            TechDef {
                name: "agriculture".into(),
                cost: 40,
                and_prereqs: Vec::new(),
            },
            TechDef {
                name: "mining".into(),
                cost: 50,
                and_prereqs: Vec::new(),
            },
            TechDef {
                name: "pottery".into(),
                cost: 60,
                and_prereqs: vec![AGRICULTURE],
            },
            TechDef {
                name: "writing".into(),
                cost: 90,
                and_prereqs: vec![POTTERY],
            },
            TechDef {
                name: "currency".into(),
                cost: 120,
                and_prereqs: vec![WRITING],
            },
            TechDef {
                name: "iron working".into(),
                cost: 120,
                and_prereqs: vec![MINING],
            },
            TechDef {
                name: "construction".into(),
                cost: 150,
                and_prereqs: vec![MINING, POTTERY],
            },
        ],
        scalars: GameScalars::default(),
    }
}

fn bare_building() -> BuildingDef {
    BuildingDef {
        name: String::new(),
        cost: 0,
        commerce: Commerce::default(),
        yield_change: PlotYield::default(),
        yield_modifier: PlotYield::default(),
        commerce_modifier: Commerce::default(),
        happy: 0,
        health: 0,
        maintenance_modifier: 0,
        gpp: 0,
        specialist_slots: Vec::new(),
        prereq_techs: Vec::new(),
        prereq_buildings: Vec::new(),
        bonus_yield_changes: Vec::new(),
        prereq_bonus: None,
        max_global_instances: None,
        is_national_wonder: false,
        is_government_center: false,
        victory_building: false,
    }
}

/// Scriptable in-memory game world.
pub struct FixtureWorld {
    width: i16,
    height: i16,
    turn: u32,
    rules: RuleSet,
    plots: FnvHashMap<PlotCoords, PlotSnapshot>,
    revealed: FnvHashSet<(PlayerId, PlotCoords)>,
    reveal_all: bool,
    players: FnvHashMap<PlayerId, PlayerSnapshot>,
    cities: FnvHashMap<CityId, CitySnapshot>,
    techs: FnvHashSet<(PlayerId, TechType)>,
    connected_bonuses: FnvHashSet<(PlayerId, BonusType)>,
    global_buildings: FnvHashMap<BuildingType, u32>,
}

impl FixtureWorld {
    /// A width x height world of bare grassland, everything revealed.
    pub fn new(width: i16, height: i16) -> FixtureWorld {
        let mut plots = FnvHashMap::default();
        for y in 0..height {
            for x in 0..width {
                let coords = PlotCoords::new(x, y);
                plots.insert(
                    coords,
                    PlotSnapshot {
                        coords,
                        terrain: GRASSLAND,
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
                    },
                );
            }
        }
        FixtureWorld {
            width,
            height,
            turn: 0,
            rules: fixture_rules(),
            plots,
            revealed: FnvHashSet::default(),
            reveal_all: true,
            players: FnvHashMap::default(),
            cities: FnvHashMap::default(),
            techs: FnvHashSet::default(),
            connected_bonuses: FnvHashSet::default(),
            global_buildings: FnvHashMap::default(),
        }
    }

    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    pub fn advance_turn(&mut self) {
        self.turn += 1;
    }

    pub fn plot_mut(&mut self, coords: PlotCoords) -> &mut PlotSnapshot {
        self.plots.get_mut(&coords).unwrap_or_else(|| {
            panic!("fixture plot out of bounds: {:?}", coords)
        })
    }

    pub fn set_terrain(&mut self, coords: PlotCoords, terrain: TerrainType) -> &mut Self {
        self.plot_mut(coords).terrain = terrain;
        self
    }

    pub fn set_hills(&mut self, coords: PlotCoords) -> &mut Self {
        self.plot_mut(coords).is_hills = true;
        self
    }

    pub fn set_fresh_water(&mut self, coords: PlotCoords) -> &mut Self {
        self.plot_mut(coords).is_fresh_water = true;
        self
    }

    pub fn set_bonus(&mut self, coords: PlotCoords, bonus: BonusType) -> &mut Self {
        self.plot_mut(coords).bonus = Some(bonus);
        self
    }

    pub fn set_feature(&mut self, coords: PlotCoords, feature: FeatureType) -> &mut Self {
        self.plot_mut(coords).feature = Some(feature);
        self
    }

    pub fn set_goody_hut(&mut self, coords: PlotCoords) -> &mut Self {
        self.plot_mut(coords).has_goody_hut = true;
        self
    }

    /// Restrict visibility: only explicitly revealed plots are known.
    pub fn use_fog(&mut self) -> &mut Self {
        self.reveal_all = false;
        self
    }

    pub fn reveal(&mut self, player: PlayerId, coords: PlotCoords) -> &mut Self {
        self.revealed.insert((player, coords));
        self
    }

    pub fn add_player(&mut self, id: PlayerId) -> &mut Self {
        self.players.insert(
            id,
            PlayerSnapshot {
                id,
                team: TeamId(id.0),
                gold: 50,
                gold_rate: 2,
                max_research_rate: 80,
                current_research_rate: 80,
                num_cities: 0,
            },
        );
        self
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerSnapshot {
        self.players
            .get_mut(&id)
            .unwrap_or_else(|| panic!("fixture player missing: {:?}", id))
    }

    pub fn grant_tech(&mut self, player: PlayerId, tech: TechType) -> &mut Self {
        self.techs.insert((player, tech));
        self
    }

    pub fn connect_bonus(&mut self, player: PlayerId, bonus: BonusType) -> &mut Self {
        self.connected_bonuses.insert((player, bonus));
        self
    }

    /// Place a city, claim its inner ring and bump the owner's city count.
    pub fn add_city(
        &mut self,
        id: CityId,
        owner: PlayerId,
        coords: PlotCoords,
        population: i32,
    ) -> &mut Self {
        self.cities.insert(
            id,
            CitySnapshot {
                id,
                owner,
                coords,
                population,
                culture: 20,
                culture_level: 1,
                stored_food: 0,
                is_coastal: false,
                is_capital: self.cities.values().all(|c| c.owner != owner),
                buildings: Vec::new(),
            },
        );
        self.plot_mut(coords).city = Some(id);
        self.plot_mut(coords).owner = Some(owner);
        for neighbour in coords.neighbours().collect::<Vec<_>>() {
            if let Some(plot) = self.plots.get_mut(&neighbour) {
                if plot.owner.is_none() {
                    plot.owner = Some(owner);
                }
            }
        }
        self.player_mut(owner).num_cities += 1;
        self
    }

    pub fn city_mut(&mut self, id: CityId) -> &mut CitySnapshot {
        self.cities
            .get_mut(&id)
            .unwrap_or_else(|| panic!("fixture city missing: {:?}", id))
    }

    pub fn set_global_building_count(&mut self, building: BuildingType, count: u32) -> &mut Self {
        self.global_buildings.insert(building, count);
        self
    }
}

impl GameView for FixtureWorld {
    fn map_size(&self) -> (i16, i16) {
        (self.width, self.height)
    }

    fn current_turn(&self) -> u32 {
        self.turn
    }

    fn rules(&self) -> &RuleSet {
        &self.rules
    }

    fn plot(&self, coords: PlotCoords) -> Option<PlotSnapshot> {
        self.plots.get(&coords).cloned()
    }

    fn is_revealed(&self, coords: PlotCoords, player: PlayerId) -> bool {
        self.in_bounds(coords)
            && (self.reveal_all || self.revealed.contains(&(player, coords)))
    }

    fn player(&self, id: PlayerId) -> Option<PlayerSnapshot> {
        self.players.get(&id).cloned()
    }

    fn player_has_tech(&self, player: PlayerId, tech: TechType) -> bool {
        self.techs.contains(&(player, tech))
    }

    fn city(&self, id: CityId) -> Option<CitySnapshot> {
        self.cities.get(&id).cloned()
    }

    fn player_cities(&self, player: PlayerId) -> Vec<CityId> {
        let mut ids: Vec<CityId> = self
            .cities
            .values()
            .filter(|c| c.owner == player)
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids
    }

    fn global_building_count(&self, building: BuildingType) -> u32 {
        self.global_buildings.get(&building).copied().unwrap_or(0)
    }

    fn has_bonus_connected(&self, player: PlayerId, bonus: BonusType) -> bool {
        self.connected_bonuses.contains(&(player, bonus))
    }
}
