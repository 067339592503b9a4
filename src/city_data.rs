//! Per-city economic simulation state.
//!
//! `CityData` is a value type: the live instance belongs to the `City`
//! wrapper, and hypothetical branches work on independent deep copies made
//! with `clone()`. Nothing here touches the host engine after construction.

use crate::coords::{self, PlotCoords};
use crate::events::CityEvent;
use crate::host::{CitySnapshot, GameView};
use crate::output::{CityOutput, Commerce, PlotYield};
use crate::plot_info;
use crate::rules::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One potentially-workable plot tracked by the city model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlotOutput {
    pub coords: PlotCoords,
    pub ring: u8,
    pub yield_: PlotYield,
    pub bonus: Option<BonusType>,
    pub improvement: Option<ImprovementType>,
    /// Pending timed upgrade: (target, turns remaining, yield after upgrade).
    pub upgrade: Option<(ImprovementType, u32, PlotYield)>,
    pub worked: bool,
    /// Assigned to another of the player's cities by shared-plot arbitration.
    pub locked: bool,
    /// Inside the city's current culture ring.
    pub controlled: bool,
}

/// Accumulated building/civic modifiers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CityModifiers {
    /// Percentage yield modifiers (0 = unmodified).
    pub yield_modifier: PlotYield,
    pub commerce_modifier: Commerce,
    pub extra_happy: i32,
    pub extra_health: i32,
    /// Percentage change to maintenance (negative = relief).
    pub maintenance_modifier: i32,
    pub gpp_modifier: i32,
}

/// How the player's commerce slider splits raw commerce.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct CommerceRates {
    pub gold_percent: i32,
    pub research_percent: i32,
    pub culture_percent: i32,
}

impl Default for CommerceRates {
    fn default() -> Self {
        CommerceRates {
            gold_percent: 40,
            research_percent: 50,
            culture_percent: 10,
        }
    }
}

/// What a city can put production into during simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueuedBuild {
    Building(BuildingType),
    Unit(UnitType),
    /// Processes convert production to commerce and never complete.
    Process(ProcessType),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildQueueItem {
    pub what: QueuedBuild,
    pub cost_remaining: i32,
}

/// Base plus per-city maintenance, in gold per turn.
pub fn city_maintenance(
    scalars: &GameScalars,
    distance_to_capital: u32,
    num_cities: u32,
    modifier_percent: i32,
) -> i32 {
    let raw = scalars.maintenance_distance_coeff * distance_to_capital as i32
        + scalars.maintenance_cities_coeff * num_cities as i32;
    // Tenths of gold, rounded down, never negative.
    (raw * (100 + modifier_percent) / 100 / 10).max(0)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CityData {
    pub city: CityId,
    pub owner: PlayerId,
    pub centre: PlotCoords,
    pub population: i32,
    pub stored_food: i32,
    pub culture: i32,
    pub culture_level: u8,
    pub gpp: i32,
    pub buildings: Vec<BuildingType>,
    pub centre_yield: PlotYield,
    pub plots: Vec<PlotOutput>,
    /// Specialist slots opened by buildings.
    pub specialist_slots: Vec<SpecialistType>,
    /// Currently assigned specialists (subset of slots).
    pub specialists: Vec<SpecialistType>,
    pub modifiers: CityModifiers,
    pub rates: CommerceRates,
    pub flat_yield: PlotYield,
    pub flat_commerce: Commerce,
    pub queue: VecDeque<BuildQueueItem>,
    pub maintenance: i32,
    pub base_happy: i32,
    pub base_health: i32,
    pub bonus_happy: i32,
    pub bonus_health: i32,
}

impl CityData {
    /// Build the live model for a city from the host view.
    pub fn for_city(view: &dyn GameView, snapshot: &CitySnapshot) -> CityData {
        let rules = view.rules();
        let scalars = &rules.scalars;
        let player = view.player(snapshot.owner);
        let num_cities = player.as_ref().map(|p| p.num_cities).unwrap_or(1);

        let mut data = CityData {
            city: snapshot.id,
            owner: snapshot.owner,
            centre: snapshot.coords,
            population: snapshot.population,
            stored_food: snapshot.stored_food,
            culture: snapshot.culture,
            culture_level: snapshot.culture_level,
            gpp: 0,
            buildings: Vec::new(),
            // City centres always produce a worked minimum.
            centre_yield: PlotYield::new(2, 1, 1),
            plots: Vec::new(),
            specialist_slots: Vec::new(),
            specialists: Vec::new(),
            modifiers: CityModifiers::default(),
            rates: CommerceRates::default(),
            flat_yield: PlotYield::default(),
            flat_commerce: Commerce::default(),
            queue: VecDeque::new(),
            maintenance: 0,
            base_happy: scalars.base_happy,
            base_health: scalars.base_health,
            bonus_happy: 0,
            bonus_health: 0,
        };

        for coords in coords::workable_plots(snapshot.coords, u8::MAX) {
            let Some(plot) = view.plot(coords) else {
                continue;
            };
            if !view.is_revealed(coords, snapshot.owner) {
                continue;
            }
            let ours_or_unowned =
                plot.owner.is_none() || plot.owner == Some(snapshot.owner);
            if !ours_or_unowned || plot.city.is_some() {
                continue;
            }
            let ring = match coords::fat_cross_ring(snapshot.coords, coords) {
                Some(r) => r,
                None => continue,
            };
            let controlled = plot.owner == Some(snapshot.owner)
                && (ring == 1 || snapshot.culture_level >= 2);
            let upgrade = plot.improvement.and_then(|imp| {
                rules.improvement(imp).upgrade.map(|(target, turns)| {
                    let mut upgraded = plot.clone();
                    upgraded.improvement = Some(target);
                    (target, turns, plot_info::base_yield(&upgraded, rules))
                })
            });
            let locked = plot
                .working_city
                .map(|c| c != snapshot.id)
                .unwrap_or(false);
            data.plots.push(PlotOutput {
                coords,
                ring,
                yield_: plot_info::base_yield(&plot, rules),
                bonus: plot.bonus,
                improvement: plot.improvement,
                upgrade,
                worked: plot.working_city == Some(snapshot.id),
                locked,
                controlled,
            });
        }

        for &building in &snapshot.buildings {
            data.apply_building(rules, building);
        }
        data.maintenance = city_maintenance(
            scalars,
            0,
            num_cities,
            data.modifiers.maintenance_modifier,
        );
        data
    }

    // -- caps ---------------------------------------------------------------

    pub fn happy_cap(&self) -> i32 {
        self.base_happy + self.bonus_happy + self.modifiers.extra_happy
    }

    pub fn health_cap(&self) -> i32 {
        self.base_health + self.bonus_health + self.modifiers.extra_health
    }

    pub fn angry_citizens(&self) -> i32 {
        (self.population - self.happy_cap()).max(0)
    }

    /// Extra food consumed by citizens over the health cap.
    pub fn unhealthiness(&self) -> i32 {
        (self.population - self.health_cap()).max(0)
    }

    /// Citizens available to work plots or fill specialist slots.
    pub fn workable_citizens(&self) -> i32 {
        (self.population - self.angry_citizens()).max(0)
    }

    // -- output -------------------------------------------------------------

    fn raw_yield(&self) -> PlotYield {
        let mut total = self.centre_yield + self.flat_yield;
        for plot in self.plots.iter().filter(|p| p.worked) {
            total += plot.yield_;
        }
        total
    }

    /// Full per-turn output under the current assignment.
    pub fn output(&self, rules: &RuleSet) -> CityOutput {
        let mut yield_ = self.raw_yield();
        let mut commerce = self.flat_commerce;
        let mut gpp = 0;

        for &specialist in &self.specialists {
            let def = rules.specialist(specialist);
            yield_ += def.yield_;
            commerce += def.commerce;
            gpp += def.gpp;
        }
        // Citizens beyond plots and slots fall back to laborers.
        let laborers = self.workable_citizens()
            - self.plots.iter().filter(|p| p.worked).count() as i32
            - self.specialists.len() as i32;
        if laborers > 0 {
            yield_.production += laborers;
        }

        let yield_ = yield_.modified(self.modifiers.yield_modifier);

        let raw_commerce = yield_.commerce;
        let split = Commerce {
            gold: raw_commerce * self.rates.gold_percent / 100,
            research: raw_commerce * self.rates.research_percent / 100,
            culture: raw_commerce * self.rates.culture_percent / 100,
        };
        let total = split + commerce;
        let modified = Commerce {
            gold: total.gold * (100 + self.modifiers.commerce_modifier.gold) / 100,
            research: total.research * (100 + self.modifiers.commerce_modifier.research) / 100,
            culture: total.culture * (100 + self.modifiers.commerce_modifier.culture) / 100,
        };

        let gpp = gpp * (100 + self.modifiers.gpp_modifier) / 100;

        // Processes convert production into a commerce channel.
        let mut production = yield_.production;
        let mut process_commerce = Commerce::default();
        if let Some(front) = self.queue.front() {
            if let QueuedBuild::Process(process) = front.what {
                let def = rules.process(process);
                let converted = production * def.modifier / 100;
                match def.commerce_kind {
                    crate::output::CommerceKind::Gold => process_commerce.gold += converted,
                    crate::output::CommerceKind::Research => process_commerce.research += converted,
                    crate::output::CommerceKind::Culture => process_commerce.culture += converted,
                }
                production = 0;
            }
        }

        CityOutput {
            food: yield_.food,
            production,
            gold: modified.gold + process_commerce.gold - self.maintenance,
            research: modified.research + process_commerce.research,
            culture: modified.culture + process_commerce.culture,
            gpp,
        }
    }

    pub fn food_consumption(&self, rules: &RuleSet) -> i32 {
        self.population * rules.scalars.food_per_pop + self.unhealthiness()
    }

    pub fn food_surplus(&self, rules: &RuleSet) -> i32 {
        self.output(rules).food - self.food_consumption(rules)
    }

    // -- construction -------------------------------------------------------

    pub fn push_building(&mut self, rules: &RuleSet, building: BuildingType) {
        self.queue.push_back(BuildQueueItem {
            what: QueuedBuild::Building(building),
            cost_remaining: rules.building(building).cost,
        });
    }

    pub fn push_unit(&mut self, rules: &RuleSet, unit: UnitType) {
        self.queue.push_back(BuildQueueItem {
            what: QueuedBuild::Unit(unit),
            cost_remaining: rules.unit(unit).cost,
        });
    }

    pub fn push_process(&mut self, process: ProcessType) {
        self.queue.push_back(BuildQueueItem {
            what: QueuedBuild::Process(process),
            cost_remaining: 0,
        });
    }

    pub fn has_building(&self, building: BuildingType) -> bool {
        self.buildings.contains(&building)
    }

    /// Fold a completed building's effects into the running modifiers.
    pub fn apply_building(&mut self, rules: &RuleSet, building: BuildingType) {
        let def = rules.building(building);
        self.buildings.push(building);
        self.flat_yield += def.yield_change;
        self.flat_commerce += def.commerce;
        self.modifiers.yield_modifier += def.yield_modifier;
        self.modifiers.commerce_modifier += def.commerce_modifier;
        self.modifiers.extra_happy += def.happy;
        self.modifiers.extra_health += def.health;
        self.modifiers.maintenance_modifier += def.maintenance_modifier;
        self.modifiers.gpp_modifier += def.gpp;
        self.specialist_slots.extend(def.specialist_slots.iter().copied());

        // Wonder synergies land on the plots carrying the bonus.
        for &(bonus, change) in &def.bonus_yield_changes {
            for plot in &mut self.plots {
                if plot.bonus == Some(bonus) {
                    plot.yield_ += change;
                }
            }
        }
    }

    // -- hurry --------------------------------------------------------------

    /// Whether a hurry of the given kind can complete the front queue item.
    pub fn can_hurry(&self, rules: &RuleSet, kind: HurryKind, available_gold: i32) -> bool {
        let Some(front) = self.queue.front() else {
            return false;
        };
        if matches!(front.what, QueuedBuild::Process(_)) {
            return false;
        }
        match kind {
            HurryKind::Gold { gold_per_production } => {
                front.cost_remaining * gold_per_production <= available_gold
            }
            HurryKind::Population { production_per_pop } => {
                let pop_cost =
                    (front.cost_remaining + production_per_pop - 1) / production_per_pop.max(1);
                self.population - pop_cost >= 1
            }
        }
    }

    /// Apply a hurry: pays the cost and zeroes the remaining production.
    /// The item still completes during the next `advance_turn`.
    pub fn hurry(&mut self, kind: HurryKind) -> (i32, Vec<CityEvent>) {
        let mut events = Vec::new();
        let mut gold_spent = 0;
        let Some(front) = self.queue.front_mut() else {
            return (0, events);
        };
        match kind {
            HurryKind::Gold { gold_per_production } => {
                gold_spent = front.cost_remaining * gold_per_production;
            }
            HurryKind::Population { production_per_pop } => {
                let pop_cost =
                    (front.cost_remaining + production_per_pop - 1) / production_per_pop.max(1);
                let pop_cost = pop_cost.min(self.population - 1).max(0);
                if pop_cost > 0 {
                    self.population -= pop_cost;
                    events.push(CityEvent::PopulationChange(-pop_cost));
                }
            }
        }
        front.cost_remaining = 0;
        (gold_spent, events)
    }

    // -- turn advance -------------------------------------------------------

    /// Advance the model by one turn, returning the events it generated.
    pub fn advance_turn(&mut self, rules: &RuleSet) -> Vec<CityEvent> {
        let mut events = Vec::new();
        let output = self.output(rules);
        let scalars = &rules.scalars;

        // Food and growth.
        let surplus = output.food - self.food_consumption(rules);
        self.stored_food += surplus;
        let threshold = rules.growth_threshold(self.population);
        if self.stored_food >= threshold {
            self.stored_food -= threshold;
            self.population += 1;
            events.push(CityEvent::PopulationChange(1));
        } else if self.stored_food < 0 {
            self.stored_food = 0;
            if self.population > 1 {
                self.population -= 1;
                events.push(CityEvent::PopulationChange(-1));
            }
        }

        // Production into the queue front.
        if let Some(front) = self.queue.front_mut() {
            if !matches!(front.what, QueuedBuild::Process(_)) {
                front.cost_remaining -= output.production;
                if front.cost_remaining <= 0 {
                    let done = self.queue.pop_front().expect("front checked above");
                    match done.what {
                        QueuedBuild::Building(building) => {
                            let happy_before = self.happy_cap();
                            let health_before = self.health_cap();
                            self.apply_building(rules, building);
                            events.push(CityEvent::BuildingDone(building));
                            let happy_delta = self.happy_cap() - happy_before;
                            if happy_delta != 0 {
                                events.push(CityEvent::HappyCapChange(happy_delta));
                            }
                            let health_delta = self.health_cap() - health_before;
                            if health_delta != 0 {
                                events.push(CityEvent::HealthCapChange(health_delta));
                            }
                        }
                        QueuedBuild::Unit(unit) => {
                            debug!(target: "city", "city {:?} completed unit {:?}", self.city, unit);
                        }
                        QueuedBuild::Process(_) => unreachable!(),
                    }
                }
            }
        }

        // Culture and border growth.
        self.culture += output.culture;
        let new_level = rules.culture_level(self.culture);
        if new_level > self.culture_level {
            self.culture_level = new_level;
            events.push(CityEvent::CultureBorderExpanded(new_level));
            if new_level >= 2 {
                for plot in &mut self.plots {
                    if plot.ring == 2 && !plot.controlled {
                        plot.controlled = true;
                        events.push(CityEvent::PlotControlChanged(plot.coords));
                    }
                }
            }
        }

        // Great people.
        self.gpp += output.gpp;
        if self.gpp >= scalars.gpp_threshold {
            self.gpp -= scalars.gpp_threshold;
            events.push(CityEvent::GreatPersonBorn);
        }

        // Timed improvement upgrades on worked plots.
        for plot in &mut self.plots {
            if !plot.worked {
                continue;
            }
            if let Some((target, turns, upgraded_yield)) = plot.upgrade {
                if turns <= 1 {
                    plot.improvement = Some(target);
                    plot.yield_ = upgraded_yield;
                    let next = rules.improvement(target).upgrade.map(|(t, n)| {
                        // Chain upgrades keep the same yield delta structure.
                        (t, n, upgraded_yield + rules.improvement(t).yield_change
                            - rules.improvement(target).yield_change)
                    });
                    plot.upgrade = next;
                    events.push(CityEvent::ImprovementUpgraded(plot.coords, target));
                } else {
                    plot.upgrade = Some((target, turns - 1, upgraded_yield));
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CommerceKind;

    fn rules() -> RuleSet {
        let mut rules = RuleSet::default();
        rules.buildings.push(BuildingDef {
            name: "granary".into(),
            cost: 30,
            commerce: Commerce::default(),
            yield_change: PlotYield::new(1, 0, 0),
            yield_modifier: PlotYield::default(),
            commerce_modifier: Commerce::default(),
            happy: 0,
            health: 1,
            maintenance_modifier: 0,
            gpp: 0,
            specialist_slots: vec![],
            prereq_techs: vec![],
            prereq_buildings: vec![],
            bonus_yield_changes: vec![],
            prereq_bonus: None,
            max_global_instances: None,
            is_national_wonder: false,
            is_government_center: false,
            victory_building: false,
        });
        rules.processes.push(ProcessDef {
            name: "wealth".into(),
            commerce_kind: CommerceKind::Gold,
            modifier: 100,
            prereq_tech: None,
        });
        rules
    }

    fn bare_city(rules: &RuleSet) -> CityData {
        CityData {
            city: CityId(1),
            owner: PlayerId(0),
            centre: PlotCoords::new(5, 5),
            population: 2,
            stored_food: 0,
            culture: 0,
            culture_level: 0,
            gpp: 0,
            buildings: Vec::new(),
            centre_yield: PlotYield::new(2, 1, 1),
            plots: vec![
                PlotOutput {
                    coords: PlotCoords::new(5, 6),
                    ring: 1,
                    yield_: PlotYield::new(3, 0, 0),
                    bonus: None,
                    improvement: None,
                    upgrade: None,
                    worked: true,
                    locked: false,
                    controlled: true,
                },
                PlotOutput {
                    coords: PlotCoords::new(6, 5),
                    ring: 1,
                    yield_: PlotYield::new(0, 3, 0),
                    bonus: None,
                    improvement: None,
                    upgrade: None,
                    worked: true,
                    locked: false,
                    controlled: true,
                },
            ],
            specialist_slots: Vec::new(),
            specialists: Vec::new(),
            modifiers: CityModifiers::default(),
            rates: CommerceRates::default(),
            flat_yield: PlotYield::default(),
            flat_commerce: Commerce::default(),
            queue: VecDeque::new(),
            maintenance: 0,
            base_happy: rules.scalars.base_happy,
            base_health: rules.scalars.base_health,
            bonus_happy: 0,
            bonus_health: 0,
        }
    }

    #[test]
    fn building_completes_and_applies_modifiers() {
        let rules = rules();
        let mut data = bare_city(&rules);
        data.push_building(&rules, BuildingType(0));

        let mut done = false;
        for _ in 0..12 {
            let events = data.advance_turn(&rules);
            if events
                .iter()
                .any(|e| matches!(e, CityEvent::BuildingDone(BuildingType(0))))
            {
                done = true;
                break;
            }
        }
        assert!(done, "granary should complete within 12 turns");
        assert!(data.has_building(BuildingType(0)));
        assert_eq!(data.health_cap(), rules.scalars.base_health + 1);
        assert_eq!(data.flat_yield.food, 1);
    }

    #[test]
    fn process_converts_production_to_gold() {
        let rules = rules();
        let mut data = bare_city(&rules);
        let baseline = data.output(&rules);
        data.push_process(ProcessType(0));
        let with_process = data.output(&rules);
        assert_eq!(with_process.production, 0);
        assert_eq!(with_process.gold, baseline.gold + baseline.production);
    }

    #[test]
    fn population_hurry_costs_population() {
        let rules = rules();
        let mut data = bare_city(&rules);
        data.population = 5;
        data.push_building(&rules, BuildingType(0));
        let kind = HurryKind::Population {
            production_per_pop: 30,
        };
        assert!(data.can_hurry(&rules, kind, 0));
        let (gold, events) = data.hurry(kind);
        assert_eq!(gold, 0);
        assert_eq!(events, vec![CityEvent::PopulationChange(-1)]);
        assert_eq!(data.queue.front().unwrap().cost_remaining, 0);
    }
}
