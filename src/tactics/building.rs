//! Building candidate generation and the per-city selection cascade.

use super::{best_process_for, within_tech_lookahead, CityAssessment, PlayerTactics};
use crate::constants::{HIGH_PRODUCTION_OUTPUT, LOW_RESEARCH_RATE, PRODUCTION_RANK_DIVISOR};
use crate::construct_item::{Buildable, ConstructItem, EconomicFlags};
use crate::host::GameView;
use crate::info;
use crate::output::CommerceKind;
use crate::rules::*;
use fnv::FnvHashMap;
use log::trace;

/// Generate the player's building candidates.
///
/// Filters: tech requirements beyond the lookahead window, world wonders
/// already built out game-wide, national wonders the player already placed.
/// Candidates surviving with unresearched techs are kept -- their tech list
/// tells the research side what to want; selection skips them until ready.
pub fn make_building_tactics(
    view: &dyn GameView,
    player: PlayerId,
) -> FnvHashMap<BuildingType, ConstructItem> {
    let rules = view.rules();
    let mut candidates = FnvHashMap::default();

    for building in rules.building_types() {
        let def = rules.building(building);
        if let Some(max) = def.max_global_instances {
            if view.global_building_count(building) >= max {
                continue;
            }
        }

        let tree = info::building_info(rules, building);
        let item = ConstructItem::from_info(Buildable::Building(building), &tree);
        if !within_tech_lookahead(view, player, &item.required_techs) {
            continue;
        }

        candidates.insert(building, item);
    }

    candidates
}

/// Whether the city could start the building this turn.
fn constructible_now(
    view: &dyn GameView,
    player: PlayerId,
    assessment: &CityAssessment,
    building: BuildingType,
    item: &ConstructItem,
) -> bool {
    let rules = view.rules();
    let def = rules.building(building);
    if assessment.data.has_building(building) {
        return false;
    }
    if item
        .required_techs
        .iter()
        .any(|&t| !view.player_has_tech(player, t))
    {
        return false;
    }
    if def
        .prereq_buildings
        .iter()
        .any(|&b| !assessment.data.has_building(b))
    {
        return false;
    }
    if let Some(bonus) = def.prereq_bonus {
        if !view.has_bonus_connected(player, bonus) {
            return false;
        }
    }
    // A government-centre national wonder belongs in the capital; anywhere
    // else it fights the palace.
    if def.is_national_wonder && def.is_government_center && !is_capital(view, assessment) {
        return false;
    }
    true
}

fn is_capital(view: &dyn GameView, assessment: &CityAssessment) -> bool {
    view.city(assessment.data.city)
        .map(|c| c.is_capital)
        .unwrap_or(false)
}

/// Cheapest constructible candidate matching a flag filter.
fn pick<'a>(
    view: &dyn GameView,
    player: PlayerId,
    tactics: &'a PlayerTactics,
    assessment: &CityAssessment,
    accept: impl Fn(BuildingType, &ConstructItem) -> bool,
) -> Option<&'a ConstructItem> {
    let rules = view.rules();
    tactics
        .buildings
        .iter()
        .filter(|(&b, item)| {
            accept(b, item) && constructible_now(view, player, assessment, b, item)
        })
        .min_by_key(|(&b, _)| rules.building(b).cost)
        .map(|(_, item)| item)
}

/// The per-city construction cascade. Each gate tests a concrete city need
/// and the first satisfiable one wins; the order encodes the priorities.
pub fn select_city_build(
    view: &dyn GameView,
    player: PlayerId,
    tactics: &PlayerTactics,
    assessment: &CityAssessment,
) -> Option<ConstructItem> {
    let rules = view.rules();
    let data = assessment.data;
    let research_rate = view
        .player(player)
        .map(|p| p.max_research_rate)
        .unwrap_or(100);

    let has = |item: &ConstructItem, flag: EconomicFlags| item.economic.contains(flag);
    let not_wonder = |b: BuildingType| !rules.building(b).is_world_wonder();

    // Borders not yet expanded: any culture source at all.
    if data.culture_level == 0 {
        if let Some(item) = pick(view, player, tactics, assessment, |_, i| {
            has(i, EconomicFlags::CULTURE)
        }) {
            trace!(target: "tactics", "city {:?}: culture need", data.city);
            return Some(item.clone());
        }
    }

    // Rival culture squeezing the cross: more culture, but never burn a
    // wonder with other economic roles just to win a border fight.
    if assessment.culture_pressure {
        if let Some(item) = pick(view, player, tactics, assessment, |b, i| {
            has(i, EconomicFlags::CULTURE)
                && !(rules.building(b).is_world_wonder()
                    && i.economic.intersects(!EconomicFlags::CULTURE))
        }) {
            trace!(target: "tactics", "city {:?}: culture pressure", data.city);
            return Some(item.clone());
        }
    }

    if data.angry_citizens() > 0 {
        if let Some(item) = pick(view, player, tactics, assessment, |_, i| {
            has(i, EconomicFlags::HAPPY)
        }) {
            trace!(target: "tactics", "city {:?}: happy deficit", data.city);
            return Some(item.clone());
        }
    }

    if data.unhealthiness() > 0 {
        if let Some(item) = pick(view, player, tactics, assessment, |_, i| {
            has(i, EconomicFlags::HEALTH)
        }) {
            trace!(target: "tactics", "city {:?}: health deficit", data.city);
            return Some(item.clone());
        }
    }

    // A struggling economy wants maintenance relief first, raw gold second.
    if research_rate < LOW_RESEARCH_RATE {
        if let Some(item) = pick(view, player, tactics, assessment, |_, i| {
            has(i, EconomicFlags::MAINTENANCE)
        })
        .or_else(|| {
            pick(view, player, tactics, assessment, |_, i| {
                has(i, EconomicFlags::GOLD)
            })
        }) {
            trace!(target: "tactics", "city {:?}: economy relief", data.city);
            return Some(item.clone());
        }
    }

    if data.food_surplus(rules) <= 0 {
        if let Some(item) = pick(view, player, tactics, assessment, |_, i| {
            has(i, EconomicFlags::FOOD)
        }) {
            trace!(target: "tactics", "city {:?}: food", data.city);
            return Some(item.clone());
        }
    }

    let top_production = CityAssessment::in_top_fraction(
        assessment.production_rank,
        assessment.num_cities,
        PRODUCTION_RANK_DIVISOR,
    );
    // A production powerhouse qualifies even from the bottom of the ranks.
    if top_production || data.output(rules).production >= HIGH_PRODUCTION_OUTPUT {
        if let Some(item) = pick(view, player, tactics, assessment, |b, i| {
            has(i, EconomicFlags::PRODUCTION) && not_wonder(b)
        }) {
            trace!(target: "tactics", "city {:?}: production", data.city);
            return Some(item.clone());
        }
    }
    if top_production {
        // Wonders whose bonus synergy this city's plots can actually feed.
        if let Some(item) = pick(view, player, tactics, assessment, |b, _| {
            let def = rules.building(b);
            def.is_world_wonder()
                && def.bonus_yield_changes.iter().any(|(bonus, _)| {
                    data.plots.iter().any(|p| p.bonus == Some(*bonus))
                })
        }) {
            trace!(target: "tactics", "city {:?}: wonder synergy", data.city);
            return Some(item.clone());
        }
    }

    if CityAssessment::in_top_fraction(
        assessment.commerce_rank,
        assessment.num_cities,
        PRODUCTION_RANK_DIVISOR,
    ) {
        if let Some(item) = pick(view, player, tactics, assessment, |_, i| {
            has(i, EconomicFlags::GOLD) || has(i, EconomicFlags::RESEARCH)
        }) {
            trace!(target: "tactics", "city {:?}: commerce", data.city);
            return Some(item.clone());
        }
    }

    // Nothing structural to build: run a conversion process.
    let preferred = if research_rate < LOW_RESEARCH_RATE {
        CommerceKind::Gold
    } else {
        CommerceKind::Research
    };
    best_process_for(rules, &tactics.processes, preferred)
        .or_else(|| best_process_for(rules, &tactics.processes, CommerceKind::Gold))
        .map(|process| ConstructItem::new(Buildable::Process(process)))
}
