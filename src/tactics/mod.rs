//! Candidate generation and per-city construction selection.
//!
//! Candidates are regenerated from the rule tables whenever the player's
//! tech or city situation shifts, filtered by a shallow tech lookahead, and
//! held per entity. Selection runs a fixed priority cascade over one city's
//! assessed needs; every gate is comparative against the player's other
//! cities rather than an absolute threshold.

pub mod building;
pub mod project;
pub mod unit;
pub mod worker;

use crate::city_data::CityData;
use crate::constants::TECH_LOOKAHEAD_DEPTH;
use crate::construct_item::ConstructItem;
use crate::host::GameView;
use crate::rules::*;
use fnv::{FnvHashMap, FnvHashSet};
use log::debug;

/// The player's live candidate pool, one entry per buildable entity.
#[derive(Clone, Debug, Default)]
pub struct PlayerTactics {
    pub buildings: FnvHashMap<BuildingType, ConstructItem>,
    pub units: FnvHashMap<UnitType, ConstructItem>,
    pub projects: FnvHashMap<ProjectType, ConstructItem>,
    pub processes: Vec<ProcessType>,
}

impl PlayerTactics {
    pub fn rebuild(view: &dyn GameView, player: PlayerId) -> PlayerTactics {
        let tactics = PlayerTactics {
            buildings: building::make_building_tactics(view, player),
            units: unit::make_unit_tactics(view, player),
            projects: project::make_project_tactics(view, player),
            processes: available_processes(view, player),
        };
        debug!(
            target: "tactics",
            "player {:?}: {} building, {} unit, {} project candidates",
            player,
            tactics.buildings.len(),
            tactics.units.len(),
            tactics.projects.len()
        );
        tactics
    }
}

/// One city's standing among the player's cities, precomputed by the
/// player layer each turn.
#[derive(Clone, Debug)]
pub struct CityAssessment<'a> {
    pub data: &'a CityData,
    /// 0-based rank of the city's production output, 0 = best.
    pub production_rank: usize,
    /// 0-based rank of the city's commerce output.
    pub commerce_rank: usize,
    pub num_cities: usize,
    /// Plots of this city's cross are being squeezed by rival culture.
    pub culture_pressure: bool,
}

impl CityAssessment<'_> {
    /// Whether a 0-based rank falls in the top `1/divisor` of the cities.
    pub fn in_top_fraction(rank: usize, num_cities: usize, divisor: usize) -> bool {
        rank * divisor < num_cities.max(1)
    }
}

/// Number of unresearched techs in a tech's prerequisite closure, itself
/// included. Zero means the tech is already known.
pub fn tech_depth(view: &dyn GameView, player: PlayerId, tech: TechType) -> u32 {
    let rules = view.rules();
    let mut missing: FnvHashSet<TechType> = FnvHashSet::default();
    let mut stack = vec![tech];
    while let Some(current) = stack.pop() {
        if view.player_has_tech(player, current) || missing.contains(&current) {
            continue;
        }
        missing.insert(current);
        stack.extend(rules.tech(current).and_prereqs.iter().copied());
    }
    missing.len() as u32
}

/// Deepest lookahead cost of a tech list; zero when everything is known.
pub fn techs_depth(view: &dyn GameView, player: PlayerId, techs: &[TechType]) -> u32 {
    techs
        .iter()
        .map(|&t| tech_depth(view, player, t))
        .max()
        .unwrap_or(0)
}

/// Whether a candidate's tech requirements fall inside the lookahead window.
pub fn within_tech_lookahead(view: &dyn GameView, player: PlayerId, techs: &[TechType]) -> bool {
    techs_depth(view, player, techs) <= TECH_LOOKAHEAD_DEPTH
}

fn available_processes(view: &dyn GameView, player: PlayerId) -> Vec<ProcessType> {
    let rules = view.rules();
    rules
        .process_types()
        .filter(|&p| {
            rules
                .process(p)
                .prereq_tech
                .map(|t| view.player_has_tech(player, t))
                .unwrap_or(true)
        })
        .collect()
}

/// The best process converting production into the given commerce channel:
/// highest conversion rate wins among the available candidates.
pub fn best_process_for(
    rules: &RuleSet,
    available: &[ProcessType],
    kind: crate::output::CommerceKind,
) -> Option<ProcessType> {
    available
        .iter()
        .copied()
        .filter(|&p| rules.process(p).commerce_kind == kind)
        .max_by_key(|&p| rules.process(p).modifier)
}
