//! Unit candidate generation and training selection.
//!
//! Settler and worker demand is read off the settler manager and the
//! dot-map achievable-improvement data; military posture here is limited to
//! keeping a defender in every city.

use super::{within_tech_lookahead, PlayerTactics};
use crate::construct_item::{Buildable, ConstructItem};
use crate::host::{GameView, UnitSnapshot};
use crate::info;
use crate::map_analysis::MapAnalysis;
use crate::output::OutputWeights;
use crate::rules::*;
use crate::settler::SettlerManager;
use fnv::FnvHashMap;
use log::trace;

pub fn make_unit_tactics(
    view: &dyn GameView,
    player: PlayerId,
) -> FnvHashMap<UnitType, ConstructItem> {
    let rules = view.rules();
    let mut candidates = FnvHashMap::default();

    for unit in rules.unit_types() {
        let tree = info::unit_info(rules, unit);
        let item = ConstructItem::from_info(Buildable::Unit(unit), &tree);
        if !within_tech_lookahead(view, player, &item.required_techs) {
            continue;
        }
        candidates.insert(unit, item);
    }

    candidates
}

/// How many settlers the player should have alive, given the site ranking.
pub fn desired_settlers(settler: &SettlerManager) -> usize {
    // One per open site, capped; a long site list does not justify a
    // settler flood.
    settler.sites().len().min(2)
}

/// How many workers the player should have alive.
pub fn desired_workers(
    view: &dyn GameView,
    analysis: &MapAnalysis,
    player: PlayerId,
) -> usize {
    let weights = OutputWeights::standard();
    let mut improvable = 0usize;
    for city_id in view.player_cities(player) {
        let Some(city) = view.city(city_id) else {
            continue;
        };
        for coords in crate::coords::workable_plots(city.coords, city.culture_level) {
            let improvable_here = analysis
                .plot_key_info(coords)
                .and_then(|info| info.best_improvement(&weights))
                .is_some();
            let ours = view
                .plot(coords)
                .map(|p| p.owner == Some(player) && p.improvement.is_none())
                .unwrap_or(false);
            if improvable_here && ours {
                improvable += 1;
            }
        }
    }
    // Roughly one worker per four outstanding improvement builds.
    improvable.div_ceil(4)
}

fn cheapest_with_ai(
    view: &dyn GameView,
    player: PlayerId,
    tactics: &PlayerTactics,
    ai: UnitAiKind,
) -> Option<ConstructItem> {
    let rules = view.rules();
    tactics
        .units
        .iter()
        .filter(|(&u, item)| {
            rules.unit(u).default_ai == ai
                && item
                    .required_techs
                    .iter()
                    .all(|&t| view.player_has_tech(player, t))
                && rules
                    .unit(u)
                    .prereq_bonus
                    .map(|b| view.has_bonus_connected(player, b))
                    .unwrap_or(true)
        })
        .min_by_key(|(&u, _)| rules.unit(u).cost)
        .map(|(_, item)| item.clone())
}

/// Pick a unit for a city to train, or nothing when no unit need stands.
pub fn select_city_train(
    view: &dyn GameView,
    player: PlayerId,
    tactics: &PlayerTactics,
    analysis: &MapAnalysis,
    settler: &SettlerManager,
    live_units: &[UnitSnapshot],
) -> Option<ConstructItem> {
    let settlers_alive = live_units
        .iter()
        .filter(|u| u.ai_kind == UnitAiKind::Settle)
        .count();
    let workers_alive = live_units
        .iter()
        .filter(|u| u.ai_kind == UnitAiKind::Worker)
        .count();

    if settlers_alive < desired_settlers(settler) {
        if let Some(item) = cheapest_with_ai(view, player, tactics, UnitAiKind::Settle) {
            trace!(target: "tactics", "player {:?}: settler wanted", player);
            return Some(item);
        }
    }

    if workers_alive < desired_workers(view, analysis, player) {
        if let Some(item) = cheapest_with_ai(view, player, tactics, UnitAiKind::Worker) {
            trace!(target: "tactics", "player {:?}: worker wanted", player);
            return Some(item);
        }
    }

    // Every city keeps at least one defender.
    let defenders = live_units
        .iter()
        .filter(|u| u.ai_kind == UnitAiKind::Defence)
        .count();
    if defenders < view.player_cities(player).len() {
        if let Some(item) = cheapest_with_ai(view, player, tactics, UnitAiKind::Defence) {
            trace!(target: "tactics", "player {:?}: defender wanted", player);
            return Some(item);
        }
    }

    None
}
