//! Project candidate generation and selection.

use super::{within_tech_lookahead, PlayerTactics};
use crate::construct_item::{Buildable, ConstructItem, VictoryFlags};
use crate::host::GameView;
use crate::info;
use crate::rules::*;
use fnv::FnvHashMap;

pub fn make_project_tactics(
    view: &dyn GameView,
    player: PlayerId,
) -> FnvHashMap<ProjectType, ConstructItem> {
    let rules = view.rules();
    let mut candidates = FnvHashMap::default();

    for project in rules.project_types() {
        let tree = info::project_info(rules, project);
        let item = ConstructItem::from_info(Buildable::Project(project), &tree);
        if !within_tech_lookahead(view, player, &item.required_techs) {
            continue;
        }
        candidates.insert(project, item);
    }

    candidates
}

/// A victory project the player could start now, cheapest first. Chained
/// projects stay out until their predecessor is done, which the host tracks;
/// the caller supplies the completed set.
pub fn select_victory_project(
    view: &dyn GameView,
    player: PlayerId,
    tactics: &PlayerTactics,
    completed: &[ProjectType],
) -> Option<ConstructItem> {
    let rules = view.rules();
    tactics
        .projects
        .iter()
        .filter(|(&p, item)| {
            item.victory.contains(VictoryFlags::PROJECT)
                && !completed.contains(&p)
                && item
                    .required_techs
                    .iter()
                    .all(|&t| view.player_has_tech(player, t))
                && rules
                    .project(p)
                    .prereq_project
                    .map(|prereq| completed.contains(&prereq))
                    .unwrap_or(true)
        })
        .min_by_key(|(&p, _)| rules.project(p).cost)
        .map(|(_, item)| item.clone())
}
