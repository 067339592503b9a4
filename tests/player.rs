//! End-to-end turn updates through the `Player` integration layer.

mod common;

use common::*;
use empire_advisor::error::AdvisorError;
use empire_advisor::fixture::{self};
use empire_advisor::host::{HostCommand, MissionKind, UnitSnapshot};
use empire_advisor::player::Player;
use empire_advisor::rules::{CityId, UnitAiKind, UnitId};

#[test]
fn missing_city_lookup_is_an_error() {
    let world = world_with_capital();
    let player = Player::new(&world, ALICE);
    assert!(player.city(CAPITAL).is_ok());
    assert_eq!(
        player.city(CityId(99)).err(),
        Some(AdvisorError::MissingCity(CityId(99)))
    );
}

#[test]
fn update_turn_scores_sites_and_moves_the_settler() {
    let mut world = world_with_capital();
    grant_basic_techs(&mut world);
    let mut player = Player::new(&world, ALICE);
    player.add_unit(&UnitSnapshot {
        id: UnitId(7),
        owner: ALICE,
        unit_type: fixture::SETTLER,
        coords: p(9, 9),
        ai_kind: UnitAiKind::Settle,
    });

    player.update_turn(&world);
    let commands = player.take_commands();

    assert!(commands
        .iter()
        .any(|c| matches!(c, HostCommand::SetFoundValue { .. })));
    let mission = commands.iter().find_map(|c| match c {
        HostCommand::PushMission { unit, mission, target } if *unit == UnitId(7) => {
            Some((mission.clone(), *target))
        }
        _ => None,
    });
    let (mission, target) = mission.expect("settler should receive a mission");
    assert!(matches!(
        mission,
        MissionKind::MoveTo | MissionKind::FoundCity
    ));
    assert!(target.is_some());

    // The buffer drains once.
    assert!(player.take_commands().is_empty());
}

#[test]
fn update_turn_sends_the_worker_to_the_best_improvement() {
    let mut world = world_with_capital();
    grant_basic_techs(&mut world);
    // A bare hill in the capital's ring: the mine is the clear best build.
    world.set_hills(p(4, 5));
    let mut player = Player::new(&world, ALICE);
    player.add_unit(&UnitSnapshot {
        id: UnitId(3),
        owner: ALICE,
        unit_type: fixture::WORKER,
        coords: p(5, 5),
        ai_kind: UnitAiKind::Worker,
    });

    player.update_turn(&world);
    let commands = player.take_commands();
    let build = commands.iter().find_map(|c| match c {
        HostCommand::PushMission {
            unit: UnitId(3),
            mission: MissionKind::BuildImprovement(improvement),
            target,
        } => Some((*improvement, *target)),
        _ => None,
    });
    let (improvement, target) = build.expect("worker should receive a build mission");
    assert_eq!(improvement, fixture::MINE);
    assert_eq!(target, Some(p(4, 5)));
}

#[test]
fn every_city_gets_a_construction_choice() {
    let mut world = world_with_capital();
    grant_basic_techs(&mut world);
    world.add_city(CityId(2), ALICE, p(9, 9), 2);
    let mut player = Player::new(&world, ALICE);

    player.update_turn(&world);
    for id in [CAPITAL, CityId(2)] {
        let city = player.city(id).unwrap();
        assert!(
            city.chosen_build.is_some(),
            "city {:?} left without a choice",
            id
        );
        assert!(!city.data.queue.is_empty());
    }
}

#[test]
fn reloaded_player_rebuilds_its_tactics() {
    let mut world = world_with_capital();
    grant_basic_techs(&mut world);
    let mut player = Player::new(&world, ALICE);
    player.update_turn(&world);
    player.take_commands();

    let saved = serde_json::to_string(&player).expect("player state serializes");
    let mut loaded: Player = serde_json::from_str(&saved).expect("player state loads");

    world.advance_turn();
    loaded.update_turn(&world);
    let city = loaded.city(CAPITAL).unwrap();
    assert!(
        city.chosen_build.is_some(),
        "a loaded player must rebuild its candidate pool before choosing"
    );
}

#[test]
fn hostile_city_sighting_is_recorded_with_its_closest_city() {
    let mut world = world_with_capital();
    world.add_player(BOB);
    let mut player = Player::new(&world, ALICE);

    player.notify_hostile_city(&world, p(10, 10));
    let mission = &player.missions()[0];
    assert!(mission.targets.contains(&p(10, 10)));
    assert_eq!(mission.closest_city, Some(CAPITAL));
    assert_eq!(mission.mission, MissionKind::MoveTo);
}
