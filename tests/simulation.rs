//! Forward simulation: building projections, deltas and hurry behaviour.

mod common;

use common::*;
use empire_advisor::city_data::CityData;
use empire_advisor::city_optimiser::GrowthPolicy;
use empire_advisor::city_simulation::{project_building, CitySimulation, SimulationOutput};
use empire_advisor::fixture::{self, FixtureWorld};
use empire_advisor::host::GameView;
use empire_advisor::output::OutputWeights;
use empire_advisor::rules::HurryKind;

/// Capital with two mined hills in the inner ring so production is real.
fn productive_world() -> FixtureWorld {
    let mut world = world_with_capital();
    for coords in [p(4, 5), p(6, 5), p(5, 4)] {
        world.set_hills(coords);
        world.plot_mut(coords).improvement = Some(fixture::MINE);
    }
    world
}

fn capital_data(world: &FixtureWorld) -> CityData {
    let snapshot = world.city(CAPITAL).unwrap();
    CityData::for_city(world, &snapshot)
}

#[test]
fn completed_building_is_recorded_with_its_turn() {
    let world = productive_world();
    let data = capital_data(&world);

    let projection = project_building(
        &data,
        world.rules(),
        fixture::GRANARY,
        OutputWeights::standard(),
        GrowthPolicy::Grow,
        30,
    );

    assert_eq!(projection.baseline.building_results, vec![]);
    let record = projection.with_building.building_results[0];
    assert_eq!(record.building, fixture::GRANARY);
    assert!(record.completed_turn < 30);
}

#[test]
fn building_never_completed_leaves_no_record() {
    let world = productive_world();
    let data = capital_data(&world);

    // The wonder is far too expensive for a five-turn window.
    let projection = project_building(
        &data,
        world.rules(),
        fixture::GREAT_FORGE,
        OutputWeights::standard(),
        GrowthPolicy::Grow,
        5,
    );
    assert!(projection.with_building.building_results.is_empty());
}

#[test]
fn granary_projection_shows_a_food_gain() {
    let world = productive_world();
    let data = capital_data(&world);

    let projection = project_building(
        &data,
        world.rules(),
        fixture::GRANARY,
        OutputWeights::standard(),
        GrowthPolicy::Grow,
        30,
    );
    let delta = projection.delta();
    assert!(
        delta.food > 0,
        "a flat food building must show as a food delta, got {:?}",
        delta
    );
}

#[test]
fn identical_branches_have_zero_delta() {
    let world = productive_world();
    let data = capital_data(&world);
    let weights = OutputWeights::standard();

    let a = CitySimulation::new(data.clone(), weights, GrowthPolicy::Grow)
        .simulate(world.rules(), 20);
    let b = CitySimulation::new(data, weights, GrowthPolicy::Grow).simulate(world.rules(), 20);
    assert_eq!(SimulationOutput::delta(&a, &b), Default::default());
}

#[test]
fn gold_hurry_completes_the_building_early() {
    let world = productive_world();
    let rules = world.rules();
    let mut data = capital_data(&world);
    data.push_building(rules, fixture::GRANARY);

    let weights = OutputWeights::standard();
    let plain = CitySimulation::new(data.clone(), weights, GrowthPolicy::Grow)
        .simulate(rules, 30);
    let hurried = CitySimulation::new(data, weights, GrowthPolicy::Grow).simulate_with_hurry(
        rules,
        30,
        0,
        HurryKind::Gold {
            gold_per_production: 3,
        },
        1000,
    );

    let plain_done = plain.building_results[0].completed_turn;
    let hurried_done = hurried.building_results[0].completed_turn;
    assert_eq!(hurried_done, 0);
    assert!(hurried_done < plain_done);
    assert_eq!(hurried.hurry_gold_spent, 60 * 3);
    // The hurry turn itself is still recorded.
    assert_eq!(hurried.turns.len(), 30);
    assert_eq!(hurried.turns[0].gold_spent, 60 * 3);
}

#[test]
fn population_hurry_shrinks_the_city() {
    let world = productive_world();
    let rules = world.rules();
    let mut data = capital_data(&world);
    data.population = 5;
    data.push_building(rules, fixture::GRANARY);

    let hurried = CitySimulation::new(data, OutputWeights::standard(), GrowthPolicy::Grow)
        .simulate_with_hurry(
            rules,
            10,
            0,
            HurryKind::Population {
                production_per_pop: 30,
            },
            0,
        );

    assert_eq!(hurried.building_results[0].completed_turn, 0);
    assert!(
        hurried.turns[0].population < 5,
        "population hurry must cost citizens"
    );
}
