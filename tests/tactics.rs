//! Candidate generation filters and the construction selection cascade.

mod common;

use common::*;
use empire_advisor::city_data::CityData;
use empire_advisor::construct_item::{Buildable, EconomicFlags};
use empire_advisor::fixture::{self, FixtureWorld};
use empire_advisor::host::GameView;
use empire_advisor::output::{CommerceKind, PlotYield};
use empire_advisor::tactics::{
    best_process_for, building, tech_depth, CityAssessment, PlayerTactics,
};

fn capital_data(world: &FixtureWorld) -> CityData {
    let snapshot = world.city(CAPITAL).unwrap();
    CityData::for_city(world, &snapshot)
}

fn assessment(data: &CityData) -> CityAssessment<'_> {
    CityAssessment {
        data,
        production_rank: 0,
        commerce_rank: 0,
        num_cities: 1,
        culture_pressure: false,
    }
}

#[test]
fn tech_depth_counts_the_missing_closure() {
    let mut world = world_with_capital();
    // currency needs writing -> pottery -> agriculture: four missing techs.
    assert_eq!(tech_depth(&world, ALICE, fixture::CURRENCY), 4);
    world.grant_tech(ALICE, fixture::AGRICULTURE);
    world.grant_tech(ALICE, fixture::POTTERY);
    assert_eq!(tech_depth(&world, ALICE, fixture::CURRENCY), 2);
    world.grant_tech(ALICE, fixture::CURRENCY);
    assert_eq!(tech_depth(&world, ALICE, fixture::CURRENCY), 0);
}

#[test]
fn candidate_pool_respects_the_tech_lookahead() {
    let world = world_with_capital();
    // No techs at all: the market (currency, four techs deep) stays out,
    // the monument (no techs) stays in.
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    assert!(!tactics.buildings.contains_key(&fixture::MARKET));
    assert!(tactics.buildings.contains_key(&fixture::MONUMENT));

    let mut world = world_with_capital();
    grant_basic_techs(&mut world);
    // Now writing is one deep and currency two: both inside the window.
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    let library = &tactics.buildings[&fixture::LIBRARY];
    assert!(tactics.buildings.contains_key(&fixture::MARKET));
    assert_eq!(library.required_techs, vec![fixture::WRITING]);
    assert!(library.economic.contains(EconomicFlags::RESEARCH));
    assert!(library.economic.contains(EconomicFlags::CULTURE));
}

#[test]
fn maxed_world_wonder_is_not_a_candidate() {
    let mut world = world_with_capital();
    world.grant_tech(ALICE, fixture::MINING);
    world.grant_tech(ALICE, fixture::IRON_WORKING);
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    assert!(tactics.buildings.contains_key(&fixture::GREAT_FORGE));

    world.set_global_building_count(fixture::GREAT_FORGE, 1);
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    assert!(!tactics.buildings.contains_key(&fixture::GREAT_FORGE));
}

#[test]
fn borderless_city_builds_culture_first() {
    let world = world_with_capital();
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    let mut data = capital_data(&world);
    data.culture_level = 0;

    let choice = building::select_city_build(&world, ALICE, &tactics, &assessment(&data))
        .expect("cascade always returns something");
    // The monument is the cheapest culture source.
    assert_eq!(choice.buildable, Buildable::Building(fixture::MONUMENT));
}

#[test]
fn unhappiness_outranks_everything_but_culture() {
    let world = world_with_capital();
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    let mut data = capital_data(&world);
    // Borders fine, but population well past the happy cap.
    data.population = data.happy_cap() + 3;

    let choice = building::select_city_build(&world, ALICE, &tactics, &assessment(&data))
        .expect("cascade always returns something");
    assert_eq!(choice.buildable, Buildable::Building(fixture::TEMPLE));
}

#[test]
fn broke_economy_prefers_maintenance_relief() {
    let mut world = world_with_capital();
    grant_basic_techs(&mut world);
    world.grant_tech(ALICE, fixture::WRITING);
    world.grant_tech(ALICE, fixture::CURRENCY);
    world.player_mut(ALICE).max_research_rate = 30;

    let tactics = PlayerTactics::rebuild(&world, ALICE);
    let data = capital_data(&world);
    let choice = building::select_city_build(&world, ALICE, &tactics, &assessment(&data))
        .expect("cascade always returns something");
    assert_eq!(choice.buildable, Buildable::Building(fixture::COURTHOUSE));
}

#[test]
fn nothing_left_to_build_falls_back_to_a_process() {
    let mut world = world_with_capital();
    grant_basic_techs(&mut world);
    world.grant_tech(ALICE, fixture::WRITING);
    world.grant_tech(ALICE, fixture::CURRENCY);

    let tactics = PlayerTactics::rebuild(&world, ALICE);
    let mut data = capital_data(&world);
    // The city already has every candidate building.
    let buildings: Vec<_> = tactics.buildings.keys().copied().collect();
    for building in buildings {
        data.apply_building(world.rules(), building);
    }
    // Keep it content so no need-gate fires for units either.
    data.population = 1;

    let choice = building::select_city_build(&world, ALICE, &tactics, &assessment(&data))
        .expect("cascade always returns something");
    // Research rate is healthy, so the research process wins.
    assert_eq!(choice.buildable, Buildable::Process(fixture::RESEARCH));
}

#[test]
fn culture_pressure_accepts_a_pure_culture_wonder() {
    let world = world_with_capital();
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    let mut data = capital_data(&world);
    // Every plain culture source is already built.
    for building in [fixture::MONUMENT, fixture::TEMPLE, fixture::PALACE] {
        data.apply_building(world.rules(), building);
    }
    let mut squeezed = assessment(&data);
    squeezed.culture_pressure = true;

    let choice = building::select_city_build(&world, ALICE, &tactics, &squeezed)
        .expect("cascade always returns something");
    // The stone circle is a wonder, but culture is all it does, so the
    // pressure gate may spend it.
    assert_eq!(choice.buildable, Buildable::Building(fixture::STONE_CIRCLE));
}

#[test]
fn high_absolute_production_bypasses_the_rank_gate() {
    let mut world = world_with_capital();
    world.grant_tech(ALICE, fixture::MINING);
    let tactics = PlayerTactics::rebuild(&world, ALICE);
    let mut data = capital_data(&world);
    // Heavy worked plots: bottom of the ranks but a production powerhouse.
    for plot in data.plots.iter_mut().take(5) {
        plot.yield_ = PlotYield::new(2, 3, 0);
        plot.worked = true;
    }
    let bottom = CityAssessment {
        data: &data,
        production_rank: 3,
        commerce_rank: 3,
        num_cities: 4,
        culture_pressure: false,
    };

    let choice = building::select_city_build(&world, ALICE, &tactics, &bottom)
        .expect("cascade always returns something");
    assert_eq!(choice.buildable, Buildable::Building(fixture::FORGE));
}

#[test]
fn best_process_picks_the_highest_conversion_rate() {
    let world = world_with_capital();
    let rules = world.rules();
    let available = vec![fixture::WEALTH, fixture::RESEARCH];
    assert_eq!(
        best_process_for(rules, &available, CommerceKind::Gold),
        Some(fixture::WEALTH)
    );
    assert_eq!(
        best_process_for(rules, &available, CommerceKind::Culture),
        None
    );
}

#[test]
fn government_centre_wonder_only_fits_the_capital() {
    let mut world = world_with_capital();
    world.add_city(empire_advisor::rules::CityId(2), ALICE, p(9, 9), 10);
    let tactics = PlayerTactics::rebuild(&world, ALICE);

    // City 2 has no borders yet, so the culture gate fires. The palace
    // carries culture but is a government-centre national wonder: it must
    // never be picked outside the capital.
    let snapshot = world.city(empire_advisor::rules::CityId(2)).unwrap();
    let mut data = CityData::for_city(&world, &snapshot);
    data.culture_level = 0;
    let second = CityAssessment {
        data: &data,
        production_rank: 1,
        commerce_rank: 1,
        num_cities: 2,
        culture_pressure: false,
    };
    let choice = building::select_city_build(&world, ALICE, &tactics, &second)
        .expect("cascade always returns something");
    assert_ne!(choice.buildable, Buildable::Building(fixture::PALACE));
}
