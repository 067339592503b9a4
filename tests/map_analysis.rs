//! Map analysis over the fixture world: partitioning, key upkeep, plot
//! values and shared-plot bookkeeping.

mod common;

use common::*;
use empire_advisor::coords::PlotCoords;
use empire_advisor::fixture::{self, FixtureWorld};
use empire_advisor::host::GameView;
use empire_advisor::map_analysis::MapAnalysis;
use empire_advisor::rules::CityId;

fn ocean_strip(world: &mut FixtureWorld) {
    // Split the map into two land masses with a vertical ocean band.
    for y in 0..12 {
        for x in 7..9 {
            world.set_terrain(p(x, y), fixture::OCEAN);
        }
    }
}

#[test]
fn sub_areas_partition_land_and_water() {
    let mut world = open_world();
    ocean_strip(&mut world);
    let analysis = MapAnalysis::new(&world, ALICE);
    let registry = analysis.registry();

    let west = registry.sub_area_at(p(2, 2)).unwrap();
    let east = registry.sub_area_at(p(10, 2)).unwrap();
    let sea = registry.sub_area_at(p(7, 5)).unwrap();
    assert_ne!(west, east);
    assert_ne!(west, sea);
    assert!(registry.sub_area(sea).unwrap().is_water);
    assert!(!registry.sub_area(west).unwrap().is_water);

    // The sea borders both shores.
    let bordering: Vec<_> = registry.bordering(sea).collect();
    assert!(bordering.contains(&west));
    assert!(bordering.contains(&east));
}

#[test]
fn revealed_counters_reach_fully_known() {
    let mut world = open_world();
    world.use_fog();
    world.reveal(ALICE, p(0, 0));
    let mut analysis = MapAnalysis::new(&world, ALICE);
    assert!(!analysis.is_fully_known());
    assert_eq!(analysis.percent_revealed(), 0);

    for y in 0..12 {
        for x in 0..12 {
            world.reveal(ALICE, p(x, y));
        }
    }
    for y in 0..12 {
        for x in 0..12 {
            analysis.update_plot_revealed(&world, p(x, y));
        }
    }
    assert!(analysis.is_fully_known());
}

#[test]
fn improvement_changes_are_visible_through_the_key_cache() {
    let mut world = open_world();
    world.set_hills(p(3, 3));
    world.set_hills(p(8, 8));
    world.plot_mut(p(8, 8)).improvement = Some(fixture::MINE);
    let mut analysis = MapAnalysis::new(&world, ALICE);

    // Identical terrain, different improvements: distinct keys, and each
    // key's cached yield reflects its own improvement state.
    assert_ne!(analysis.plot_key(p(3, 3)), analysis.plot_key(p(8, 8)));
    let bare = analysis.plot_key_info(p(3, 3)).unwrap();
    let mined = analysis.plot_key_info(p(8, 8)).unwrap();
    assert_eq!(bare.current_yield.production, 1);
    assert_eq!(mined.current_yield.production, 3);

    // Mining the bare hill refreshes its cached yield.
    world.plot_mut(p(3, 3)).improvement = Some(fixture::MINE);
    analysis.update_plot_improvement(&world, p(3, 3), Some(fixture::MINE));
    let now_mined = analysis.plot_key_info(p(3, 3)).unwrap();
    assert_eq!(now_mined.current_yield.production, 3);
}

#[test]
fn sub_area_knowledge_tracks_partial_reveals() {
    let mut world = open_world();
    ocean_strip(&mut world);
    world.use_fog();
    for y in 0..12 {
        for x in 0..7 {
            world.reveal(ALICE, p(x, y));
        }
    }
    world.reveal(ALICE, p(10, 2));
    let mut analysis = MapAnalysis::new(&world, ALICE);

    let west = analysis.registry().sub_area_at(p(2, 2)).unwrap();
    let east = analysis.registry().sub_area_at(p(10, 2)).unwrap();
    assert!(analysis.sub_area_fully_known(west));
    assert!(!analysis.sub_area_fully_known(east));
    assert!(!analysis.is_fully_known());

    for y in 0..12 {
        for x in 9..12 {
            world.reveal(ALICE, p(x, y));
            analysis.update_plot_revealed(&world, p(x, y));
        }
    }
    assert!(analysis.sub_area_fully_known(east));
}

#[test]
fn rival_culture_without_a_visible_city_flags_a_hostile_border() {
    let mut world = world_with_capital();
    world.add_player(BOB);
    let mut analysis = MapAnalysis::new(&world, ALICE);

    world.plot_mut(p(10, 10)).owner = Some(BOB);
    analysis.update_plot_culture(&world, p(10, 10), Some(BOB));
    assert!(analysis.unknown_hostile_plots().any(|c| c == p(10, 10)));

    // The owning city comes into view; the border entry resolves.
    world.add_city(CityId(9), BOB, p(10, 10), 1);
    analysis.update_plot_culture(&world, p(10, 10), Some(BOB));
    assert!(analysis.unknown_hostile_plots().all(|c| c != p(10, 10)));
}

#[test]
fn goody_huts_register_and_clear() {
    let mut world = open_world();
    world.set_goody_hut(p(4, 4));
    let mut analysis = MapAnalysis::new(&world, ALICE);
    assert_eq!(analysis.goody_huts().collect::<Vec<_>>(), vec![p(4, 4)]);
    analysis.clear_goody_hut(p(4, 4));
    assert_eq!(analysis.goody_huts().count(), 0);
}

#[test]
fn bonus_change_refreshes_the_plot_key() {
    let mut world = open_world();
    let mut analysis = MapAnalysis::new(&world, ALICE);
    let before = analysis.plot_key(p(3, 3)).unwrap();

    world.set_bonus(p(3, 3), fixture::WHEAT);
    analysis.update_plot_bonus(&world, p(3, 3), Some(fixture::WHEAT));

    let after = analysis.plot_key(p(3, 3)).unwrap();
    assert_ne!(before, after);
    let sub_area = analysis.registry().sub_area_at(p(3, 3)).unwrap();
    assert_eq!(analysis.bonus_plots(sub_area, fixture::WHEAT), &[p(3, 3)]);

    // An unchanged plot keeps its key across refreshes.
    analysis.update_plot_bonus(&world, p(3, 3), Some(fixture::WHEAT));
    assert_eq!(analysis.plot_key(p(3, 3)).unwrap(), after);
}

#[test]
fn plot_values_track_ownership() {
    let mut world = open_world();
    let mut analysis = MapAnalysis::new(&world, ALICE);
    analysis.update_plot_values(&world);

    let sub_area = analysis.registry().sub_area_at(p(6, 6)).unwrap();
    let sites = &analysis.plot_values()[&sub_area];
    // (6,6) is workable from a city founded at (5,5).
    assert!(sites[&p(5, 5)].contains(&p(6, 6)));

    // A rival claims the plot; the next drain detaches it everywhere.
    world.add_player(BOB);
    world.plot_mut(p(6, 6)).owner = Some(BOB);
    analysis.update_plot_culture(&world, p(6, 6), Some(BOB));
    analysis.update_plot_values(&world);

    let sites = &analysis.plot_values()[&sub_area];
    assert!(!sites[&p(5, 5)].contains(&p(6, 6)));
}

#[test]
fn culture_gain_between_two_cities_enters_shared_index() {
    let mut world = world_with_capital();
    world.add_city(CityId(2), ALICE, p(8, 5), 2);
    world.city_mut(CityId(2)).culture_level = 2;
    let mut analysis = MapAnalysis::new(&world, ALICE);

    // (6,5) and (7,5) sit in both crosses once both cities expand.
    world.plot_mut(p(7, 5)).owner = Some(ALICE);
    analysis.update_plot_culture(&world, p(7, 5), Some(ALICE));

    let shared = analysis.shared_plots().plot(p(7, 5)).unwrap();
    assert_eq!(shared.possible_cities.len(), 2);
    assert!(shared.possible_cities.contains(&CAPITAL));
    assert!(shared.possible_cities.contains(&CityId(2)));
}

#[test]
fn losing_a_shared_plot_to_rival_culture_drops_it() {
    let mut world = world_with_capital();
    world.add_city(CityId(2), ALICE, p(8, 5), 2);
    world.city_mut(CityId(2)).culture_level = 2;
    let mut analysis = MapAnalysis::new(&world, ALICE);

    world.plot_mut(p(7, 5)).owner = Some(ALICE);
    analysis.update_plot_culture(&world, p(7, 5), Some(ALICE));
    assert!(analysis.shared_plots().plot(p(7, 5)).is_some());

    world.add_player(BOB);
    world.plot_mut(p(7, 5)).owner = Some(BOB);
    analysis.update_plot_culture(&world, p(7, 5), Some(BOB));
    assert!(analysis.shared_plots().plot(p(7, 5)).is_none());
}

#[test]
fn closest_city_stays_within_the_sub_area() {
    let mut world = world_with_capital();
    ocean_strip(&mut world);
    world.add_city(CityId(2), ALICE, p(10, 5), 2);
    let analysis = MapAnalysis::new(&world, ALICE);

    // From the western land mass only the capital is reachable.
    let (city, distance) = analysis.closest_city(&world, p(2, 5)).unwrap();
    assert_eq!(city, CAPITAL);
    assert_eq!(distance, 3);

    // From the east, the eastern city.
    let (city, _) = analysis.closest_city(&world, p(11, 5)).unwrap();
    assert_eq!(city, CityId(2));
}

#[test]
fn closest_city_from_sea_finds_coastal_cities() {
    let mut world = world_with_capital();
    ocean_strip(&mut world);
    // Capital isn't on the shore; put a coastal city at (6,5) next to the sea.
    world.add_city(CityId(2), ALICE, p(6, 5), 1);
    let analysis = MapAnalysis::new(&world, ALICE);

    let found: Option<PlotCoords> = analysis
        .closest_city(&world, p(7, 5))
        .and_then(|(id, _)| world.city(id))
        .map(|c| c.coords);
    assert_eq!(found, Some(p(6, 5)));
}
