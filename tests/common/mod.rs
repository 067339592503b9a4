//! Shared world-building helpers for the integration tests.

use empire_advisor::coords::PlotCoords;
use empire_advisor::fixture::{self, FixtureWorld};
use empire_advisor::rules::{CityId, PlayerId};

pub const ALICE: PlayerId = PlayerId(0);
pub const BOB: PlayerId = PlayerId(1);
pub const CAPITAL: CityId = CityId(1);

pub fn p(x: i16, y: i16) -> PlotCoords {
    PlotCoords::new(x, y)
}

/// A 12x12 grassland world with one player and no cities.
pub fn open_world() -> FixtureWorld {
    let mut world = FixtureWorld::new(12, 12);
    world.add_player(ALICE);
    world
}

/// A world with ALICE's capital at (5,5), borders covering the full cross.
pub fn world_with_capital() -> FixtureWorld {
    let mut world = open_world();
    world.add_city(CAPITAL, ALICE, p(5, 5), 3);
    world.city_mut(CAPITAL).culture_level = 2;
    world.city_mut(CAPITAL).culture = 150;
    // Claim the whole cross so ring-2 plots are controlled too.
    for coords in empire_advisor::coords::workable_plots(p(5, 5), 2) {
        let plot = world.plot_mut(coords);
        if plot.owner.is_none() {
            plot.owner = Some(ALICE);
        }
    }
    world
}

/// Grant the early tech set most tests assume.
pub fn grant_basic_techs(world: &mut FixtureWorld) {
    world.grant_tech(ALICE, fixture::AGRICULTURE);
    world.grant_tech(ALICE, fixture::MINING);
    world.grant_tech(ALICE, fixture::POTTERY);
}
