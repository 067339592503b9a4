//! Economic and expansion planning for a closed turn-based strategy engine.
//!
//! The crate reads game state through the [`host::GameView`] trait and
//! returns every mutation as a [`host::HostCommand`], so the decision
//! layers run and test without the engine present. [`player::Player`] is
//! the integration surface: the embedding glue forwards host callbacks in
//! and drains the command buffer out each turn.

pub mod area;
pub mod city_data;
pub mod city_optimiser;
pub mod city_simulation;
pub mod constants;
pub mod construct_item;
pub mod coords;
pub mod dot_map;
pub mod error;
pub mod events;
pub mod fixture;
pub mod host;
pub mod info;
pub mod map_analysis;
pub mod output;
pub mod player;
pub mod plot_info;
pub mod rules;
pub mod settler;
pub mod shared_plots;
pub mod tactics;
