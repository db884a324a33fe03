/// Data model: player profile, world progress, the root aggregate, tabs,
/// and the static shop catalog.

pub mod player;
pub mod shop;
pub mod state;
pub mod tab;
pub mod world;
