/// State stores: persistence medium, the persisted game aggregate, and the
/// escape-menu visibility flag.

pub mod game;
pub mod medium;
pub mod menu;
pub mod observer;
pub mod persist;
