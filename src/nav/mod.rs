/// Navigation: the router collaborator, the escape-menu shortcut state
/// machine, and the location → tab synchroniser.

pub mod history;
pub mod shortcut;
pub mod sync;
