/// RouteTabSynchronizer: keeps `activeTab` in line with the location.
///
/// The location is the source of truth, however it changed (shortcut,
/// back/forward, direct entry). Writes only when the derived tab differs,
/// so re-running on an unchanged location is free.

use log::debug;

use crate::domain::tab::{tab_for_path, Tab};
use crate::store::game::GameStateManager;

#[derive(Default)]
pub struct RouteTabSynchronizer;

impl RouteTabSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tab written, or `None` when nothing changed. An unknown
    /// location (`None`) is skipped so it cannot overwrite restored state.
    pub fn sync(&self, location: Option<&str>, game: &mut GameStateManager) -> Option<Tab> {
        let path = location?;
        let derived = tab_for_path(path);
        if game.view().active_tab == derived.id() {
            return None;
        }
        debug!("location {} -> tab {}", path, derived.id());
        game.set_active_tab(derived.id());
        Some(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::store::medium::MemoryMedium;
    use crate::store::persist::{PersistentStateStore, DEFAULT_KEY};

    fn manager(medium: &MemoryMedium) -> GameStateManager {
        GameStateManager::new(PersistentStateStore::new(Box::new(medium.clone()), DEFAULT_KEY))
    }

    fn count_notifications(game: &mut GameStateManager) -> Rc<Cell<usize>> {
        let n = Rc::new(Cell::new(0));
        let c = Rc::clone(&n);
        game.subscribe(move |_| c.set(c.get() + 1));
        n
    }

    #[test]
    fn unchanged_location_does_not_write() {
        let medium = MemoryMedium::new();
        let mut game = manager(&medium);
        let notes = count_notifications(&mut game);
        let sync = RouteTabSynchronizer::new();

        assert_eq!(sync.sync(Some("/overworld"), &mut game), None);
        assert_eq!(sync.sync(Some("/overworld"), &mut game), None);

        assert_eq!(notes.get(), 0);
        assert_eq!(medium.writes(), 0);
    }

    #[test]
    fn location_change_updates_tab_once() {
        let medium = MemoryMedium::new();
        let mut game = manager(&medium);
        let notes = count_notifications(&mut game);
        let sync = RouteTabSynchronizer::new();

        assert_eq!(sync.sync(Some("/rewards"), &mut game), Some(Tab::Rewards));
        assert_eq!(sync.sync(Some("/rewards"), &mut game), None);
        assert_eq!(game.snapshot().active_tab, "rewards");
        assert_eq!(notes.get(), 1);
        assert_eq!(medium.writes(), 1);
    }

    #[test]
    fn unknown_location_never_overwrites_restored_tab() {
        let medium = MemoryMedium::new();
        {
            let mut g = manager(&medium);
            g.set_active_tab("shop");
        }
        let mut game = manager(&medium);
        let sync = RouteTabSynchronizer::new();
        assert_eq!(sync.sync(None, &mut game), None);
        assert_eq!(game.snapshot().active_tab, "shop");
    }

    #[test]
    fn optimistic_tab_agrees_with_location() {
        let medium = MemoryMedium::new();
        let mut game = manager(&medium);
        game.set_active_tab("character");
        let writes = medium.writes();
        let sync = RouteTabSynchronizer::new();
        assert_eq!(sync.sync(Some("/character"), &mut game), None);
        assert_eq!(medium.writes(), writes);
    }

    #[test]
    fn stale_tab_is_corrected_from_location() {
        let medium = MemoryMedium::new();
        let mut game = manager(&medium);
        game.set_active_tab("shop");
        let sync = RouteTabSynchronizer::new();
        assert_eq!(sync.sync(Some("/world/addition"), &mut game), Some(Tab::Play));
        assert_eq!(game.snapshot().active_tab, "play");
    }

    #[test]
    fn same_location_still_rechecks_tab() {
        let medium = MemoryMedium::new();
        let mut game = manager(&medium);
        let sync = RouteTabSynchronizer::new();
        assert_eq!(sync.sync(Some("/rewards"), &mut game), Some(Tab::Rewards));

        // Something else moved the tab while the location stayed put.
        game.set_active_tab("shop");
        assert_eq!(sync.sync(Some("/rewards"), &mut game), Some(Tab::Rewards));
        assert_eq!(game.snapshot().active_tab, "rewards");
    }

    #[test]
    fn unmatched_path_falls_back_to_play() {
        let medium = MemoryMedium::new();
        let mut game = manager(&medium);
        game.set_active_tab("rewards");
        let sync = RouteTabSynchronizer::new();
        assert_eq!(sync.sync(Some("/nowhere"), &mut game), Some(Tab::Play));
    }
}
