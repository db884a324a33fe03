/// ShortcutRouter: the escape-menu state machine.
///
///   MenuClosed --ESC-->            MenuOpen
///   MenuOpen   --ESC-->            MenuClosed   (resume)
///   MenuOpen   --P/R/C/L/S-->      MenuClosed   setActiveTab, navigate
///   anything else                  no transition
///
/// The listener is a shared resource. `attach()` hands out guards and every
/// holder delivers its key events through `handle_key(&guard, ..)`, but only
/// the oldest live guard is bound: the others are ignored until it drops.
/// A second layout mounting the listener therefore cannot make ESC open and
/// immediately close again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crossterm::event::KeyCode;
use log::debug;

use crate::domain::tab::Tab;
use crate::nav::history::Navigator;
use crate::store::game::GameStateManager;
use crate::store::menu::MenuVisibilityStore;

/// What a keypress did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyOutcome {
    Ignored,
    MenuOpened,
    /// Closed without navigating (resume).
    MenuClosed,
    Navigated(Tab),
    /// Shortcut resolved to the page already shown; menu closed only.
    AlreadyThere(Tab),
}

pub const DEFAULT_SHORTCUTS: [(char, Tab); 5] = [
    ('p', Tab::Play),
    ('r', Tab::Rewards),
    ('c', Tab::Character),
    ('l', Tab::Collections),
    ('s', Tab::Shop),
];

/// Live guard ids in attach order. The first one is bound.
type Holders = Rc<RefCell<Vec<u64>>>;

/// One holder's share of the listener. Released on drop.
#[must_use = "the listener detaches when the guard is dropped"]
pub struct ListenerGuard {
    id: u64,
    holders: Holders,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.holders.borrow_mut().retain(|&id| id != self.id);
    }
}

pub struct ShortcutRouter {
    shortcuts: Vec<(char, Tab)>,
    holders: Holders,
    next_id: Cell<u64>,
}

impl ShortcutRouter {
    /// Letters are matched case-insensitively.
    pub fn new(shortcuts: &[(char, Tab)]) -> Self {
        ShortcutRouter {
            shortcuts: shortcuts.iter().map(|&(c, t)| (c.to_ascii_lowercase(), t)).collect(),
            holders: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    pub fn attach(&self) -> ListenerGuard {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        if self.is_attached() {
            debug!("shortcut listener already attached ({} holders), sharing binding", self.holders.borrow().len());
        }
        self.holders.borrow_mut().push(id);
        ListenerGuard { id, holders: Rc::clone(&self.holders) }
    }

    pub fn is_attached(&self) -> bool {
        !self.holders.borrow().is_empty()
    }

    /// True if `guard` belongs to this router and is the one bound.
    fn is_bound(&self, guard: &ListenerGuard) -> bool {
        Rc::ptr_eq(&guard.holders, &self.holders) && self.holders.borrow().first() == Some(&guard.id)
    }

    /// Destination of a shortcut key, if it is one.
    pub fn resolve(&self, key: KeyCode) -> Option<Tab> {
        let ch = match key {
            KeyCode::Char(c) => c.to_ascii_lowercase(),
            _ => return None,
        };
        self.shortcuts.iter().find(|(c, _)| *c == ch).map(|&(_, t)| t)
    }

    /// Letter bound to `tab`, for on-screen hints.
    pub fn key_for(&self, tab: Tab) -> Option<char> {
        self.shortcuts.iter().find(|(_, t)| *t == tab).map(|&(c, _)| c.to_ascii_uppercase())
    }

    /// Run one key through the state machine on behalf of `guard`'s holder.
    pub fn handle_key(
        &self,
        guard: &ListenerGuard,
        key: KeyCode,
        menu: &mut MenuVisibilityStore,
        game: &mut GameStateManager,
        nav: &mut dyn Navigator,
    ) -> KeyOutcome {
        if !self.is_bound(guard) {
            return KeyOutcome::Ignored;
        }

        if !menu.is_open() {
            if key == KeyCode::Esc {
                menu.open();
                return KeyOutcome::MenuOpened;
            }
            return KeyOutcome::Ignored;
        }

        if key == KeyCode::Esc {
            menu.close();
            return KeyOutcome::MenuClosed;
        }

        let tab = match self.resolve(key) {
            Some(tab) => tab,
            None => return KeyOutcome::Ignored,
        };
        go_to(tab, menu, game, nav)
    }
}

/// Point `activeTab` at `tab`, move there unless already shown, close the menu.
pub fn go_to(
    tab: Tab,
    menu: &mut MenuVisibilityStore,
    game: &mut GameStateManager,
    nav: &mut dyn Navigator,
) -> KeyOutcome {
    // Optimistic: the route synchroniser confirms once the location moves.
    game.set_active_tab(tab.id());

    let outcome = if nav.current_location() == Some(tab.path()) {
        KeyOutcome::AlreadyThere(tab)
    } else {
        nav.navigate(tab.path());
        KeyOutcome::Navigated(tab)
    };
    menu.close();
    debug!("go to {:?} -> {:?}", tab, outcome);
    outcome
}

impl Default for ShortcutRouter {
    fn default() -> Self {
        Self::new(&DEFAULT_SHORTCUTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::history::History;
    use crate::store::medium::MemoryMedium;
    use crate::store::persist::{PersistentStateStore, DEFAULT_KEY};

    struct Rig {
        router: ShortcutRouter,
        guard: ListenerGuard,
        menu: MenuVisibilityStore,
        game: GameStateManager,
        nav: RecordingNav,
    }

    /// Navigator that remembers every `navigate` call.
    struct RecordingNav {
        history: History,
        calls: Vec<String>,
    }

    impl Navigator for RecordingNav {
        fn current_location(&self) -> Option<&str> {
            self.history.current_location()
        }
        fn navigate(&mut self, path: &str) {
            self.calls.push(path.to_string());
            self.history.navigate(path);
        }
    }

    fn rig_at(path: &str) -> Rig {
        let store = PersistentStateStore::new(Box::new(MemoryMedium::new()), DEFAULT_KEY);
        let router = ShortcutRouter::default();
        let guard = router.attach();
        Rig {
            router,
            guard,
            menu: MenuVisibilityStore::new(),
            game: GameStateManager::new(store),
            nav: RecordingNav { history: History::starting_at(path), calls: Vec::new() },
        }
    }

    impl Rig {
        fn press(&mut self, key: KeyCode) -> KeyOutcome {
            self.router.handle_key(&self.guard, key, &mut self.menu, &mut self.game, &mut self.nav)
        }

        fn press_via(&mut self, guard: &ListenerGuard, key: KeyCode) -> KeyOutcome {
            self.router.handle_key(guard, key, &mut self.menu, &mut self.game, &mut self.nav)
        }
    }

    #[test]
    fn escape_then_shortcut_then_escape() {
        let mut rig = rig_at("/overworld");
        assert_eq!(rig.game.snapshot().active_tab, "play");

        assert_eq!(rig.press(KeyCode::Esc), KeyOutcome::MenuOpened);
        assert!(rig.menu.is_open());
        assert_eq!(rig.game.snapshot().active_tab, "play");

        assert_eq!(rig.press(KeyCode::Char('r')), KeyOutcome::Navigated(Tab::Rewards));
        assert_eq!(rig.game.snapshot().active_tab, "rewards");
        assert_eq!(rig.nav.calls, vec!["/rewards".to_string()]);
        assert!(!rig.menu.is_open());

        assert_eq!(rig.press(KeyCode::Esc), KeyOutcome::MenuOpened);
        assert!(rig.menu.is_open());
    }

    #[test]
    fn escape_in_open_menu_resumes() {
        let mut rig = rig_at("/overworld");
        rig.press(KeyCode::Esc);
        assert_eq!(rig.press(KeyCode::Esc), KeyOutcome::MenuClosed);
        assert!(!rig.menu.is_open());
        assert!(rig.nav.calls.is_empty());
    }

    #[test]
    fn shortcuts_are_case_insensitive() {
        let mut rig = rig_at("/overworld");
        rig.press(KeyCode::Esc);
        assert_eq!(rig.press(KeyCode::Char('S')), KeyOutcome::Navigated(Tab::Shop));
        rig.press(KeyCode::Esc);
        assert_eq!(rig.press(KeyCode::Char('l')), KeyOutcome::Navigated(Tab::Collections));
        assert_eq!(rig.nav.calls, vec!["/shop".to_string(), "/collections".to_string()]);
    }

    #[test]
    fn every_default_shortcut_reaches_its_route() {
        for (ch, tab) in DEFAULT_SHORTCUTS {
            let mut rig = rig_at("/");
                rig.press(KeyCode::Esc);
            assert_eq!(rig.press(KeyCode::Char(ch)), KeyOutcome::Navigated(tab));
            assert_eq!(rig.nav.current_location(), Some(tab.path()));
            assert_eq!(rig.game.snapshot().active_tab, tab.id());
        }
    }

    #[test]
    fn shortcut_to_current_page_skips_navigation_but_closes() {
        let mut rig = rig_at("/rewards");
        rig.press(KeyCode::Esc);
        assert_eq!(rig.press(KeyCode::Char('r')), KeyOutcome::AlreadyThere(Tab::Rewards));
        assert!(rig.nav.calls.is_empty());
        assert!(!rig.menu.is_open());
        assert_eq!(rig.game.snapshot().active_tab, "rewards");
    }

    #[test]
    fn other_keys_ignored_while_open() {
        let mut rig = rig_at("/overworld");
        rig.press(KeyCode::Esc);
        for key in [KeyCode::Char('x'), KeyCode::Enter, KeyCode::Up, KeyCode::Char('1')] {
            assert_eq!(rig.press(key), KeyOutcome::Ignored);
            assert!(rig.menu.is_open());
        }
        assert!(rig.nav.calls.is_empty());
    }

    #[test]
    fn shortcut_letters_ignored_while_closed() {
        let mut rig = rig_at("/overworld");
        assert_eq!(rig.press(KeyCode::Char('r')), KeyOutcome::Ignored);
        assert!(rig.nav.calls.is_empty());
        assert_eq!(rig.game.snapshot().active_tab, "play");
    }

    #[test]
    fn two_holders_delivering_the_same_press_toggle_once() {
        let mut rig = rig_at("/overworld");
        let second = rig.router.attach();

        let changes = Rc::new(Cell::new(0));
        let c = Rc::clone(&changes);
        rig.menu.subscribe(move |_| c.set(c.get() + 1));

        // Both mounted layouts see the one ESC press.
        assert_eq!(rig.press(KeyCode::Esc), KeyOutcome::MenuOpened);
        assert_eq!(rig.press_via(&second, KeyCode::Esc), KeyOutcome::Ignored);
        assert!(rig.menu.is_open());
        assert_eq!(changes.get(), 1);

        // Same for a shortcut: one navigation, menu stays closed afterwards.
        assert_eq!(rig.press(KeyCode::Char('r')), KeyOutcome::Navigated(Tab::Rewards));
        assert_eq!(rig.press_via(&second, KeyCode::Char('r')), KeyOutcome::Ignored);
        assert_eq!(rig.nav.calls, vec!["/rewards".to_string()]);
        assert!(!rig.menu.is_open());
        assert_eq!(changes.get(), 2);
    }

    #[test]
    fn next_holder_takes_over_when_first_detaches() {
        let mut rig = rig_at("/overworld");
        let second = rig.router.attach();
        let first = std::mem::replace(&mut rig.guard, rig.router.attach());
        drop(first);

        assert_eq!(rig.press(KeyCode::Esc), KeyOutcome::Ignored);
        assert_eq!(rig.press_via(&second, KeyCode::Esc), KeyOutcome::MenuOpened);
        drop(second);
        assert_eq!(rig.press(KeyCode::Esc), KeyOutcome::MenuClosed);
    }

    #[test]
    fn foreign_guard_is_ignored() {
        let mut rig = rig_at("/overworld");
        let other = ShortcutRouter::default();
        let stranger = other.attach();
        assert_eq!(rig.press_via(&stranger, KeyCode::Esc), KeyOutcome::Ignored);
        assert!(!rig.menu.is_open());
    }

    #[test]
    fn listener_stays_while_any_guard_lives() {
        let router = ShortcutRouter::default();
        let a = router.attach();
        let b = router.attach();
        drop(a);
        assert!(router.is_attached());
        drop(b);
        assert!(!router.is_attached());
    }

    #[test]
    fn custom_bindings() {
        let router = ShortcutRouter::new(&[('G', Tab::Play), ('m', Tab::Shop)]);
        assert_eq!(router.resolve(KeyCode::Char('g')), Some(Tab::Play));
        assert_eq!(router.resolve(KeyCode::Char('M')), Some(Tab::Shop));
        assert_eq!(router.resolve(KeyCode::Char('p')), None);
        assert_eq!(router.key_for(Tab::Shop), Some('M'));
        assert_eq!(router.key_for(Tab::Rewards), None);
    }
}
