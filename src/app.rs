/// App: one explicit instance of every store and router for this process.
///
/// Key handling order:
///   1. Ctrl+C quits from anywhere
///   2. ShortcutRouter (escape menu, menu shortcuts)
///   3. menu open  → swallow everything else
///   4. menu closed → the current screen's own keys
///   5. RouteTabSynchronizer against the location the key left behind

use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::info;

use crate::config::AppConfig;
use crate::domain::tab::{self, Tab};
use crate::domain::world;
use crate::nav::history::{History, Navigator};
use crate::nav::shortcut::{self, KeyOutcome, ListenerGuard, ShortcutRouter};
use crate::nav::sync::RouteTabSynchronizer;
use crate::store::game::{GameStateManager, Origin};
use crate::store::menu::MenuVisibilityStore;

/// Completion added by one practice session on a world page.
pub const PRACTICE_STEP: u32 = 10;
pub const PRACTICE_XP: u32 = 5;
pub const WORLD_CLEAR_COINS: u32 = 100;
pub const WORLD_CLEAR_XP: u32 = 50;
pub const DAILY_COINS: u32 = 50;
pub const DAILY_XP: u32 = 20;

const MESSAGE_TICKS: u32 = 40;

/// What the current location shows.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Screen {
    Overworld,
    World(String),
    Rewards,
    Character,
    Collections,
    Shop,
}

impl Screen {
    pub fn at(location: &str) -> Screen {
        if let Some(id) = tab::world_from_path(location) {
            return Screen::World(id.to_string());
        }
        match tab::tab_for_path(location) {
            Tab::Play => Screen::Overworld,
            Tab::Rewards => Screen::Rewards,
            Tab::Character => Screen::Character,
            Tab::Collections => Screen::Collections,
            Tab::Shop => Screen::Shop,
        }
    }
}

/// Things the shell reacts to (sound cues).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AppEvent {
    Menu(KeyOutcome),
    Moved,
    Denied,
    Practiced,
    WorldCleared(String),
    RewardClaimed,
    Quit,
}

pub struct App {
    pub game: GameStateManager,
    pub menu: MenuVisibilityStore,
    pub router: ShortcutRouter,
    pub history: History,
    sync: RouteTabSynchronizer,
    listener: ListenerGuard,
    pub message: String,
    message_timer: u32,
    pub daily_claimed: bool,
    dirty: Rc<Cell<bool>>,
}

impl App {
    pub fn new(mut game: GameStateManager, config: &AppConfig) -> Self {
        let mut menu = MenuVisibilityStore::new();
        let router = ShortcutRouter::new(&config.shortcuts);
        let listener = router.attach();

        // Resume on the tab the last session ended on.
        let start = match (game.origin(), Tab::from_id(&game.view().active_tab)) {
            (Origin::Restored, Some(tab)) => tab.path().to_string(),
            _ => config.start_path.clone(),
        };
        info!("starting at {}", start);

        let dirty = Rc::new(Cell::new(true));
        let d = Rc::clone(&dirty);
        game.subscribe(move |_| d.set(true));
        let d = Rc::clone(&dirty);
        menu.subscribe(move |_| d.set(true));

        let mut app = App {
            game,
            menu,
            router,
            history: History::starting_at(&start),
            sync: RouteTabSynchronizer::new(),
            listener,
            message: String::new(),
            message_timer: 0,
            daily_claimed: false,
            dirty,
        };
        app.sync_route();
        app
    }

    pub fn screen(&self) -> Screen {
        Screen::at(self.history.current_location().unwrap_or("/"))
    }

    /// True once after any state change; the renderer clears it.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
        self.message_timer = MESSAGE_TICKS;
        self.dirty.set(true);
    }

    /// Advance timers by one tick.
    pub fn tick(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
                self.dirty.set(true);
            }
        }
    }

    pub fn handle_key(&mut self, ev: KeyEvent) -> Option<AppEvent> {
        if ev.modifiers.contains(KeyModifiers::CONTROL) && matches!(ev.code, KeyCode::Char('c' | 'C')) {
            return Some(AppEvent::Quit);
        }
        if ev.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }

        let outcome =
            self.router.handle_key(&self.listener, ev.code, &mut self.menu, &mut self.game, &mut self.history);
        let event = if outcome != KeyOutcome::Ignored {
            Some(AppEvent::Menu(outcome))
        } else if self.menu.is_open() {
            None
        } else {
            self.handle_screen_key(ev.code)
        };

        self.sync_route();
        event
    }

    /// Jump straight to a tab (pad tab buttons). Works with the menu open or
    /// closed and never goes through screen keys.
    pub fn go_to(&mut self, tab: Tab) -> AppEvent {
        let outcome = shortcut::go_to(tab, &mut self.menu, &mut self.game, &mut self.history);
        self.sync_route();
        AppEvent::Menu(outcome)
    }

    fn sync_route(&mut self) {
        self.sync.sync(self.history.current_location(), &mut self.game);
    }

    // ── Screen keys (menu closed) ──

    fn handle_screen_key(&mut self, key: KeyCode) -> Option<AppEvent> {
        match key {
            KeyCode::Char('[') | KeyCode::Backspace => {
                return self.history.back().then_some(AppEvent::Moved);
            }
            KeyCode::Char(']') => {
                return self.history.forward().then_some(AppEvent::Moved);
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => return Some(AppEvent::Quit),
            _ => {}
        }

        match self.screen() {
            Screen::Overworld => self.overworld_key(key),
            Screen::World(id) => self.world_key(&id, key),
            Screen::Rewards => self.rewards_key(key),
            Screen::Character | Screen::Collections | Screen::Shop => None,
        }
    }

    fn overworld_key(&mut self, key: KeyCode) -> Option<AppEvent> {
        let ids = world::WORLD_IDS;
        let current = self.game.view().active_world.as_deref()
            .and_then(|id| ids.iter().position(|w| *w == id));

        match key {
            KeyCode::Up => {
                let next = current.map_or(0, |i| i.saturating_sub(1));
                self.game.set_active_world(Some(ids[next]));
                Some(AppEvent::Moved)
            }
            KeyCode::Down => {
                let next = current.map_or(0, |i| (i + 1).min(ids.len() - 1));
                self.game.set_active_world(Some(ids[next]));
                Some(AppEvent::Moved)
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let id = ids[current?];
                let unlocked = self.game.view().world(id).map_or(false, |w| w.is_unlocked);
                if unlocked {
                    self.history.navigate(&tab::world_path(id));
                    Some(AppEvent::Moved)
                } else {
                    self.set_message("Locked: clear the previous world first");
                    Some(AppEvent::Denied)
                }
            }
            _ => None,
        }
    }

    fn world_key(&mut self, id: &str, key: KeyCode) -> Option<AppEvent> {
        if !matches!(key, KeyCode::Char(' ') | KeyCode::Enter) {
            return None;
        }
        let w = match self.game.view().world(id) {
            Some(w) => w.clone(),
            None => {
                self.set_message("Unknown world");
                return Some(AppEvent::Denied);
            }
        };
        if !w.is_unlocked {
            self.set_message("Locked: clear the previous world first");
            return Some(AppEvent::Denied);
        }
        if w.is_complete() {
            self.set_message("World already cleared");
            return Some(AppEvent::Denied);
        }

        let completion = (w.completion_percentage + PRACTICE_STEP).min(100);
        self.game.update_world_progress(id, completion);
        self.game.grant_xp(PRACTICE_XP);

        if completion < 100 {
            return Some(AppEvent::Practiced);
        }

        self.game.grant_coins(WORLD_CLEAR_COINS);
        self.game.grant_xp(WORLD_CLEAR_XP);
        match world::next_after(id) {
            Some(next) => {
                self.game.unlock_world(next);
                let title = self.game.view().world(next).map(|n| n.title.clone()).unwrap_or_default();
                self.set_message(&format!("World cleared! {} unlocked", title));
            }
            None => self.set_message("Every world cleared!"),
        }
        Some(AppEvent::WorldCleared(id.to_string()))
    }

    fn rewards_key(&mut self, key: KeyCode) -> Option<AppEvent> {
        if key != KeyCode::Enter {
            return None;
        }
        if self.daily_claimed {
            self.set_message("Daily reward already claimed");
            return Some(AppEvent::Denied);
        }
        self.daily_claimed = true;
        self.game.grant_coins(DAILY_COINS);
        self.game.grant_xp(DAILY_XP);
        self.set_message(&format!("+{} coins  +{} XP", DAILY_COINS, DAILY_XP));
        Some(AppEvent::RewardClaimed)
    }
}
