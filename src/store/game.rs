/// GameStateManager: the single owner of the in-memory aggregate.
///
/// Every mutation follows the same three steps:
///   1. apply a pure transformation to the aggregate
///   2. persist the whole aggregate (best-effort)
///   3. notify subscribers synchronously with the new snapshot
///
/// Operations on an unknown world id skip all three steps.

use log::{debug, info};

use crate::domain::state::GameState;
use crate::domain::world::WorldProgress;
use crate::store::observer::{SubscriptionId, Subscribers};
use crate::store::persist::{LoadOutcome, PersistentStateStore};

/// Where the initial aggregate came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Origin {
    Restored,
    Fresh,
    Recovered,
}

pub struct GameStateManager {
    state: GameState,
    store: PersistentStateStore,
    subscribers: Subscribers<GameState>,
    origin: Origin,
    last_persist_error: Option<String>,
}

impl GameStateManager {
    pub fn new(mut store: PersistentStateStore) -> Self {
        let (state, origin) = match store.load() {
            LoadOutcome::Loaded(state) => (state, Origin::Restored),
            LoadOutcome::NotFound => (GameState::default(), Origin::Fresh),
            LoadOutcome::Corrupt => (GameState::default(), Origin::Recovered),
        };
        info!("game state `{}` initialised ({:?})", store.key(), origin);

        GameStateManager {
            state,
            store,
            subscribers: Subscribers::new(),
            origin,
            last_persist_error: None,
        }
    }

    // ── Read interface ──

    /// An owned copy; changing it does not affect the store.
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// Borrowed view for reads inside a single call (key handling).
    pub fn view(&self) -> &GameState {
        &self.state
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&GameState) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The most recent write failure, cleared by the next successful write.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    // ── Mutations ──

    pub fn set_active_tab(&mut self, tab: &str) {
        self.commit(|s| s.active_tab = tab.to_string());
    }

    pub fn set_active_world(&mut self, world_id: Option<&str>) {
        self.commit(|s| s.active_world = world_id.map(str::to_string));
    }

    /// Monotonic: an unlocked world stays unlocked.
    pub fn unlock_world(&mut self, world_id: &str) {
        self.update_world(world_id, WorldProgress::unlocked);
    }

    /// `completion` is clamped to 0-100.
    pub fn update_world_progress(&mut self, world_id: &str, completion: u32) {
        self.update_world(world_id, |w| w.with_completion(completion));
    }

    pub fn grant_coins(&mut self, amount: u32) {
        self.commit(|s| s.player_stats = s.player_stats.with_coins(amount));
    }

    pub fn grant_xp(&mut self, points: u32) {
        self.commit(|s| s.player_stats = s.player_stats.with_xp(points));
    }

    // ── Internal ──

    fn update_world(&mut self, world_id: &str, f: impl FnOnce(&WorldProgress) -> WorldProgress) {
        let updated = match self.state.worlds.get(world_id) {
            Some(w) => f(w),
            None => {
                debug!("ignoring update for unknown world `{}`", world_id);
                return;
            }
        };
        self.commit(|s| {
            s.worlds.insert(world_id.to_string(), updated);
        });
    }

    fn commit(&mut self, apply: impl FnOnce(&mut GameState)) {
        apply(&mut self.state);
        self.persist();
        self.subscribers.notify(&self.state);
    }

    fn persist(&mut self) {
        match self.store.save(&self.state) {
            Ok(()) => self.last_persist_error = None,
            Err(e) => self.last_persist_error = Some(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::domain::world::{activities_for, WORLD_IDS};
    use crate::store::medium::MemoryMedium;
    use crate::store::persist::DEFAULT_KEY;

    fn manager_over(medium: &MemoryMedium) -> GameStateManager {
        GameStateManager::new(PersistentStateStore::new(Box::new(medium.clone()), DEFAULT_KEY))
    }

    /// Records every snapshot delivered to a subscriber.
    fn record(m: &mut GameStateManager) -> Rc<RefCell<Vec<GameState>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        m.subscribe(move |s| sink.borrow_mut().push(s.clone()));
        seen
    }

    #[test]
    fn starts_from_default_when_nothing_saved() {
        let medium = MemoryMedium::new();
        let m = manager_over(&medium);
        assert_eq!(m.snapshot(), GameState::default());
        assert_eq!(m.origin(), Origin::Fresh);
        assert_eq!(medium.writes(), 0);
    }

    #[test]
    fn starts_from_default_when_saved_state_is_corrupt() {
        let medium = MemoryMedium::new().with_record(DEFAULT_KEY, "]]");
        let m = manager_over(&medium);
        assert_eq!(m.snapshot(), GameState::default());
        assert_eq!(m.origin(), Origin::Recovered);
        assert_eq!(medium.raw(DEFAULT_KEY), None);
    }

    #[test]
    fn restores_previous_session() {
        let medium = MemoryMedium::new();
        {
            let mut m = manager_over(&medium);
            m.set_active_tab("collections");
            m.unlock_world("division");
        }
        let m = manager_over(&medium);
        assert_eq!(m.origin(), Origin::Restored);
        let s = m.snapshot();
        assert_eq!(s.active_tab, "collections");
        assert!(s.worlds["division"].is_unlocked);
    }

    #[test]
    fn snapshot_is_detached() {
        let medium = MemoryMedium::new();
        let m = manager_over(&medium);
        let mut s = m.snapshot();
        s.active_tab = "hacked".into();
        s.player_stats.coins = 0;
        assert_eq!(m.snapshot(), GameState::default());
    }

    #[test]
    fn each_mutation_persists_and_notifies_once() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        let seen = record(&mut m);

        m.set_active_tab("rewards");
        m.set_active_world(Some("addition"));
        m.unlock_world("multiplication");
        m.update_world_progress("subtraction", 50);

        assert_eq!(medium.writes(), 4);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].active_tab, "rewards");
        assert_eq!(seen[1].active_world.as_deref(), Some("addition"));
        assert!(seen[2].worlds["multiplication"].is_unlocked);
        assert_eq!(seen[3], m.snapshot());
    }

    #[test]
    fn set_active_tab_accepts_any_string() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        m.set_active_tab("not-a-real-tab");
        assert_eq!(m.snapshot().active_tab, "not-a-real-tab");
    }

    #[test]
    fn set_active_world_can_clear() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        m.set_active_world(Some("division"));
        m.set_active_world(None);
        assert_eq!(m.snapshot().active_world, None);
    }

    #[test]
    fn progress_invariant_holds_for_every_world_and_value() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        for id in WORLD_IDS {
            for completion in 0..=100 {
                m.update_world_progress(id, completion);
                let w = m.snapshot().worlds[id].clone();
                assert_eq!(w.completion_percentage, completion);
                assert_eq!(w.activities_completed, activities_for(completion, w.total_activities));
                // Same as f64 round-half-up.
                let exact = completion as f64 / 100.0 * w.total_activities as f64;
                assert_eq!(w.activities_completed, (exact + 0.5).floor() as u32);
            }
        }
    }

    #[test]
    fn progress_does_not_touch_other_fields() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        let before = m.snapshot().worlds["multiplication"].clone();
        m.update_world_progress("multiplication", 50);
        let after = m.snapshot().worlds["multiplication"].clone();
        assert_eq!(after.id, before.id);
        assert_eq!(after.title, before.title);
        assert_eq!(after.is_unlocked, before.is_unlocked);
        assert_eq!(after.total_activities, before.total_activities);
        assert_eq!(after.activities_completed, 12);
    }

    #[test]
    fn unlock_is_monotonic() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        m.unlock_world("division");
        let first = m.snapshot().worlds["division"].clone();
        assert!(first.is_unlocked);
        m.unlock_world("division");
        let second = m.snapshot().worlds["division"].clone();
        assert_eq!(first, second);
    }

    #[test]
    fn unlocking_an_unlocked_world_changes_nothing_else() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        let before = m.snapshot();
        m.unlock_world("addition");
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn unknown_world_is_a_silent_no_op() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        let seen = record(&mut m);
        let before = serde_json::to_string(&m.snapshot()).unwrap();

        m.unlock_world("nonexistent");
        m.update_world_progress("nonexistent", 50);

        assert_eq!(serde_json::to_string(&m.snapshot()).unwrap(), before);
        assert_eq!(medium.writes(), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn write_failure_keeps_memory_state_and_still_notifies() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        let seen = record(&mut m);
        medium.set_quota(Some(8));

        m.set_active_tab("shop");

        assert_eq!(m.snapshot().active_tab, "shop");
        assert_eq!(seen.borrow().len(), 1);
        assert!(m.last_persist_error().is_some());
        assert_eq!(medium.raw(DEFAULT_KEY), None);

        // A later write may succeed on its own.
        medium.set_quota(None);
        m.set_active_tab("play");
        assert!(m.last_persist_error().is_none());
        assert!(medium.raw(DEFAULT_KEY).is_some());
    }

    #[test]
    fn unsubscribed_callback_is_not_called() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        let id = m.subscribe(move |_| *h.borrow_mut() += 1);
        m.set_active_tab("shop");
        assert!(m.unsubscribe(id));
        m.set_active_tab("play");
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn rewards_update_player_stats() {
        let medium = MemoryMedium::new();
        let mut m = manager_over(&medium);
        m.grant_coins(50);
        m.grant_xp(70);
        let p = m.snapshot().player_stats;
        assert_eq!(p.coins, 300);
        assert_eq!(p.level, 4);
        assert_eq!(p.xp_progress, 10);
        assert_eq!(medium.writes(), 2);
    }
}
