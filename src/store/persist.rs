/// PersistentStateStore: the aggregate as one JSON record under one key.
///
/// ## Contract
///   - `load` never fails past this boundary. A record that does not parse,
///     or parses into a state violating the data-model invariants, is
///     reported as `Corrupt` and removed, so the next `load` sees `NotFound`.
///     If the medium refuses the removal, the rejected record is remembered
///     and skipped, so repeated loads still settle on `NotFound`.
///   - `save` always writes the whole aggregate (no merging). A failed write
///     is returned and logged; the caller's in-memory state stays valid.

use log::{debug, warn};

use crate::domain::state::{GameState, InvalidState};
use crate::store::medium::{StorageError, StorageMedium};

pub const DEFAULT_KEY: &str = "game_state";

#[derive(Debug, PartialEq)]
pub enum LoadOutcome {
    Loaded(GameState),
    NotFound,
    Corrupt,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("could not encode game state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, thiserror::Error)]
enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid state: {0}")]
    Invalid(#[from] InvalidState),
}

pub struct PersistentStateStore {
    medium: Box<dyn StorageMedium>,
    key: String,
    rejected: Option<String>,
}

impl PersistentStateStore {
    pub fn new(medium: Box<dyn StorageMedium>, key: impl Into<String>) -> Self {
        PersistentStateStore { medium, key: key.into(), rejected: None }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&mut self) -> LoadOutcome {
        let raw = match self.medium.get(&self.key) {
            Some(raw) => raw,
            None => {
                debug!("no saved state under `{}`", self.key);
                return LoadOutcome::NotFound;
            }
        };

        if self.rejected.as_deref() == Some(raw.as_str()) {
            debug!("skipping previously rejected record under `{}`", self.key);
            return LoadOutcome::NotFound;
        }

        match decode(&raw) {
            Ok(state) => LoadOutcome::Loaded(state),
            Err(e) => {
                warn!("discarding saved state under `{}`: {}", self.key, e);
                if let Err(e) = self.medium.remove(&self.key) {
                    warn!("could not remove corrupt record `{}`: {}", self.key, e);
                    self.rejected = Some(raw);
                }
                LoadOutcome::Corrupt
            }
        }
    }

    pub fn save(&mut self, state: &GameState) -> Result<(), PersistError> {
        let encoded = serde_json::to_string(state)?;
        self.medium.set(&self.key, &encoded).map_err(|e| {
            warn!("saving state under `{}` failed: {}", self.key, e);
            PersistError::from(e)
        })?;
        self.rejected = None;
        Ok(())
    }
}

fn decode(raw: &str) -> Result<GameState, DecodeError> {
    let state: GameState = serde_json::from_str(raw)?;
    state.validate()?;
    Ok(state)
}
