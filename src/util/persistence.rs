use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Error as SerdeError;

use crate::domain::{
    app_state::PersistedState,
    entities::{FarmField, User},
};

const APP_QUALIFIER: &str = "in";
const APP_ORG: &str = "Harvtech";
const APP_NAME: &str = "Harvtech";

const SESSION_FILE: &str = "session.json";
const FIELDS_FILE: &str = "fields.json";

fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn load_persisted_state() -> PersistedState {
    match data_dir() {
        Some(dir) => load_from(&dir),
        None => {
            tracing::warn!("no config directory on this platform; starting fresh");
            PersistedState::default()
        }
    }
}

/// Writes the signed-in user and saved fields. A signed-out state deletes the session file.
pub fn save_persisted_state(state: &PersistedState) -> Result<(), PersistSaveError> {
    let dir = data_dir().ok_or(PersistSaveError::StorageUnavailable)?;
    save_to(&dir, state)
}

pub fn load_from(dir: &Path) -> PersistedState {
    PersistedState {
        user: read_json::<User>(&dir.join(SESSION_FILE)),
        fields: read_json::<Vec<FarmField>>(&dir.join(FIELDS_FILE)).unwrap_or_default(),
    }
}

pub fn save_to(dir: &Path, state: &PersistedState) -> Result<(), PersistSaveError> {
    fs::create_dir_all(dir)?;
    let session_path = dir.join(SESSION_FILE);
    match &state.user {
        Some(user) => write_json(&session_path, user)?,
        None => match fs::remove_file(&session_path) {
            Ok(()) => tracing::debug!("session file removed"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        },
    }
    write_json(&dir.join(FIELDS_FILE), &state.fields)?;
    tracing::debug!(fields = state.fields.len(), "state saved");
    Ok(())
}

/// Missing files are silent; unreadable ones are logged and treated as absent.
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "cannot read saved state");
            return None;
        }
    };
    serde_json::from_str(&data)
        .map_err(|error| tracing::warn!(path = %path.display(), %error, "ignoring corrupt saved state"))
        .ok()
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistSaveError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}
