//! Durable per-user session records.
//!
//! The store holds only what survives a restart: the state tag, the wallet
//! address, and the preferred threshold. Watch handles are runtime-only,
//! so a record persisted while tracking is normalized back to `Menu` on
//! load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::{fs, io};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::state::clamp_threshold;
use crate::engine::{Session, SessionState, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub state: SessionState,
    pub wallet: Option<String>,
    pub threshold: u32,
}

impl SessionRecord {
    pub fn from_session(session: &Session) -> Self {
        Self {
            state: session.state,
            wallet: session.wallet.clone(),
            threshold: session.threshold,
        }
    }

    /// Rebuild a live session. A watch never survives a restart, so a
    /// `Tracking` record comes back as `Menu`.
    pub fn into_session(self) -> Session {
        let state = match self.state {
            SessionState::Tracking => SessionState::Menu,
            other => other,
        };
        Session {
            state,
            wallet: self.wallet,
            threshold: clamp_threshold(self.threshold),
            watch_seq: 0,
        }
    }
}

pub trait SessionStore: Send + Sync {
    fn get(&self, user: UserId) -> Option<SessionRecord>;
    fn set(&self, user: UserId, record: SessionRecord) -> Result<()>;
    fn reset(&self, user: UserId) -> Result<()>;
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn get(&self, user: UserId) -> Option<SessionRecord> {
        (**self).get(user)
    }

    fn set(&self, user: UserId, record: SessionRecord) -> Result<()> {
        (**self).set(user, record)
    }

    fn reset(&self, user: UserId) -> Result<()> {
        (**self).reset(user)
    }
}

/// Volatile store for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<UserId, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, user: UserId) -> Option<SessionRecord> {
        self.records.lock().unwrap().get(&user).cloned()
    }

    fn set(&self, user: UserId, record: SessionRecord) -> Result<()> {
        self.records.lock().unwrap().insert(user, record);
        Ok(())
    }

    fn reset(&self, user: UserId) -> Result<()> {
        self.records.lock().unwrap().remove(&user);
        Ok(())
    }
}

/// One JSON file holding all session records, rewritten on every change.
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<HashMap<UserId, SessionRecord>>,
}

impl JsonFileStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match fs::read_to_string(&path) {
            Ok(raw) => {
                let by_key: HashMap<String, SessionRecord> = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing session store {:?}", path))?;
                by_key
                    .into_iter()
                    .filter_map(|(key, record)| {
                        key.parse::<u64>().ok().map(|id| (UserId(id), record))
                    })
                    .collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("[STORE] no session file at {:?}, starting empty", path);
                HashMap::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading session store {:?}", path))
            }
        };
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn save(&self, records: &HashMap<UserId, SessionRecord>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating store directory {:?}", dir))?;
            }
        }
        let by_key: HashMap<String, &SessionRecord> = records
            .iter()
            .map(|(user, record)| (user.0.to_string(), record))
            .collect();
        let raw = serde_json::to_string_pretty(&by_key)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing session store {:?}", self.path))
    }
}

impl SessionStore for JsonFileStore {
    fn get(&self, user: UserId) -> Option<SessionRecord> {
        self.records.lock().unwrap().get(&user).cloned()
    }

    fn set(&self, user: UserId, record: SessionRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(user, record);
        self.save(&records)
    }

    fn reset(&self, user: UserId) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.remove(&user);
        self.save(&records)
    }
}
