use crate::api::StoryService;
use crate::error::StoreError;
use crate::user::User;
use crate::util::paths;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

const TOKEN_KEY: &str = "token";
const USERNAME_KEY: &str = "username";

/// Minimal string key-value storage for credentials.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;

    /// Write several keys; on failure none of them change.
    fn set_all(&mut self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        let previous: Vec<(&str, Option<String>)> =
            pairs.iter().map(|(k, _)| (*k, self.get(k))).collect();
        for (k, v) in pairs {
            if let Err(e) = self.set(k, v) {
                for (k, old) in &previous {
                    let _ = match old {
                        Some(old) => self.set(k, old),
                        None => self.remove(k),
                    };
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk. Every write rewrites the whole file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file reads as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();
        FileStore { path, entries }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    // Owner-only on unix: the file holds a login token.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            opts.mode(0o600);
            let mut file = opts.open(&self.path)?;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
            file.write_all(json.as_bytes())?;
        }
        #[cfg(not(unix))]
        opts.open(&self.path)?.write_all(json.as_bytes())?;
        Ok(())
    }

    // Persist a modified copy, then adopt it; a failed write leaves memory as it was.
    fn update<F>(&mut self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut next = self.entries.clone();
        change(&mut next);
        self.save(&next)?;
        self.entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|m| {
            m.insert(key.to_string(), value.to_string());
        })
    }

    fn set_all(&mut self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(|m| {
            for (k, v) in pairs {
                m.insert(k.to_string(), v.to_string());
            }
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.update(|m| {
            m.remove(key);
        })
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.entries.clear();
        Ok(())
    }
}

/// Default location of the session file under the user's config directory.
pub fn default_session_path() -> Option<PathBuf> {
    paths::config_file("session.json")
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated { token: String, username: String },
}

/// Tracks who is logged in and keeps the credentials in a `KeyValueStore`.
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
    state: SessionState,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        SessionStore { store, state: SessionState::Anonymous }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Log back in with persisted credentials, if any. Never fails; a stale or
    /// missing credential leaves the session anonymous and the store as is.
    pub async fn restore(&mut self, service: &dyn StoryService) -> Option<User> {
        let (Some(token), Some(username)) = (self.store.get(TOKEN_KEY), self.store.get(USERNAME_KEY)) else {
            log::debug!("no stored credentials");
            return None;
        };
        let user = User::restore_session(service, &token, &username).await?;
        self.state = SessionState::Authenticated {
            token: user.login_token().to_string(),
            username: user.username().to_string(),
        };
        Some(user)
    }

    /// Remember a freshly logged-in or signed-up user.
    pub fn sign_in(&mut self, user: &User) -> Result<(), StoreError> {
        self.store
            .set_all(&[(TOKEN_KEY, user.login_token()), (USERNAME_KEY, user.username())])?;
        self.state = SessionState::Authenticated {
            token: user.login_token().to_string(),
            username: user.username().to_string(),
        };
        Ok(())
    }

    /// Forget the credentials. Callers drop their `User` and `StoryList` too.
    pub fn logout(&mut self) -> Result<(), StoreError> {
        self.store.clear()?;
        self.state = SessionState::Anonymous;
        Ok(())
    }
}
