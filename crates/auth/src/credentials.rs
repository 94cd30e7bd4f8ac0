use crate::error::{AuthError, Result};
use crate::password::PasswordHash;
use cmc_protocol::Role;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Default location of the credential file.
pub const DEFAULT_USERS_PATH: &str = "users.yaml";

/// Who a successful login belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: BTreeMap<String, CredentialEntry>,
}

#[derive(Debug, Deserialize)]
struct CredentialEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    display_name: String,
    role: Role,
    hash: PasswordHash,
}

/// Username → credentials, loaded once and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, StoredUser>,
}

impl CredentialStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_yaml(&text)?;
        log::info!("Loaded {} users from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: CredentialFile = serde_yaml::from_str(text)?;
        let mut users = HashMap::with_capacity(file.users.len());

        for (username, entry) in file.users {
            let hash = match (entry.password_hash, entry.password) {
                (Some(encoded), _) => {
                    PasswordHash::parse(&encoded).map_err(|reason| AuthError::InvalidHash {
                        user: username.clone(),
                        reason,
                    })?
                }
                (None, Some(plaintext)) => {
                    log::warn!(
                        "User '{username}' has a plaintext password; replace it with a password_hash (cmc hash-password)"
                    );
                    PasswordHash::new(&plaintext)
                }
                (None, None) => return Err(AuthError::MissingPassword(username)),
            };
            let display_name = entry.name.unwrap_or_else(|| username.clone());
            users.insert(
                username,
                StoredUser {
                    display_name,
                    role: entry.role,
                    hash,
                },
            );
        }

        Ok(Self { users })
    }

    /// Unknown usernames and wrong passwords are indistinguishable to callers.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Identity> {
        let user = self.users.get(username)?;
        if !user.hash.verify(password) {
            return None;
        }
        Some(Identity {
            username: username.to_string(),
            display_name: user.display_name.clone(),
            role: user.role,
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
