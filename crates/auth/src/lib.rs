//! Login for the workbench: a YAML credential store with salted, iterated
//! SHA-256 password hashes, and an in-memory registry of bearer-token
//! sessions that remembers each user's role and current view.
//!
//! ```no_run
//! use cmc_auth::{CredentialStore, SessionRegistry};
//!
//! let store = CredentialStore::load("users.yaml")?;
//! let sessions = SessionRegistry::new();
//! if let Some(identity) = store.authenticate("alice", "wonderland") {
//!     let session = sessions.login(identity);
//!     println!("token {}", session.token);
//! }
//! # Ok::<(), cmc_auth::AuthError>(())
//! ```

mod credentials;
mod error;
mod password;
mod session;

pub use credentials::{CredentialStore, Identity, DEFAULT_USERS_PATH};
pub use error::{AuthError, Result};
pub use password::{hash_password, verify_password, PasswordHash, DEFAULT_ROUNDS, HASH_SCHEME};
pub use session::{
    available_views, SessionContext, SessionRegistry, View, DEFAULT_SESSION_IDLE_TIMEOUT,
};
