use crate::credentials::Identity;
use crate::error::{AuthError, Result};
use crate::password::hex_encode_lower;
use cmc_protocol::Role;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

const TOKEN_BYTES: usize = 32;

/// Sessions unused for this long are discarded.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(8 * 60 * 60);

/// A screen of the workbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Query,
    Ingest,
    KnowledgeBase,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Ingest => "ingest",
            Self::KnowledgeBase => "knowledge_base",
        }
    }
}

impl std::str::FromStr for View {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "query" => Ok(Self::Query),
            "ingest" => Ok(Self::Ingest),
            "knowledge_base" => Ok(Self::KnowledgeBase),
            other => Err(AuthError::UnknownView(other.to_string())),
        }
    }
}

const ADMIN_VIEWS: &[View] = &[View::Query, View::Ingest, View::KnowledgeBase];
const USER_VIEWS: &[View] = &[View::Query];

/// Views a role may navigate to, in menu order. The first one is the landing view.
pub fn available_views(role: Role) -> &'static [View] {
    match role {
        Role::Admin => ADMIN_VIEWS,
        Role::User => USER_VIEWS,
    }
}

/// Everything the HTTP layer knows about a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub view: View,
}

impl SessionContext {
    pub fn views(&self) -> &'static [View] {
        available_views(self.role)
    }

    pub fn can_access(&self, view: View) -> bool {
        self.views().contains(&view)
    }
}

#[derive(Debug)]
struct SessionEntry {
    context: SessionContext,
    last_seen: Instant,
}

/// Live sessions keyed by bearer token.
///
/// A session expires after `idle_timeout` without use. Expired sessions are
/// dropped when touched and swept on every login, so the map only holds
/// sessions that are still usable.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_SESSION_IDLE_TIMEOUT)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn login(&self, identity: Identity) -> SessionContext {
        let token = new_token();
        let context = SessionContext {
            token: token.clone(),
            username: identity.username,
            display_name: identity.display_name,
            role: identity.role,
            view: available_views(identity.role)[0],
        };

        let mut sessions = self.lock();
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let swept = before - sessions.len();
        if swept > 0 {
            log::debug!("swept {swept} expired sessions");
        }
        sessions.insert(
            token,
            SessionEntry {
                context: context.clone(),
                last_seen: now,
            },
        );
        context
    }

    /// The live session for `token`, refreshing its idle clock.
    pub fn resolve(&self, token: &str) -> Option<SessionContext> {
        let mut sessions = self.lock();
        let entry = self.touch(&mut sessions, token)?;
        Some(entry.context.clone())
    }

    /// Returns whether a session was removed.
    pub fn logout(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Move a session to another view. `Ok(None)` means the token is unknown
    /// or expired.
    pub fn switch_view(&self, token: &str, view: View) -> Result<Option<SessionContext>> {
        let mut sessions = self.lock();
        let Some(entry) = self.touch(&mut sessions, token) else {
            return Ok(None);
        };
        if !entry.context.can_access(view) {
            return Err(AuthError::ViewNotAllowed(view.as_str().to_string()));
        }
        entry.context.view = view;
        Ok(Some(entry.context.clone()))
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<String, SessionEntry>,
        token: &str,
    ) -> Option<&'a mut SessionEntry> {
        let now = Instant::now();
        if sessions
            .get(token)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            sessions.remove(token);
            return None;
        }
        let entry = sessions.get_mut(token)?;
        entry.last_seen = now;
        Some(entry)
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_seen) >= self.idle_timeout
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex_encode_lower(&bytes)
}
