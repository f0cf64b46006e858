//! Unique test identities.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Account role, sent as `roleName` on signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Client,
    Dj,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Dj => "DJ",
        }
    }

    fn email_prefix(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Dj => "dj",
        }
    }

    fn username_prefix(&self) -> &'static str {
        match self {
            Role::Client => "musiclover",
            Role::Dj => "djmaster",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for one generated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Identity {
    pub fn signup_body(&self) -> Value {
        json!({
            "emailAddress": self.email,
            "username": self.username,
            "password": self.password,
            "roleName": self.role.as_str(),
        })
    }

    pub fn login_body(&self) -> Value {
        json!({
            "emailAddress": self.email,
            "password": self.password,
        })
    }

    /// Context slot value, so templates can read `{{client.email}}`.
    pub fn slot_value(&self) -> Value {
        json!({
            "email": self.email,
            "username": self.username,
            "password": self.password,
            "role": self.role.as_str(),
        })
    }
}

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    /// Keeps seeds from two processes started in the same millisecond apart.
    static ref PROCESS_TAG: String = Uuid::new_v4().simple().to_string()[..8].to_string();
}

/// Generates identities that never collide within a process, and are
/// unlikely to collide with earlier runs against the same backend.
#[derive(Debug, Clone)]
pub struct IdentityFactory {
    password: String,
    email_domain: String,
}

impl IdentityFactory {
    pub fn new(password: impl Into<String>, email_domain: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            email_domain: email_domain.into(),
        }
    }

    /// Current time in milliseconds, then a random per-process tag, then a
    /// process-wide counter.
    pub fn next_seed() -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}{}{:03}", millis, *PROCESS_TAG, n)
    }

    pub fn identity(&self, role: Role) -> Identity {
        let seed = Self::next_seed();
        Identity {
            email: format!("{}{}@{}", role.email_prefix(), seed, self.email_domain),
            username: format!("{}{}", role.username_prefix(), seed),
            password: self.password.clone(),
            role,
        }
    }

    /// An address nobody signed up with.
    pub fn unknown_email(&self) -> String {
        format!("nonexistent{}@{}", Self::next_seed(), self.email_domain)
    }
}

impl Default for IdentityFactory {
    fn default() -> Self {
        Self::new("password123", "spinwish.com")
    }
}
