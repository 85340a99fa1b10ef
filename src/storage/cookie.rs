//! Cookie-jar slot store.
//!
//! Models a browser cookie jar shared by every context of a page group: each
//! slot is a cookie `name=value` scoped by path, with the value
//! percent-encoded and an expiry `expires` days after the last write. Clones
//! share one jar.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::trace;

use crate::core::{Store, StoreError, StoreResult, MAX_COOKIE_SIZE};
use crate::sync::Settings;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Jar shared by every default-configured context in the process.
static SHARED_JAR: LazyLock<CookieStore> = LazyLock::new(CookieStore::new);

#[derive(Debug, Clone)]
struct Cookie {
    /// Percent-encoded value
    value: String,
    /// `None` for a session cookie
    expires: Option<DateTime<Utc>>,
}

impl Cookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}

/// Shared cookie-jar [`Store`]; the default store of [`Settings`].
///
/// An `expires` of `0` writes a session cookie that never expires while the
/// jar lives.
#[derive(Clone)]
pub struct CookieStore {
    /// Cookies keyed by (name, path)
    jar: Arc<Mutex<HashMap<(String, String), Cookie>>>,
    clock: Clock,
}

impl CookieStore {
    /// Create an empty jar using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Handle to the process-wide jar used by default [`Settings`].
    pub fn shared() -> Self {
        SHARED_JAR.clone()
    }

    /// Create an empty jar with a custom clock.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            jar: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(clock),
        }
    }

    /// Number of live cookies in the jar.
    pub fn len(&self) -> usize {
        let now = (self.clock)();
        let mut jar = self.jar.lock();
        jar.retain(|_, cookie| !cookie.is_expired(now));
        jar.len()
    }

    /// True if the jar holds no live cookies.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the `Set-Cookie` header a write of `blob` would produce.
    pub fn set_cookie_header(&self, settings: &Settings, blob: &str) -> String {
        let mut header = format!("{}={}", settings.name(), urlencoding::encode(blob));
        if let Some(expires) = self.expiry_for(settings) {
            header.push_str("; expires=");
            header.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        }
        header.push_str("; path=");
        header.push_str(settings.path());
        header
    }

    fn expiry_for(&self, settings: &Settings) -> Option<DateTime<Utc>> {
        if settings.expires() == 0 {
            return None;
        }
        let now = (self.clock)();
        Some(now + TimeDelta::days(i64::from(settings.expires())))
    }
}

impl Default for CookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieStore")
            .field("cookies", &self.jar.lock().len())
            .finish()
    }
}

/// Cookie path-match: a cookie set at `cookie_path` is sent for `request_path`.
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

impl Store for CookieStore {
    fn backend_name(&self) -> &'static str {
        "cookie"
    }

    fn get(&self, settings: &Settings) -> StoreResult<Option<String>> {
        let now = (self.clock)();
        let mut jar = self.jar.lock();
        jar.retain(|_, cookie| !cookie.is_expired(now));

        // The most specific path wins, as in a browser's cookie ordering.
        let found = jar
            .iter()
            .filter(|((name, path), _)| name == settings.name() && path_matches(path, settings.path()))
            .max_by_key(|((_, path), _)| path.len())
            .map(|(_, cookie)| cookie.value.clone());

        match found {
            Some(encoded) => urlencoding::decode(&encoded)
                .map(|decoded| Some(decoded.into_owned()))
                .map_err(|_| StoreError::InvalidEncoding),
            None => Ok(None),
        }
    }

    fn set(&self, settings: &Settings, blob: &str) -> StoreResult<()> {
        let value = urlencoding::encode(blob).into_owned();
        let size = settings.name().len() + 1 + value.len();
        if size > MAX_COOKIE_SIZE {
            return Err(StoreError::QuotaExceeded {
                size,
                limit: MAX_COOKIE_SIZE,
            });
        }

        let expires = self.expiry_for(settings);
        trace!(size, path = settings.path(), "writing cookie {}", settings.name());
        self.jar.lock().insert(
            (settings.name().to_string(), settings.path().to_string()),
            Cookie { value, expires },
        );
        Ok(())
    }
}
