//! Session Context
//!
//! A random session identifier and a static environment descriptor, both
//! computed lazily on first access and then fixed for the session lifetime.

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng, TryRngCore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Screen geometry reported with the environment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    #[serde(rename = "dpr")]
    pub device_pixel_ratio: f64,
}

impl Default for ScreenInfo {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Static environment descriptor, captured once
///
/// Optional capabilities that cannot be determined serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    #[serde(rename = "ua")]
    pub user_agent: String,
    #[serde(rename = "lang")]
    pub locale: Option<String>,
    #[serde(rename = "tz")]
    pub timezone: Option<String>,
    pub platform: String,
    #[serde(rename = "hwc")]
    pub logical_cpu_count: Option<usize>,
    pub screen: ScreenInfo,
}

impl EnvSnapshot {
    /// Describe the host process environment.
    pub fn capture(screen: ScreenInfo) -> Self {
        Self {
            user_agent: format!(
                "{}/{} ({})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ),
            locale: std::env::var("LC_ALL")
                .ok()
                .or_else(|| std::env::var("LANG").ok())
                .and_then(|raw| normalize_locale(&raw)),
            timezone: host_timezone(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            logical_cpu_count: std::thread::available_parallelism().ok().map(|n| n.get()),
            screen,
        }
    }
}

/// Turn a POSIX locale ("en_US.UTF-8") into a BCP-47-ish tag ("en-US").
///
/// Returns `None` for the "C"/"POSIX" locales and empty values.
pub fn normalize_locale(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next().unwrap_or("").trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Host IANA zone: `$TZ`, else the target of the `/etc/localtime` link
pub fn host_timezone() -> Option<String> {
    let from_env = std::env::var("TZ")
        .ok()
        .map(|tz| tz.trim().trim_start_matches(':').to_string())
        .filter(|tz| !tz.is_empty());
    from_env.or_else(|| {
        std::fs::read_link("/etc/localtime")
            .ok()
            .and_then(|target| zone_from_localtime_target(&target))
    })
}

/// Zone name from a zoneinfo path ("/usr/share/zoneinfo/Europe/Paris" -> "Europe/Paris")
pub fn zone_from_localtime_target(target: &Path) -> Option<String> {
    let text = target.to_str()?;
    let (_, zone) = text.rsplit_once("zoneinfo/")?;
    let zone = zone.trim_start_matches("posix/").trim_start_matches("right/");
    (!zone.is_empty()).then(|| zone.to_string())
}

/// Per-session identity and environment, shared read-only by all components
#[derive(Debug)]
pub struct SessionContext {
    session_id: OnceLock<String>,
    env: OnceLock<EnvSnapshot>,
    screen: ScreenInfo,
}

impl SessionContext {
    pub fn new(screen: ScreenInfo) -> Self {
        Self {
            session_id: OnceLock::new(),
            env: OnceLock::new(),
            screen,
        }
    }

    /// Build a context with a known id (replayed sessions, tests)
    pub fn with_session_id(session_id: impl Into<String>, screen: ScreenInfo) -> Self {
        let ctx = Self::new(screen);
        let _ = ctx.session_id.set(session_id.into());
        ctx
    }

    /// Session identifier, generated on first access and stable afterwards
    pub fn session_id(&self) -> &str {
        self.session_id.get_or_init(generate_session_id)
    }

    /// Environment descriptor, captured on first access and cached
    pub fn env(&self) -> &EnvSnapshot {
        self.env.get_or_init(|| EnvSnapshot::capture(self.screen))
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(ScreenInfo::default())
    }
}

/// Generate a session id from the OS entropy source, falling back to a
/// time-seeded pseudo-random string when the OS source fails.
pub fn generate_session_id() -> String {
    match secure_session_id() {
        Some(id) => id,
        None => {
            warn!("OS random source unavailable; using pseudo-random session id");
            fallback_session_id()
        }
    }
}

/// Random (version 4) UUID drawn from the OS entropy source
pub fn secure_session_id() -> Option<String> {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => Some(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()),
        Err(e) => {
            debug!(error = %e, "OsRng failed");
            None
        }
    }
}

/// Fallback ids issued so far in this process
static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Weaker id: 16 decimal digits from a generator seeded with wall-clock
/// nanos, the process id and a per-process counter
pub fn fallback_session_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let seed = nanos
        ^ (u64::from(std::process::id()) << 32)
        ^ count.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..16)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_session_id_stable() {
        let ctx = SessionContext::default();
        let a = ctx.session_id().to_string();
        let b = ctx.session_id().to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn test_session_ids_differ_between_sessions() {
        let a = SessionContext::default();
        let b = SessionContext::default();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn test_secure_id_is_v4_uuid() {
        let id = secure_session_id().expect("OS entropy available in tests");
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_fallback_id_shape() {
        let id = fallback_session_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
        assert!(Uuid::parse_str(&id).is_err());
    }

    #[test]
    fn test_fallback_ids_differ_back_to_back() {
        let ids: std::collections::HashSet<String> = (0..64).map(|_| fallback_session_id()).collect();
        assert_eq!(ids.len(), 64);
        assert!(ids.iter().all(|id| id.len() == 16));
    }

    #[test]
    fn test_zone_from_localtime_target() {
        assert_eq!(
            zone_from_localtime_target(Path::new("/usr/share/zoneinfo/Europe/Paris")),
            Some("Europe/Paris".to_string())
        );
        assert_eq!(
            zone_from_localtime_target(Path::new("../usr/share/zoneinfo/posix/America/New_York")),
            Some("America/New_York".to_string())
        );
        assert_eq!(
            zone_from_localtime_target(Path::new("/var/db/timezone/zoneinfo/UTC")),
            Some("UTC".to_string())
        );
        assert_eq!(zone_from_localtime_target(Path::new("/etc/localtime.bak")), None);
        assert_eq!(zone_from_localtime_target(Path::new("/usr/share/zoneinfo/")), None);
    }

    #[test]
    fn test_with_session_id() {
        let ctx = SessionContext::with_session_id("abc", ScreenInfo::default());
        assert_eq!(ctx.session_id(), "abc");
    }

    #[test]
    fn test_env_cached() {
        let ctx = SessionContext::default();
        let first = ctx.env() as *const EnvSnapshot;
        let second = ctx.env() as *const EnvSnapshot;
        assert_eq!(first, second);
        assert!(!ctx.env().platform.is_empty());
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("en_US.UTF-8").as_deref(), Some("en-US"));
        assert_eq!(normalize_locale("de_DE@euro").as_deref(), Some("de-DE"));
        assert_eq!(normalize_locale("C"), None);
        assert_eq!(normalize_locale("POSIX.UTF-8"), None);
        assert_eq!(normalize_locale(""), None);
    }

    #[test]
    fn test_env_wire_names() {
        let env = EnvSnapshot {
            user_agent: "ua".into(),
            locale: None,
            timezone: Some("UTC".into()),
            platform: "linux-x86_64".into(),
            logical_cpu_count: Some(8),
            screen: ScreenInfo { width: 800, height: 600, device_pixel_ratio: 2.0 },
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["ua"], "ua");
        assert!(json["lang"].is_null());
        assert_eq!(json["tz"], "UTC");
        assert_eq!(json["hwc"], 8);
        assert_eq!(json["screen"]["w"], 800);
        assert_eq!(json["screen"]["dpr"], 2.0);
    }
}
