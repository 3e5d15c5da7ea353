//! Simulated risk flags
//!
//! Demo/testing switches sent with every submission. They are sampled from
//! their source at the moment a payload is built, never cached.

use serde::{Deserialize, Serialize};

/// Environment variable toggling the headless flag
pub const HEADLESS_VAR: &str = "LIVENESS_SIM_HEADLESS";
/// Environment variable toggling the proxy/VPN/Tor flag
pub const PROXY_VAR: &str = "LIVENESS_SIM_PROXY";
/// Environment variable toggling the language mismatch flag
pub const LANG_MISMATCH_VAR: &str = "LIVENESS_SIM_LANG_MISMATCH";

/// Switches that simulate risky environments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedFlags {
    pub headless: bool,
    #[serde(rename = "proxy_vpn_tor")]
    pub proxy_or_vpn_or_tor: bool,
    pub lang_mismatch: bool,
}

/// Where the current flag values come from
pub trait FlagSource {
    /// Read the flags as they are right now
    fn current(&self) -> SimulatedFlags;
}

/// Flags fixed at construction (CLI switches, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedFlags(pub SimulatedFlags);

impl FlagSource for FixedFlags {
    fn current(&self) -> SimulatedFlags {
        self.0
    }
}

/// Flags read from `LIVENESS_SIM_*` environment variables on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFlagSource;

impl FlagSource for EnvFlagSource {
    fn current(&self) -> SimulatedFlags {
        SimulatedFlags {
            headless: env_toggle(HEADLESS_VAR),
            proxy_or_vpn_or_tor: env_toggle(PROXY_VAR),
            lang_mismatch: env_toggle(LANG_MISMATCH_VAR),
        }
    }
}

fn env_toggle(name: &str) -> bool {
    std::env::var(name).map(|v| parse_toggle(&v)).unwrap_or(false)
}

/// "1", "true", "yes", "on" (any case) are on; everything else is off
pub fn parse_toggle(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
