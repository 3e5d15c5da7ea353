//! Session identity, environment and simulated flags

pub mod context;
pub mod flags;

pub use context::{EnvSnapshot, ScreenInfo, SessionContext};
pub use flags::{EnvFlagSource, FixedFlags, FlagSource, SimulatedFlags};
