use std::env;
use std::ffi::OsString;

use tracing::Level;

pub const DEBUG_ENV: &str = "XEXEC_DEBUG";
pub const QUIET_ENV: &str = "XEXEC_QUIET";

/// Diagnostic toggles. Everything on the command line belongs to the target, so the
/// environment is the only configuration surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub debug: bool,
    pub quiet: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var_os(name))
    }

    /// A variable counts as set even when its value is empty.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        Self {
            debug: lookup(DEBUG_ENV).is_some(),
            quiet: lookup(QUIET_ENV).is_some(),
        }
    }

    /// Error lines obey the quiet flag, everything below `WARN` obeys the debug flag.
    /// The two flags never mask each other.
    pub fn allows(&self, level: &Level) -> bool {
        if *level <= Level::WARN {
            !self.quiet
        } else {
            self.debug
        }
    }
}
