//! Environment configuration.

use std::env;
use std::time::Duration;

pub const DEFAULT_TICK_MS: u64 = 50;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Pause after an idle tick.
    pub tick_ms: u64,
    /// Ring the terminal bell on mentions.
    pub bell: bool,
    /// Destination for `tracing` output. Nothing is logged without it.
    pub debug_log: Option<String>,
    pub log_filter: String,
    /// Mirror of every raw terminal write.
    pub write_log: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            tick_ms: env_u64_opt("TAILCHAT_TICK_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_TICK_MS),
            bell: !env_flag("TAILCHAT_NO_BELL"),
            debug_log: env_string_opt("TAILCHAT_DEBUG_LOG"),
            log_filter: env_string_opt("TAILCHAT_LOG_FILTER")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            write_log: env_string_opt("TAILCHAT_WRITE_LOG"),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            bell: true,
            debug_log: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            write_log: None,
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Unparseable numbers are treated as unset.
fn env_u64_opt(key: &str) -> Option<u64> {
    env_string_opt(key).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::{EnvConfig, DEFAULT_TICK_MS};
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 5] = [
        "TAILCHAT_TICK_MS",
        "TAILCHAT_NO_BELL",
        "TAILCHAT_DEBUG_LOG",
        "TAILCHAT_LOG_FILTER",
        "TAILCHAT_WRITE_LOG",
    ];

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    fn clear_all() -> Vec<EnvGuard> {
        KEYS.iter().map(|key| set_env_guard(key, None)).collect()
    }

    #[test]
    fn env_defaults() {
        let _lock = env_lock();
        let _guards = clear_all();

        let config = EnvConfig::from_env();
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
        assert!(config.bell);
        assert!(config.debug_log.is_none());
        assert_eq!(config.log_filter, "info");
        assert!(config.write_log.is_none());
    }

    #[test]
    fn env_values_override_defaults() {
        let _lock = env_lock();
        let _guards = clear_all();
        let _g1 = set_env_guard("TAILCHAT_TICK_MS", Some("20"));
        let _g2 = set_env_guard("TAILCHAT_NO_BELL", Some("1"));
        let _g3 = set_env_guard("TAILCHAT_DEBUG_LOG", Some("/tmp/tailchat.log"));
        let _g4 = set_env_guard("TAILCHAT_LOG_FILTER", Some("chat_log=debug"));

        let config = EnvConfig::from_env();
        assert_eq!(config.tick_ms, 20);
        assert!(!config.bell);
        assert_eq!(config.debug_log.as_deref(), Some("/tmp/tailchat.log"));
        assert_eq!(config.log_filter, "chat_log=debug");
    }

    #[test]
    fn bad_tick_values_fall_back() {
        let _lock = env_lock();
        let _guards = clear_all();
        for value in ["soon", "0", "-5", ""] {
            let _g = set_env_guard("TAILCHAT_TICK_MS", Some(value));
            assert_eq!(EnvConfig::from_env().tick_ms, DEFAULT_TICK_MS, "value {value:?}");
        }
    }

    #[test]
    fn empty_write_log_is_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard("TAILCHAT_WRITE_LOG", Some(" "));
        let config = EnvConfig::from_env();
        assert!(config.write_log.is_none());
    }
}
