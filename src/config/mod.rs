//! Configuration management module

pub mod parser;
pub mod validation;
pub mod env;

// Re-export main functionality
pub use parser::{ConfigParser, load_config, display_config_summary};
pub use validation::{ConfigValidator, ValidationLevel, ValidationWarning, validate_config};
pub use env::EnvManager;

// Re-export from models for convenience
pub use crate::models::Config;

#[cfg(test)]
pub(crate) mod test_support {
    use super::EnvManager;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serializes tests that touch process environment and hides `.env`
    /// plus every supported variable until dropped.
    pub(crate) struct IsolatedEnv {
        _guard: MutexGuard<'static, ()>,
        backup: Option<String>,
    }

    impl IsolatedEnv {
        pub(crate) fn new(tag: &str) -> Self {
            let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

            for (name, _, _) in EnvManager::get_supported_env_vars() {
                std::env::remove_var(name);
            }

            let backup = if std::path::Path::new(".env").exists() {
                let backup = format!(".env.test_backup_{}", tag);
                std::fs::rename(".env", &backup).ok().map(|_| backup)
            } else {
                None
            };

            Self { _guard: guard, backup }
        }
    }

    impl Drop for IsolatedEnv {
        fn drop(&mut self) {
            for (name, _, _) in EnvManager::get_supported_env_vars() {
                std::env::remove_var(name);
            }
            if let Some(backup) = &self.backup {
                let _ = std::fs::rename(backup, ".env");
            }
        }
    }
}
