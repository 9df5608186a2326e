use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes environment access across tests and restores every variable it
/// touched, in reverse order, when dropped.
pub(crate) struct EnvScope {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub(crate) fn new() -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            saved: Vec::new(),
            _lock: lock,
        }
    }

    pub(crate) fn set(&mut self, key: &'static str, value: impl AsRef<OsStr>) -> &mut Self {
        self.remember(key);
        unsafe {
            std::env::set_var(key, value);
        }
        self
    }

    pub(crate) fn remove(&mut self, key: &'static str) -> &mut Self {
        self.remember(key);
        unsafe {
            std::env::remove_var(key);
        }
        self
    }

    fn remember(&mut self, key: &'static str) {
        if !self.saved.iter().any(|(saved, _)| *saved == key) {
            self.saved.push((key, std::env::var_os(key)));
        }
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, prev) in self.saved.drain(..).rev() {
            unsafe {
                match prev {
                    Some(prev) => std::env::set_var(key, prev),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "MULTITASK_TEST_ENV_SCOPE";

    #[test]
    fn scope_restores_original_value_after_repeated_changes() {
        {
            let mut env = EnvScope::new();
            env.set(KEY, "original");
        }
        assert_eq!(std::env::var_os(KEY), None);

        {
            let mut env = EnvScope::new();
            env.set(KEY, "first").remove(KEY).set(KEY, "second");
            assert_eq!(std::env::var_os(KEY), Some(OsString::from("second")));
        }
        assert_eq!(std::env::var_os(KEY), None);
    }
}
