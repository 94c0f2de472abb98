// ── Environment access ──
//
// Credential resolution reads `OS_*` variables through this trait so that
// callers (and tests) can supply an environment other than the process's.

use std::collections::HashMap;
use std::path::PathBuf;

/// A source of environment variables.
pub trait EnvSource {
    /// The variable's value. Empty values read as unset.
    fn var(&self, key: &str) -> Option<String>;

    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME").map(PathBuf::from)
    }
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME").map(PathBuf::from).or_else(|| {
            directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
        })
    }
}

impl<S: std::hash::BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        (**self).home_dir()
    }
}
