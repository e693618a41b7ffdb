//! Location of the `crank` CLI cache directory
//!
//! - macOS: `<home>/Library/Caches/crank/`
//! - Windows: `%LOCALAPPDATA%\crank\`
//! - Other: `<home>/.cache/crank/`
//!
//! The home directory follows the CLI's own lookup order so that both tools
//! agree on where the registry lives.

use std::path::PathBuf;

pub const REGISTRY_FILE_NAME: &str = "cog-registry.json";

const CACHE_DIR_NAME: &str = "crank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }
}

/// Resolves the user's home directory.
///
/// `env` looks up an environment variable; empty values count as unset.
/// Order: `HOME`, then on Windows `HOMEDRIVE`+`HOMEPATH` and `USERPROFILE`,
/// then the OS-reported home, then the OS temp directory.
pub fn home_dir(platform: Platform, env: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    let var = |key: &str| env(key).filter(|value| !value.is_empty());

    if let Some(home) = var("HOME") {
        return PathBuf::from(home);
    }

    if platform == Platform::Windows {
        if let (Some(drive), Some(path)) = (var("HOMEDRIVE"), var("HOMEPATH")) {
            return PathBuf::from(drive).join(path);
        }
        if let Some(profile) = var("USERPROFILE") {
            return PathBuf::from(profile);
        }
    }

    dirs::home_dir().unwrap_or_else(std::env::temp_dir)
}

/// Cache directory of the `crank` CLI for `platform`.
pub fn cache_directory(platform: Platform, env: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    match platform {
        Platform::MacOs => home_dir(platform, env)
            .join("Library")
            .join("Caches")
            .join(CACHE_DIR_NAME),
        Platform::Windows => PathBuf::from(env("LOCALAPPDATA").unwrap_or_default()).join(CACHE_DIR_NAME),
        Platform::Other => home_dir(platform, env).join(".cache").join(CACHE_DIR_NAME),
    }
}

/// Registry file path for the running platform and process environment.
pub fn default_registry_path() -> PathBuf {
    let env = |key: &str| std::env::var(key).ok();
    cache_directory(Platform::current(), &env).join(REGISTRY_FILE_NAME)
}
