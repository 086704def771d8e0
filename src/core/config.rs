//! Environment-driven runtime settings and filesystem paths.
//!
//! Everything is read once at startup; handlers only ever see the
//! resolved `Settings` value.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let user_data_dir = discover_user_data_dir();
        let log_dir = user_data_dir.join("logs");
        let db_path = user_data_dir.join("carhelper.db");

        for dir in [&user_data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            user_data_dir,
            log_dir,
            db_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_user_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("CARHELPER_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("db");
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("Carhelper");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("Carhelper");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("carhelper")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new(".").to_path_buf())
}

/// Runtime knobs for retrieval and the optional Ollama integration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub use_ollama: bool,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_timeout_sec: u64,
    pub embed_model: String,
    pub embed_dim: usize,
    pub per_chunk_char_limit: usize,
    pub max_context_chars: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            use_ollama: env_bool("USE_OLLAMA", false),
            ollama_base_url: env_str("OLLAMA_BASE_URL", "http://127.0.0.1:11434"),
            ollama_model: env_str("OLLAMA_MODEL", "llama3.1:8b"),
            ollama_timeout_sec: env_u64("OLLAMA_TIMEOUT_SEC", 30, 1, 600),
            embed_model: env_str("EMBED_MODEL", "all-minilm"),
            embed_dim: env_u64("EMBED_DIM", 384, 1, 8192) as usize,
            per_chunk_char_limit: env_u64("PER_CHUNK_CHAR_LIMIT", 900, 100, 10_000) as usize,
            max_context_chars: env_u64("MAX_CONTEXT_CHARS", 6000, 500, 50_000) as usize,
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        ),
        Err(_) => default,
    }
}

fn env_str(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}

/// Out-of-range or unparseable values fall back to the default rather
/// than aborting startup.
fn env_u64(name: &str, default: u64, min: u64, max: u64) -> u64 {
    let Ok(raw) = env::var(name) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if (min..=max).contains(&n) => n,
        _ => default,
    }
}
