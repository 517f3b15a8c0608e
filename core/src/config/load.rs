use std::path::Path;

use anyhow::Context;

use super::types::SidebarConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SIDEBAR_CONFIG";
const LOG_LEVEL_ENV: &str = "SIDEBAR_LOG_LEVEL";
const AWAIT_TIMEOUT_ENV: &str = "SIDEBAR_AWAIT_TIMEOUT_MS";

const LOCAL_CONFIG_FILE: &str = "sidebar.toml";

pub fn load_default() -> anyhow::Result<SidebarConfig> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    load_layered(&cwd, |key| std::env::var(key).ok())
}

/// Resolves the config the way [`load_default`] does, with the working
/// directory and environment supplied by the caller.
pub fn load_layered<F>(base_dir: &Path, lookup: F) -> anyhow::Result<SidebarConfig>
where
    F: Fn(&str) -> Option<String>,
{
    // Priority 1: $SIDEBAR_CONFIG (relative paths resolve against base_dir)
    // Priority 2: <base_dir>/sidebar.toml
    let explicit = lookup(CONFIG_PATH_ENV).filter(|v| !v.trim().is_empty());

    let cfg = match explicit {
        Some(path) => load_from_path(base_dir.join(path))?,
        None => {
            let local = base_dir.join(LOCAL_CONFIG_FILE);
            if local.exists() {
                load_from_path(&local)?
            } else {
                SidebarConfig::default()
            }
        }
    };

    // Environment variable overrides (Priority 0: highest)
    apply_env_overrides(cfg, lookup)
}

pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<SidebarConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    load_from_str(&s).with_context(|| format!("invalid config file {}", path.display()))
}

pub fn load_from_str(s: &str) -> anyhow::Result<SidebarConfig> {
    Ok(toml::from_str::<SidebarConfig>(s)?)
}

/// Applies `SIDEBAR_*` overrides read through `lookup`. Empty values are
/// ignored.
pub fn apply_env_overrides<F>(mut cfg: SidebarConfig, lookup: F) -> anyhow::Result<SidebarConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(LOG_LEVEL_ENV) {
        cfg.logging.level = v;
    }

    if let Some(v) = get(AWAIT_TIMEOUT_ENV) {
        let ms = v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{AWAIT_TIMEOUT_ENV} must be milliseconds, got {v:?}"))?;
        cfg.awaiter.timeout_ms = Some(ms);
    }

    Ok(cfg)
}
