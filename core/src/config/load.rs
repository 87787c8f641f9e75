use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default deskpilot data directory: ~/.deskpilot
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .or_else(|| std::env::var("HOME").ok().map(PathBuf::from))
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".deskpilot"))
}

pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.deskpilot/config.toml (highest)
    let data_dir = get_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./deskpilot.toml (current directory)
    let local_config = Path::new("deskpilot.toml");

    let mut cfg: AppConfig = if home_config.exists() {
        load_from(&home_config)?
    } else if local_config.exists() {
        load_from(local_config)?
    } else {
        AppConfig::default()
    };

    // Point default relative paths into the data directory.
    if cfg.events.path == "./task.events.jsonl" {
        let events_dir = data_dir.join("events");
        std::fs::create_dir_all(&events_dir)?;
        cfg.events.path = events_dir
            .join("task.events.jsonl")
            .to_string_lossy()
            .to_string();
    }

    if cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    if cfg.automation.screenshot_dir.is_none() {
        let shots_dir = data_dir.join("screenshots");
        std::fs::create_dir_all(&shots_dir)?;
        cfg.automation.screenshot_dir = Some(shots_dir.to_string_lossy().to_string());
    }

    // Environment variable overrides (Priority 0: highest)
    if let Ok(v) = std::env::var("DESKPILOT_LLM_BASE_URL") {
        if !v.trim().is_empty() {
            cfg.llm.text.base_url = v.clone();
            cfg.llm.vision.base_url = v;
        }
    }
    if let Ok(v) = std::env::var("DESKPILOT_LLM_API_KEY") {
        if !v.trim().is_empty() {
            cfg.llm.text.api_key = v.clone();
            cfg.llm.vision.api_key = v;
        }
    }
    if let Ok(v) = std::env::var("DESKPILOT_LLM_MODEL") {
        if !v.trim().is_empty() {
            cfg.llm.text.model = v;
        }
    }
    if let Ok(v) = std::env::var("DESKPILOT_VISION_MODEL") {
        if !v.trim().is_empty() {
            cfg.llm.vision.model = v;
        }
    }
    if let Ok(v) = std::env::var("DESKPILOT_WORKER_PATH") {
        if !v.trim().is_empty() {
            cfg.automation.worker_paths.insert(0, v);
        }
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_from_reads_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [automation]
            step_delay_ms = 50
            prefer_native = false
            "#
        )
        .unwrap();

        let cfg = load_from(file.path()).unwrap();
        assert_eq!(cfg.automation.step_delay_ms, 50);
        assert!(!cfg.automation.prefer_native);
        assert_eq!(cfg.llm.max_attempts, 3);
    }

    #[test]
    fn load_from_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [").unwrap();
        assert!(load_from(file.path()).is_err());
    }
}
