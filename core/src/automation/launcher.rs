use std::process::Stdio;

use tokio::process::Command;

use super::types::OperationOutcome;

/// Launches desktop applications by human-readable name. Well-known names
/// are mapped to platform commands; anything else is treated as a
/// third-party program and tried directly.
#[derive(Debug, Default)]
pub struct AppLauncher;

impl AppLauncher {
    pub fn new() -> Self {
        Self
    }

    fn normalize(app: &str) -> String {
        app.trim().trim_matches(['"', '\'']).to_lowercase()
    }

    /// Candidate argv vectors for this platform, tried in order.
    pub fn candidates(app: &str) -> Vec<Vec<String>> {
        let name = Self::normalize(app);
        let direct = |programs: &[&str]| -> Vec<Vec<String>> {
            programs.iter().map(|p| vec![p.to_string()]).collect()
        };

        if cfg!(target_os = "macos") {
            let mapped = match name.as_str() {
                "browser" | "web browser" => "Safari",
                "terminal" => "Terminal",
                "editor" | "text editor" | "notepad" => "TextEdit",
                "files" | "file manager" | "explorer" => "Finder",
                "calculator" => "Calculator",
                _ => "",
            };
            let target = if mapped.is_empty() {
                app.trim().to_string()
            } else {
                mapped.to_string()
            };
            vec![vec!["open".to_string(), "-a".to_string(), target]]
        } else if cfg!(target_os = "windows") {
            let mapped = match name.as_str() {
                "browser" | "web browser" => "msedge",
                "terminal" => "cmd",
                "editor" | "text editor" => "notepad",
                "notepad" => "notepad",
                "files" | "file manager" => "explorer",
                "calculator" => "calc",
                _ => "",
            };
            let target = if mapped.is_empty() {
                app.trim().to_string()
            } else {
                mapped.to_string()
            };
            vec![vec![
                "cmd".to_string(),
                "/C".to_string(),
                "start".to_string(),
                String::new(),
                target,
            ]]
        } else {
            match name.as_str() {
                "browser" | "web browser" => direct(&["firefox", "google-chrome", "chromium"]),
                "terminal" => direct(&["gnome-terminal", "konsole", "xterm"]),
                "editor" | "text editor" | "notepad" => direct(&["gedit", "kate", "mousepad"]),
                "files" | "file manager" | "explorer" => direct(&["nautilus", "dolphin", "thunar"]),
                "calculator" => direct(&["gnome-calculator", "kcalc"]),
                _ => vec![vec![name]],
            }
        }
    }

    /// Spawn the first candidate that starts. The child is detached;
    /// success means the process spawned, not that the app finished
    /// loading.
    pub async fn launch(&self, app: &str) -> OperationOutcome {
        let started = std::time::Instant::now();
        let mut last_error = String::new();

        for argv in Self::candidates(app) {
            let (program, args) = match argv.split_first() {
                Some(split) => split,
                None => continue,
            };
            let spawned = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            match spawned {
                Ok(_child) => {
                    tracing::info!(app, program, "launched application");
                    return OperationOutcome::ok(format!("launched {app}")).with_duration(started);
                }
                Err(err) => {
                    last_error = format!("{program}: {err}");
                }
            }
        }

        OperationOutcome::failed(format!("failed to launch {app}"), last_error)
            .with_duration(started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_quotes_and_case() {
        assert_eq!(AppLauncher::normalize(" \"Firefox\" "), "firefox");
        assert_eq!(AppLauncher::normalize("'Text Editor'"), "text editor");
    }

    #[test]
    fn known_aliases_map_to_platform_commands() {
        let candidates = AppLauncher::candidates("browser");
        assert!(!candidates.is_empty());
        let flat: Vec<String> = candidates.iter().flatten().cloned().collect();
        if cfg!(target_os = "macos") {
            assert!(flat.contains(&"open".to_string()));
        } else if cfg!(target_os = "windows") {
            assert!(flat.contains(&"msedge".to_string()));
        } else {
            assert!(flat.contains(&"firefox".to_string()));
        }
    }

    #[test]
    fn unknown_app_is_tried_directly() {
        let candidates = AppLauncher::candidates("obscure-ide");
        let flat: Vec<String> = candidates.iter().flatten().cloned().collect();
        assert!(flat.iter().any(|part| part.contains("obscure-ide")));
    }
}
