//! Pulls structured hints out of free-text step context. Pure string
//! work, no I/O; the step executors own what to do when a hint is
//! missing.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

static QUOTED_REGEX: OnceLock<Regex> = OnceLock::new();
static PATH_REGEX: OnceLock<Regex> = OnceLock::new();
static DURATION_REGEX: OnceLock<Regex> = OnceLock::new();
static CHORD_REGEX: OnceLock<Regex> = OnceLock::new();
static NAMED_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

fn quoted_regex() -> &'static Regex {
    QUOTED_REGEX.get_or_init(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap())
}

fn path_regex() -> &'static Regex {
    PATH_REGEX.get_or_init(|| {
        Regex::new(r"(?:~|\.{1,2})?/[\w./-]+|[\w-]+(?:/[\w.-]+)+|\b[\w-]+\.[A-Za-z0-9]{2,4}\b")
            .unwrap()
    })
}

fn duration_regex() -> &'static Regex {
    DURATION_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+)\s*(ms|milliseconds?|secs?|seconds?|mins?|minutes?|s|m)?\b")
            .unwrap()
    })
}

fn chord_regex() -> &'static Regex {
    CHORD_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\b((?:ctrl|control|alt|shift|cmd|command|super|win|meta)(?:\s*\+\s*(?:ctrl|control|alt|shift|cmd|command|super|win|meta|f\d{1,2}|tab|enter|return|esc|escape|space|delete|backspace|home|end|pageup|pagedown|up|down|left|right|[a-z0-9]))+)\b",
        )
        .unwrap()
    })
}

fn named_key_regex() -> &'static Regex {
    NAMED_KEY_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\b(enter|return|tab|esc|escape|space|delete|backspace|home|end|pageup|pagedown|f\d{1,2})\b",
        )
        .unwrap()
    })
}

/// First quoted span, double or single quotes.
pub fn quoted(text: &str) -> Option<String> {
    quoted_regex().captures(text).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    })
}

/// Well-known application names and aliases, most specific first.
/// Multi-word entries must precede their single-word tails so "text
/// editor" wins over "editor".
const APP_KEYWORDS: &[&str] = &[
    "google-chrome",
    "firefox",
    "chromium",
    "chrome",
    "safari",
    "msedge",
    "edge",
    "web browser",
    "browser",
    "gnome-terminal",
    "konsole",
    "xterm",
    "terminal",
    "text editor",
    "notepad",
    "gedit",
    "kate",
    "editor",
    "file manager",
    "explorer",
    "nautilus",
    "dolphin",
    "files",
    "calculator",
];

/// Application to launch: a quoted name wins, then the alias table.
pub fn app_name(text: &str) -> Option<String> {
    if let Some(name) = quoted(text) {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();

    for keyword in APP_KEYWORDS {
        let found = if let Some((first, second)) = keyword.split_once(' ') {
            tokens
                .windows(2)
                .any(|pair| pair[0] == first && pair[1] == second)
        } else {
            tokens.iter().any(|t| t == keyword)
        };
        if found {
            return Some((*keyword).to_string());
        }
    }
    None
}

/// File path hint: a path-looking quoted span, else the first path-shaped
/// token (absolute, relative with separators, or a bare name with an
/// extension).
pub fn file_path(text: &str) -> Option<String> {
    if let Some(q) = quoted(text) {
        if q.contains('/') || q.contains('\\') || q.contains('.') {
            return Some(q);
        }
    }
    path_regex().find(text).map(|m| m.as_str().to_string())
}

/// Wait length from the context. A bare number means seconds; absent or
/// unparsable means one second.
pub fn wait_duration(text: &str) -> Duration {
    if let Some(caps) = duration_regex().captures(text) {
        if let Ok(value) = caps[1].parse::<u64>() {
            let unit = caps
                .get(2)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default();
            return match unit.as_str() {
                "ms" | "millisecond" | "milliseconds" => Duration::from_millis(value),
                "m" | "min" | "mins" | "minute" | "minutes" => Duration::from_secs(value * 60),
                _ => Duration::from_secs(value),
            };
        }
    }
    Duration::from_secs(1)
}

/// Key chord such as "ctrl+shift+t", or a standalone named key. Output is
/// lowercase with canonical modifier names and no spaces.
pub fn key_combo(text: &str) -> Option<String> {
    if let Some(caps) = chord_regex().captures(text) {
        return Some(normalize_combo(&caps[1]));
    }
    if let Some(caps) = named_key_regex().captures(text) {
        return Some(normalize_combo(&caps[1]));
    }
    None
}

fn normalize_combo(raw: &str) -> String {
    raw.to_lowercase()
        .split('+')
        .map(|part| {
            match part.trim() {
                "control" => "ctrl",
                "command" => "cmd",
                "win" | "meta" => "super",
                "return" => "enter",
                "escape" => "esc",
                other => other,
            }
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Whether a clipboard step means "read the clipboard" rather than
/// "put text on it".
pub fn wants_clipboard_read(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["get", "read", "show", "paste", "retrieve"]
        .iter()
        .any(|verb| lower.contains(verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_prefers_first_span() {
        assert_eq!(quoted(r#"type "hello world" now"#).as_deref(), Some("hello world"));
        assert_eq!(quoted("open 'my file.txt'").as_deref(), Some("my file.txt"));
        assert_eq!(quoted("nothing here"), None);
    }

    #[test]
    fn app_name_finds_aliases_and_quoted_names() {
        assert_eq!(app_name("open the browser").as_deref(), Some("browser"));
        assert_eq!(app_name("launch Firefox please").as_deref(), Some("firefox"));
        assert_eq!(app_name("start the text editor").as_deref(), Some("text editor"));
        assert_eq!(app_name("run \"Obscure IDE\"").as_deref(), Some("Obscure IDE"));
        assert_eq!(app_name("press the red button"), None);
    }

    #[test]
    fn app_name_does_not_match_inside_words() {
        // "edge" must not fire inside "knowledge"
        assert_eq!(app_name("open the knowledge base"), None);
    }

    #[test]
    fn file_path_extracts_various_shapes() {
        assert_eq!(
            file_path("save it to /tmp/shots/out.png").as_deref(),
            Some("/tmp/shots/out.png")
        );
        assert_eq!(
            file_path("write docs/report.md first").as_deref(),
            Some("docs/report.md")
        );
        assert_eq!(file_path("create notes.txt on the desktop").as_deref(), Some("notes.txt"));
        assert_eq!(file_path("no paths in here"), None);
    }

    #[test]
    fn wait_duration_parses_units() {
        assert_eq!(wait_duration("wait 500 ms"), Duration::from_millis(500));
        assert_eq!(wait_duration("wait 3 seconds"), Duration::from_secs(3));
        assert_eq!(wait_duration("pause for 2 minutes"), Duration::from_secs(120));
        assert_eq!(wait_duration("wait 5"), Duration::from_secs(5));
        assert_eq!(wait_duration("wait a moment"), Duration::from_secs(1));
    }

    #[test]
    fn key_combo_normalizes_chords() {
        assert_eq!(key_combo("press Ctrl+C").as_deref(), Some("ctrl+c"));
        assert_eq!(
            key_combo("hit Control + Shift + T").as_deref(),
            Some("ctrl+shift+t")
        );
        assert_eq!(key_combo("press Alt+F4 to close").as_deref(), Some("alt+f4"));
        assert_eq!(key_combo("press Enter").as_deref(), Some("enter"));
        assert_eq!(key_combo("hit Escape").as_deref(), Some("esc"));
        assert_eq!(key_combo("click somewhere"), None);
    }

    #[test]
    fn clipboard_verbs_classify_read_vs_write() {
        assert!(wants_clipboard_read("get the clipboard contents"));
        assert!(wants_clipboard_read("read what is on the clipboard"));
        assert!(!wants_clipboard_read("copy \"hello\" to the clipboard"));
    }
}
