use std::ffi::OsStr;
use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::process::Command;

use deskpilot_core::automation::{CapabilityProvider, OperationOutcome};
use deskpilot_core::error::CapabilityError;
use deskpilot_core::task::MouseButton;
use deskpilot_core::vision::DisplayCapture;

/// In-process provider that drives the desktop through the platform's own
/// tools: `xdotool` and `scrot`/`gnome-screenshot` on Linux, `osascript`
/// and `screencapture` on macOS, PowerShell on Windows. Clipboard access
/// goes through `arboard` on every platform.
pub struct NativeProvider;

impl NativeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for NativeProvider {
    fn name(&self) -> &str {
        "native"
    }

    async fn is_available(&self) -> bool {
        if cfg!(target_os = "linux") {
            which::which("xdotool").is_ok()
        } else if cfg!(target_os = "macos") {
            which::which("osascript").is_ok()
        } else if cfg!(target_os = "windows") {
            which::which("powershell").is_ok()
        } else {
            false
        }
    }

    async fn click(&self, x: i32, y: i32, button: MouseButton) -> OperationOutcome {
        let message = format!("clicked at ({x}, {y})");
        if cfg!(target_os = "linux") {
            let args = vec![
                "mousemove".to_string(),
                x.to_string(),
                y.to_string(),
                "click".to_string(),
                linux_button(button).to_string(),
            ];
            run_tool("xdotool", args, message).await
        } else if cfg!(target_os = "macos") {
            if button != MouseButton::Left {
                return OperationOutcome::failed(
                    "click failed",
                    "only left click is supported on macos",
                );
            }
            let script =
                format!("tell application \"System Events\" to click at {{{x}, {y}}}");
            run_tool("osascript", vec!["-e".to_string(), script], message).await
        } else if cfg!(target_os = "windows") {
            let script = windows_click_script(x, y, button);
            run_tool("powershell", powershell_args(script), message).await
        } else {
            OperationOutcome::failed("click failed", "unsupported platform")
        }
    }

    async fn type_text(&self, text: &str) -> OperationOutcome {
        let message = format!("typed {} characters", text.chars().count());
        if cfg!(target_os = "linux") {
            let args = vec![
                "type".to_string(),
                "--delay".to_string(),
                "50".to_string(),
                "--".to_string(),
                text.to_string(),
            ];
            run_tool("xdotool", args, message).await
        } else if cfg!(target_os = "macos") {
            let script = format!(
                "tell application \"System Events\" to keystroke \"{}\"",
                applescript_quote(text)
            );
            run_tool("osascript", vec!["-e".to_string(), script], message).await
        } else if cfg!(target_os = "windows") {
            let script = windows_sendkeys_script(&sendkeys_escape(text));
            run_tool("powershell", powershell_args(script), message).await
        } else {
            OperationOutcome::failed("type failed", "unsupported platform")
        }
    }

    async fn key_press(&self, combo: &str) -> OperationOutcome {
        let message = format!("pressed {combo}");
        if cfg!(target_os = "linux") {
            let args = vec!["key".to_string(), x11_chord(combo)];
            run_tool("xdotool", args, message).await
        } else if cfg!(target_os = "macos") {
            let script = format!(
                "tell application \"System Events\" to {}",
                applescript_key(combo)
            );
            run_tool("osascript", vec!["-e".to_string(), script], message).await
        } else if cfg!(target_os = "windows") {
            let script = windows_sendkeys_script(&sendkeys_chord(combo));
            run_tool("powershell", powershell_args(script), message).await
        } else {
            OperationOutcome::failed("key press failed", "unsupported platform")
        }
    }

    async fn screenshot(&self) -> Result<DisplayCapture, CapabilityError> {
        let image = if cfg!(target_os = "linux") {
            if which::which("scrot").is_ok() {
                capture_stdout("scrot", &["-z", "-"]).await?
            } else if which::which("gnome-screenshot").is_ok() {
                capture_stdout("gnome-screenshot", &["-f", "/dev/stdout"]).await?
            } else {
                return Err(CapabilityError::Unavailable(
                    "no screenshot tool (scrot or gnome-screenshot)".to_string(),
                ));
            }
        } else if cfg!(target_os = "macos") {
            capture_stdout("screencapture", &["-t", "png", "-"]).await?
        } else if cfg!(target_os = "windows") {
            let stdout =
                capture_stdout("powershell", &["-NoProfile", "-Command", WINDOWS_SCREENSHOT])
                    .await?;
            let encoded = String::from_utf8_lossy(&stdout);
            BASE64.decode(encoded.trim()).map_err(|err| {
                CapabilityError::Protocol(format!("bad screenshot payload: {err}"))
            })?
        } else {
            return Err(CapabilityError::Unavailable("native".to_string()));
        };

        let (width, height) = super::png_dimensions(&image).unwrap_or((0, 0));
        Ok(DisplayCapture::primary(image, width, height))
    }

    async fn clipboard_get(&self) -> OperationOutcome {
        let started = Instant::now();
        let result = tokio::task::spawn_blocking(|| {
            arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text())
        })
        .await;
        match result {
            Ok(Ok(text)) => OperationOutcome::ok_with_data(
                "clipboard read",
                serde_json::json!({ "text": text }),
            )
            .with_duration(started),
            Ok(Err(err)) => OperationOutcome::failed("clipboard read failed", err.to_string())
                .with_duration(started),
            Err(err) => OperationOutcome::failed("clipboard read failed", err.to_string())
                .with_duration(started),
        }
    }

    async fn clipboard_set(&self, text: &str) -> OperationOutcome {
        let started = Instant::now();
        let owned = text.to_string();
        let result = tokio::task::spawn_blocking(move || {
            arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(owned))
        })
        .await;
        match result {
            Ok(Ok(())) => OperationOutcome::ok("clipboard written").with_duration(started),
            Ok(Err(err)) => OperationOutcome::failed("clipboard write failed", err.to_string())
                .with_duration(started),
            Err(err) => OperationOutcome::failed("clipboard write failed", err.to_string())
                .with_duration(started),
        }
    }
}

async fn run_tool<I, S>(program: &str, args: I, success: String) -> OperationOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let started = Instant::now();
    match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => {
            OperationOutcome::ok(success).with_duration(started)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            OperationOutcome::failed(format!("{program} failed"), stderr.trim().to_string())
                .with_duration(started)
        }
        Err(err) => OperationOutcome::failed(format!("failed to spawn {program}"), err.to_string())
            .with_duration(started),
    }
}

async fn capture_stdout(program: &str, args: &[&str]) -> Result<Vec<u8>, CapabilityError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|err| CapabilityError::Spawn(format!("{program}: {err}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CapabilityError::Spawn(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

fn linux_button(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "1",
        MouseButton::Middle => "2",
        MouseButton::Right => "3",
    }
}

/// xdotool takes chords in its own notation: lowercase modifiers joined
/// with '+', named keys as X11 keysyms.
fn x11_chord(combo: &str) -> String {
    combo
        .split('+')
        .map(x11_part)
        .collect::<Vec<_>>()
        .join("+")
}

fn x11_part(part: &str) -> String {
    let mapped = match part {
        "ctrl" | "alt" | "shift" | "super" => part,
        "cmd" => "super",
        "enter" => "Return",
        "esc" => "Escape",
        "tab" => "Tab",
        "space" => "space",
        "backspace" => "BackSpace",
        "delete" => "Delete",
        "home" => "Home",
        "end" => "End",
        "pageup" => "Page_Up",
        "pagedown" => "Page_Down",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        _ => {
            if let Some(digits) = part.strip_prefix('f') {
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    return format!("F{digits}");
                }
            }
            part
        }
    };
    mapped.to_string()
}

fn applescript_quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// System Events wants `key code N` for named keys and `keystroke "c"`
/// for characters, with modifiers in a trailing `using` clause.
fn applescript_key(combo: &str) -> String {
    let parts: Vec<&str> = combo.split('+').collect();
    let (key, modifiers) = match parts.split_last() {
        Some((key, modifiers)) => (*key, modifiers),
        None => (combo, &[][..]),
    };
    let mods: Vec<&str> = modifiers
        .iter()
        .filter_map(|m| match *m {
            "ctrl" => Some("control down"),
            "alt" => Some("option down"),
            "shift" => Some("shift down"),
            "cmd" | "super" => Some("command down"),
            _ => None,
        })
        .collect();
    let using = if mods.is_empty() {
        String::new()
    } else {
        format!(" using {{{}}}", mods.join(", "))
    };
    match mac_key_code(key) {
        Some(code) => format!("key code {code}{using}"),
        None => format!("keystroke \"{}\"{using}", applescript_quote(key)),
    }
}

fn mac_key_code(key: &str) -> Option<u8> {
    let code = match key {
        "enter" => 36,
        "tab" => 48,
        "space" => 49,
        "backspace" => 51,
        "esc" => 53,
        "home" => 115,
        "pageup" => 116,
        "delete" => 117,
        "end" => 119,
        "pagedown" => 121,
        "left" => 123,
        "right" => 124,
        "down" => 125,
        "up" => 126,
        _ => return None,
    };
    Some(code)
}

fn sendkeys_chord(combo: &str) -> String {
    let parts: Vec<&str> = combo.split('+').collect();
    let (key, modifiers) = match parts.split_last() {
        Some((key, modifiers)) => (*key, modifiers),
        None => (combo, &[][..]),
    };
    let mut out = String::new();
    for modifier in modifiers {
        match *modifier {
            "ctrl" => out.push('^'),
            "alt" => out.push('%'),
            "shift" => out.push('+'),
            _ => {}
        }
    }
    out.push_str(&sendkeys_key(key));
    out
}

fn sendkeys_key(key: &str) -> String {
    let named = match key {
        "enter" => "{ENTER}",
        "esc" => "{ESC}",
        "tab" => "{TAB}",
        "space" => " ",
        "backspace" => "{BACKSPACE}",
        "delete" => "{DELETE}",
        "home" => "{HOME}",
        "end" => "{END}",
        "pageup" => "{PGUP}",
        "pagedown" => "{PGDN}",
        "up" => "{UP}",
        "down" => "{DOWN}",
        "left" => "{LEFT}",
        "right" => "{RIGHT}",
        _ => {
            if let Some(digits) = key.strip_prefix('f') {
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    return format!("{{F{digits}}}");
                }
            }
            return sendkeys_escape(key);
        }
    };
    named.to_string()
}

/// SendKeys gives +^%~(){}[] special meaning; literal occurrences are
/// wrapped in braces.
fn sendkeys_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '+' | '^' | '%' | '~' | '(' | ')' | '{' | '}' | '[' | ']' => {
                out.push('{');
                out.push(ch);
                out.push('}');
            }
            _ => out.push(ch),
        }
    }
    out
}

fn powershell_args(script: String) -> Vec<String> {
    vec!["-NoProfile".to_string(), "-Command".to_string(), script]
}

fn ps_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '`' | '"' | '$' => {
                out.push('`');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn windows_sendkeys_script(sequence: &str) -> String {
    format!(
        "Add-Type -AssemblyName System.Windows.Forms\n[System.Windows.Forms.SendKeys]::SendWait({})",
        ps_quote(sequence)
    )
}

fn windows_click_script(x: i32, y: i32, button: MouseButton) -> String {
    let (down, up) = match button {
        MouseButton::Left => ("0x02", "0x04"),
        MouseButton::Right => ("0x08", "0x10"),
        MouseButton::Middle => ("0x20", "0x40"),
    };
    format!(
        r#"Add-Type -AssemblyName System.Windows.Forms
[System.Windows.Forms.Cursor]::Position = New-Object System.Drawing.Point({x}, {y})
Add-Type -TypeDefinition 'using System; using System.Runtime.InteropServices; public class Mouse {{ [DllImport("user32.dll")] public static extern void mouse_event(uint dwFlags, uint dx, uint dy, uint dwData, IntPtr dwExtraInfo); }}'
[Mouse]::mouse_event({down}, 0, 0, 0, [IntPtr]::Zero)
[Mouse]::mouse_event({up}, 0, 0, 0, [IntPtr]::Zero)"#
    )
}

const WINDOWS_SCREENSHOT: &str = r#"Add-Type -AssemblyName System.Windows.Forms
Add-Type -AssemblyName System.Drawing
$bounds = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds
$bitmap = New-Object System.Drawing.Bitmap $bounds.Width, $bounds.Height
$graphics = [System.Drawing.Graphics]::FromImage($bitmap)
$graphics.CopyFromScreen($bounds.Location, [System.Drawing.Point]::Empty, $bounds.Size)
$ms = New-Object System.IO.MemoryStream
$bitmap.Save($ms, [System.Drawing.Imaging.ImageFormat]::Png)
[System.Convert]::ToBase64String($ms.ToArray())"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x11_chord_maps_named_keys_and_modifiers() {
        assert_eq!(x11_chord("ctrl+shift+t"), "ctrl+shift+t");
        assert_eq!(x11_chord("enter"), "Return");
        assert_eq!(x11_chord("ctrl+pageup"), "ctrl+Page_Up");
        assert_eq!(x11_chord("cmd+c"), "super+c");
        assert_eq!(x11_chord("f5"), "F5");
    }

    #[test]
    fn applescript_key_uses_key_codes_for_named_keys() {
        assert_eq!(applescript_key("enter"), "key code 36");
        assert_eq!(
            applescript_key("cmd+shift+t"),
            "keystroke \"t\" using {command down, shift down}"
        );
        assert_eq!(
            applescript_key("ctrl+pagedown"),
            "key code 121 using {control down}"
        );
    }

    #[test]
    fn sendkeys_chord_builds_modifier_notation() {
        assert_eq!(sendkeys_chord("ctrl+shift+t"), "^+t");
        assert_eq!(sendkeys_chord("enter"), "{ENTER}");
        assert_eq!(sendkeys_chord("alt+f4"), "%{F4}");
    }

    #[test]
    fn sendkeys_escape_wraps_special_characters() {
        assert_eq!(sendkeys_escape("50+2%"), "50{+}2{%}");
        assert_eq!(sendkeys_escape("plain text"), "plain text");
    }

    #[test]
    fn ps_quote_escapes_interpolation() {
        assert_eq!(ps_quote("say \"hi\" $now"), "\"say `\"hi`\" `$now\"");
    }

    #[test]
    fn linux_button_numbers_follow_x11() {
        assert_eq!(linux_button(MouseButton::Left), "1");
        assert_eq!(linux_button(MouseButton::Middle), "2");
        assert_eq!(linux_button(MouseButton::Right), "3");
    }

    #[test]
    fn applescript_quote_escapes_backslash_and_quote() {
        assert_eq!(applescript_quote(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
