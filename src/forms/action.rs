//! External commands run from the OK button and from menu items.
//!
//! Commands are written as `program<>arg1<>arg2`. No shell is involved.

use std::process::{Command, Stdio};

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};

use super::settings::WidgetSettings;

const VALUES_MARKER: &str = "GUID_VALUES";
const VALUES_BASE64_MARKER: &str = "GUID_VALUES_BASE64";
const VALUES_BASE64_URL_MARKER: &str = "GUID_VALUES_BASE64_URL";

/// What happens after OK is clicked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OkAction {
    pub command: Option<String>,
    pub keep_open: bool,
    pub command_to_footer: bool,
    pub values_to_footer: bool,
}

impl OkAction {
    /// Builds the action from `--action-after-ok-click` settings.
    pub fn from_settings(ws: &WidgetSettings) -> Self {
        let mut action = Self {
            command: None,
            keep_open: ws.keep_open,
            command_to_footer: ws.command_to_footer,
            values_to_footer: ws.values_to_footer,
        };

        if ws.command.is_empty() {
            action.command_to_footer = false;
        } else if ws.command.contains(VALUES_MARKER) {
            action.command = Some(ws.command.clone());
        } else {
            action.command = Some(format!("{}<>{VALUES_MARKER}", ws.command));
        }

        if action.command_to_footer {
            action.values_to_footer = false;
        }
        if !action.keep_open {
            action.command_to_footer = false;
            action.values_to_footer = false;
        }
        action
    }

    /// Returns the program and arguments with the values substituted.
    pub fn command_for(&self, values: &str) -> Option<(String, Vec<String>)> {
        self.command
            .as_deref()
            .map(|cmd| split_command(&substitute_values(cmd, values)))
    }
}

/// Replaces the first kind of values marker found in `command`.
pub fn substitute_values(command: &str, values: &str) -> String {
    if command.contains(VALUES_BASE64_URL_MARKER) {
        command.replace(VALUES_BASE64_URL_MARKER, &URL_SAFE_NO_PAD.encode(values))
    } else if command.contains(VALUES_BASE64_MARKER) {
        command.replace(VALUES_BASE64_MARKER, &STANDARD.encode(values))
    } else {
        command.replace(VALUES_MARKER, values)
    }
}

/// Splits `program<>arg<>arg`.
pub fn split_command(command: &str) -> (String, Vec<String>) {
    let mut parts = command.split("<>").map(str::to_string);
    let program = parts.next().unwrap_or_default();
    (program, parts.collect())
}

/// Starts a command without waiting for it.
pub fn spawn_detached(program: &str, args: &[String]) {
    tracing::debug!(program, ?args, "spawning command");
    let spawned = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .spawn();
    if let Err(e) = spawned {
        tracing::warn!(program, "cannot run command: {e}");
    }
}

/// Runs a command to completion and returns its standard output.
pub fn run_captured(program: &str, args: &[String]) -> Option<String> {
    tracing::debug!(program, ?args, "running command");
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
    {
        Ok(out) => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
        Err(e) => {
            tracing::warn!(program, "cannot run command: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::settings;

    #[test]
    fn values_are_appended_when_no_marker() {
        let (ws, _) = settings::parse("command=notify-send<>Saved@keepOpen=true");
        let action = OkAction::from_settings(&ws);
        assert_eq!(action.command.as_deref(), Some("notify-send<>Saved<>GUID_VALUES"));
        let (program, args) = action.command_for("a|b").unwrap();
        assert_eq!(program, "notify-send");
        assert_eq!(args, vec!["Saved", "a|b"]);
    }

    #[test]
    fn base64_markers() {
        assert_eq!(substitute_values("echo<>GUID_VALUES_BASE64", "a|b"), "echo<>YXxi");
        assert_eq!(substitute_values("x<>GUID_VALUES_BASE64_URL", "??>"), "x<>Pz8-");
        assert_eq!(substitute_values("x<>GUID_VALUES", "v"), "x<>v");
    }

    #[test]
    fn footer_flags_need_keep_open() {
        let (ws, _) = settings::parse("valuesToFooter=1");
        let action = OkAction::from_settings(&ws);
        assert!(!action.values_to_footer);
        assert!(action.command.is_none());

        let (ws, _) = settings::parse("keepOpen=1@valuesToFooter=1@commandToFooter=1@command=date");
        let action = OkAction::from_settings(&ws);
        assert!(action.command_to_footer);
        assert!(!action.values_to_footer);
    }

    #[test]
    fn command_to_footer_without_command_is_dropped() {
        let (ws, _) = settings::parse("keepOpen=1@commandToFooter=1");
        let action = OkAction::from_settings(&ws);
        assert!(!action.command_to_footer);
    }
}
