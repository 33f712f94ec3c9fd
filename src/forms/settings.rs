//! `key=value@` prefixes embedded in widget arguments.
//!
//! `--add-text="image=/tmp/x.png@hideLabel=true@Hello"` carries two settings and the
//! remaining argument `Hello`. Segments that are not a known setting are re-joined with
//! `@`, so values such as e-mail addresses survive untouched.

/// Number of marker slots supported by text widgets.
pub const MARKER_SLOTS: usize = 9;

/// Value used when an integer setting does not parse.
pub const INVALID_INT: i32 = -100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetSettings {
    pub add_label: String,
    pub add_new_row_button: bool,
    pub add_value: String,
    pub background_color: String,
    pub button_text: String,
    pub command: String,
    pub command_to_footer: bool,
    pub default_index: Option<i32>,
    pub disable_buttons: bool,
    pub exclude_from_output: bool,
    pub foreground_color: String,
    pub hide_label: bool,
    pub image: String,
    pub keep_open: bool,
    pub monitor: bool,
    pub selected: bool,
    pub sep: String,
    pub stop: bool,
    pub values_to_footer: bool,
    pub verbose_tab_bar: bool,
    pub monitor_marker_files: [String; MARKER_SLOTS],
    pub monitor_var_names: [String; MARKER_SLOTS],
    pub def_marker_vals: [String; MARKER_SLOTS],
}

/// Splits `arg` into its settings and the remaining argument.
pub fn parse(arg: &str) -> (WidgetSettings, String) {
    let mut ws = WidgetSettings::default();
    let mut rest: Vec<&str> = Vec::new();

    for segment in arg.split('@') {
        if !ws.apply(segment) {
            rest.push(segment);
        }
    }

    (ws, rest.join("@"))
}

impl WidgetSettings {
    /// Applies one `key=value` segment. Returns false if the key is unknown.
    fn apply(&mut self, segment: &str) -> bool {
        let Some((key, _)) = segment.split_once('=') else {
            return false;
        };

        if let Some(slot) = marker_slot(key, "monitorMarkerFile") {
            self.monitor_marker_files[slot] = string_value(segment);
            return true;
        }
        if let Some(slot) = marker_slot(key, "monitorVarName") {
            self.monitor_var_names[slot] = string_value(segment);
            return true;
        }
        if let Some(slot) = marker_slot(key, "defMarkerVal") {
            self.def_marker_vals[slot] = string_value(segment);
            return true;
        }

        match key {
            "addLabel" => self.add_label = string_value(segment),
            "addNewRowButton" => self.add_new_row_button = bool_value(segment),
            "addValue" => self.add_value = string_value(segment),
            "backgroundColor" => self.background_color = string_value(segment),
            "buttonText" => self.button_text = string_value(segment),
            "command" => self.command = string_value(segment),
            "commandToFooter" => self.command_to_footer = bool_value(segment),
            "defaultIndex" => self.default_index = Some(int_value(segment)),
            "disableButtons" => self.disable_buttons = bool_value(segment),
            "excludeFromOutput" => self.exclude_from_output = bool_value(segment),
            "foregroundColor" => self.foreground_color = string_value(segment),
            "hideLabel" => self.hide_label = bool_value(segment),
            "image" => self.image = string_value(segment),
            "keepOpen" => self.keep_open = bool_value(segment),
            "monitor" => self.monitor = bool_value(segment),
            "selected" => self.selected = bool_value(segment),
            "sep" => self.sep = string_value(segment),
            "stop" => self.stop = bool_value(segment),
            "valuesToFooter" => self.values_to_footer = bool_value(segment),
            "verboseTabBar" => self.verbose_tab_bar = bool_value(segment),
            _ => return false,
        }
        true
    }

    /// Returns true if any text marker file is bound.
    pub fn has_markers(&self) -> bool {
        self.monitor_marker_files.iter().any(|f| !f.is_empty())
    }
}

fn marker_slot(key: &str, prefix: &str) -> Option<usize> {
    let digit = key.strip_prefix(prefix)?;
    match digit.parse::<usize>() {
        Ok(n @ 1..=MARKER_SLOTS) if digit.len() == 1 => Some(n - 1),
        _ => None,
    }
}

/// Everything after the first `=`.
pub(crate) fn string_value(segment: &str) -> String {
    segment
        .split_once('=')
        .map(|(_, v)| v.to_string())
        .unwrap_or_default()
}

/// True for `1` or `true`, case-insensitive. Only the text up to a second `=` counts.
pub(crate) fn bool_value(segment: &str) -> bool {
    let value = segment.split('=').nth(1).unwrap_or("").to_lowercase();
    value == "1" || value == "true"
}

pub(crate) fn int_value(segment: &str) -> i32 {
    segment
        .split('=')
        .nth(1)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(INVALID_INT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_settings_from_label() {
        let (ws, rest) = parse("addLabel=Options@hideLabel=TRUE@Your name");
        assert_eq!(ws.add_label, "Options");
        assert!(ws.hide_label);
        assert_eq!(rest, "Your name");
    }

    #[test]
    fn unknown_segments_are_rejoined() {
        let (ws, rest) = parse("stop=1@mail me@example.org");
        assert!(ws.stop);
        assert_eq!(rest, "mail me@example.org");
    }

    #[test]
    fn string_values_keep_later_equals() {
        let (ws, rest) = parse("command=env A=1 B=2@Run");
        assert_eq!(ws.command, "env A=1 B=2");
        assert_eq!(rest, "Run");
    }

    #[test]
    fn invalid_int_falls_back() {
        let (ws, _) = parse("defaultIndex=two@Pick");
        assert_eq!(ws.default_index, Some(INVALID_INT));
        let (ws, _) = parse("defaultIndex=2@Pick");
        assert_eq!(ws.default_index, Some(2));
    }

    #[test]
    fn booleans_need_one_or_true() {
        let (ws, _) = parse("keepOpen=yes@monitor=1");
        assert!(!ws.keep_open);
        assert!(ws.monitor);
    }

    #[test]
    fn marker_slots() {
        let (ws, rest) = parse(
            "monitorMarkerFile1=/tmp/a@monitorVarName1=cpu@defMarkerVal9=n/a@monitorMarkerFile10=x@CPU: GUID_MARKER_1",
        );
        assert_eq!(ws.monitor_marker_files[0], "/tmp/a");
        assert_eq!(ws.monitor_var_names[0], "cpu");
        assert_eq!(ws.def_marker_vals[8], "n/a");
        assert!(ws.has_markers());
        assert_eq!(rest, "monitorMarkerFile10=x@CPU: GUID_MARKER_1");
    }

    #[test]
    fn plain_argument_has_no_settings() {
        let (ws, rest) = parse("Just a label");
        assert_eq!(ws, WidgetSettings::default());
        assert_eq!(rest, "Just a label");
    }
}
