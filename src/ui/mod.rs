//! The forms dialog, its widgets and the color themes they share.

pub(crate) mod file_select;
pub mod forms;
pub(crate) mod layout;
pub(crate) mod widgets;

use crate::{
    config::ThemeChoice,
    render::{Rgba, rgb},
};

/// Color theme for dialogs.
#[derive(Debug, Clone, Copy)]
pub struct Colors {
    pub window_bg: Rgba,
    pub text: Rgba,
    pub text_disabled: Rgba,
    pub button: Rgba,
    pub button_hover: Rgba,
    pub button_pressed: Rgba,
    pub button_outline: Rgba,
    pub button_text: Rgba,
    pub input_bg: Rgba,
    pub input_bg_focused: Rgba,
    pub input_border: Rgba,
    pub input_border_focused: Rgba,
    pub input_placeholder: Rgba,
    pub selection: Rgba,
    pub selection_text: Rgba,
    pub row_alt: Rgba,
    pub frame: Rgba,
    pub tab_inactive: Rgba,
    pub popup_bg: Rgba,
    pub tooltip_bg: Rgba,
    pub tooltip_text: Rgba,
    pub scrollbar: Rgba,
    pub info: Rgba,
    pub warning: Rgba,
    pub error: Rgba,
}

/// Light theme colors.
pub static THEME_LIGHT: Colors = Colors {
    window_bg: rgb(250, 250, 250),
    text: rgb(30, 30, 30),
    text_disabled: rgb(150, 150, 150),
    button: rgb(230, 230, 230),
    button_hover: rgb(220, 220, 220),
    button_pressed: rgb(200, 200, 200),
    button_outline: rgb(180, 180, 180),
    button_text: rgb(30, 30, 30),
    input_bg: rgb(255, 255, 255),
    input_bg_focused: rgb(255, 255, 255),
    input_border: rgb(200, 200, 200),
    input_border_focused: rgb(100, 150, 200),
    input_placeholder: rgb(150, 150, 150),
    selection: rgb(70, 140, 220),
    selection_text: rgb(255, 255, 255),
    row_alt: rgb(245, 245, 245),
    frame: rgb(210, 210, 210),
    tab_inactive: rgb(235, 235, 235),
    popup_bg: rgb(255, 255, 255),
    tooltip_bg: rgb(50, 50, 50),
    tooltip_text: rgb(240, 240, 240),
    scrollbar: rgb(190, 190, 190),
    info: rgb(40, 110, 190),
    warning: rgb(190, 130, 20),
    error: rgb(200, 50, 50),
};

/// Dark theme colors.
pub static THEME_DARK: Colors = Colors {
    window_bg: rgb(45, 45, 45),
    text: rgb(230, 230, 230),
    text_disabled: rgb(120, 120, 120),
    button: rgb(70, 70, 70),
    button_hover: rgb(80, 80, 80),
    button_pressed: rgb(60, 60, 60),
    button_outline: rgb(100, 100, 100),
    button_text: rgb(230, 230, 230),
    input_bg: rgb(60, 60, 60),
    input_bg_focused: rgb(65, 65, 65),
    input_border: rgb(90, 90, 90),
    input_border_focused: rgb(100, 150, 200),
    input_placeholder: rgb(120, 120, 120),
    selection: rgb(60, 110, 180),
    selection_text: rgb(255, 255, 255),
    row_alt: rgb(55, 55, 55),
    frame: rgb(80, 80, 80),
    tab_inactive: rgb(55, 55, 55),
    popup_bg: rgb(55, 55, 55),
    tooltip_bg: rgb(20, 20, 20),
    tooltip_text: rgb(230, 230, 230),
    scrollbar: rgb(110, 110, 110),
    info: rgb(110, 170, 240),
    warning: rgb(230, 180, 70),
    error: rgb(240, 100, 100),
};

/// Picks the theme named in the config, detecting the desktop's choice for `auto`.
pub fn theme(choice: ThemeChoice) -> &'static Colors {
    match choice {
        ThemeChoice::Light => &THEME_LIGHT,
        ThemeChoice::Dark => &THEME_DARK,
        ThemeChoice::Auto => detect_theme(),
    }
}

/// Detect the current system theme.
/// Returns dark theme if detection fails.
pub fn detect_theme() -> &'static Colors {
    if let Ok(theme) = std::env::var("GTK_THEME") {
        tracing::debug!(theme, "theme from GTK_THEME");
        if theme.to_lowercase().contains("dark") {
            return &THEME_DARK;
        }
        return &THEME_LIGHT;
    }

    if let Ok(output) = std::process::Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", "color-scheme"])
        .output()
    {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("dark") {
            return &THEME_DARK;
        }
        if stdout.contains("light") || stdout.contains("default") {
            return &THEME_LIGHT;
        }
    }

    &THEME_DARK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_choice_wins() {
        assert_eq!(theme(ThemeChoice::Light).window_bg, THEME_LIGHT.window_bg);
        assert_eq!(theme(ThemeChoice::Dark).text, THEME_DARK.text);
    }
}
