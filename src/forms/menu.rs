//! Menu bars built from `--add-menu` item specifications.
//!
//! An item is `name;exitCode;command;printOutput;icon`. Items are separated by `|`,
//! and `parent#child#child` turns a top-level item into a submenu.

use super::action;

#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub entries: Vec<MenuEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Item(MenuItem),
    Submenu { name: String, items: Vec<MenuItem> },
    /// Disabled text between top-level entries, from the `sep` setting.
    Separator(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub exit_code: i32,
    pub command: String,
    pub print_output: bool,
    pub icon: String,
}

/// Message shown for the built-in `guidInfo`, `guidWarning` and `guidError` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

/// Result of activating a menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuOutcome {
    /// Text printed to stdout.
    pub report: String,
    pub message: Option<(MessageKind, String)>,
    /// Process exit status requested by the item.
    pub exit: Option<u8>,
}

impl Menu {
    pub fn parse(spec: &str, sep: &str) -> Self {
        let mut entries = Vec::new();

        for (j, top) in spec.split('|').enumerate() {
            let (data, children) = match top.split_once('#') {
                Some((data, children)) => (data, Some(children)),
                None => (top, None),
            };

            let Some(item) = MenuItem::parse(data) else {
                continue;
            };

            if !sep.is_empty() && j > 0 {
                entries.push(MenuEntry::Separator(sep.to_string()));
            }

            match children {
                Some(children) => entries.push(MenuEntry::Submenu {
                    name: item.name,
                    items: children.split('#').filter_map(MenuItem::parse).collect(),
                }),
                None => entries.push(MenuEntry::Item(item)),
            }
        }

        Self {
            entries,
        }
    }

    /// Returns the clickable item at `path`: (top-level index, submenu index).
    pub fn item(&self, top: usize, sub: Option<usize>) -> Option<&MenuItem> {
        match (self.entries.get(top)?, sub) {
            (MenuEntry::Item(item), None) => Some(item),
            (
                MenuEntry::Submenu {
                    items, ..
                },
                Some(i),
            ) => items.get(i),
            _ => None,
        }
    }
}

impl MenuItem {
    fn parse(data: &str) -> Option<Self> {
        let mut fields = data.split(';');
        let name = fields.next().unwrap_or("").to_string();
        if name.is_empty() {
            return None;
        }
        let exit_code = fields.next().and_then(|c| c.trim().parse().ok()).unwrap_or(-1);
        let command = fields.next().unwrap_or("").to_string();
        let print_output = matches!(fields.next(), Some("true" | "1"));
        let icon = fields.next().unwrap_or("").to_string();

        Some(Self {
            name,
            exit_code,
            command,
            print_output,
            icon,
        })
    }

    fn report_head(&self, prefix: &str) -> String {
        format!(
            "{prefix}MENU_CLICKED_DATA_START|name={}|exitCode={}|command={}|commandPrintOutput={}|commandOutput=",
            self.name,
            self.exit_code,
            self.command,
            u8::from(self.print_output)
        )
    }

    /// Runs the item's command and builds the report printed for the click.
    pub fn activate(&self, prefix: &str) -> MenuOutcome {
        let mut report = self.report_head(prefix);
        let mut message = None;

        if !self.command.is_empty() {
            let (program, args) = action::split_command(&self.command);
            let kind = match program.as_str() {
                "guidInfo" => Some(MessageKind::Info),
                "guidWarning" => Some(MessageKind::Warning),
                "guidError" => Some(MessageKind::Error),
                _ => None,
            };

            match kind {
                Some(kind) => {
                    let text = args.join("\n");
                    if self.print_output {
                        report.push_str(&text);
                    }
                    message = Some((kind, text));
                }
                None if self.print_output => {
                    let output = action::run_captured(&program, &args).unwrap_or_default();
                    report.push_str(&output);
                }
                None => action::spawn_detached(&program, &args),
            }
        }

        report.push_str("|MENU_CLICKED_DATA_END");

        MenuOutcome {
            report,
            message,
            exit: u8::try_from(self.exit_code).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_and_submenus() {
        let menu = Menu::parse("File#Open;3;xdg-open<>/tmp#Quit;0|About;-1;guidInfo<>v1|;2", "");
        assert_eq!(menu.entries.len(), 2);

        let MenuEntry::Submenu {
            name,
            items,
        } = &menu.entries[0]
        else {
            panic!("expected submenu");
        };
        assert_eq!(name, "File");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].exit_code, 3);
        assert_eq!(items[0].command, "xdg-open<>/tmp");

        assert_eq!(menu.item(1, None).unwrap().name, "About");
        assert_eq!(menu.item(0, Some(1)).unwrap().name, "Quit");
    }

    #[test]
    fn separators_between_top_items() {
        let menu = Menu::parse("A|B|C", "·");
        let kinds: Vec<bool> = menu
            .entries
            .iter()
            .map(|e| matches!(e, MenuEntry::Separator(_)))
            .collect();
        assert_eq!(kinds, vec![false, true, false, true, false]);
    }

    #[test]
    fn bad_exit_code_is_minus_one() {
        let menu = Menu::parse("Help;x", "");
        assert_eq!(menu.item(0, None).unwrap().exit_code, -1);
    }

    #[test]
    fn info_command_report() {
        let menu = Menu::parse("About;-1;guidInfo<>Version 1<>MIT;true", "");
        let outcome = menu.item(0, None).unwrap().activate("ok:");
        assert_eq!(
            outcome.report,
            "ok:MENU_CLICKED_DATA_START|name=About|exitCode=-1|command=guidInfo<>Version 1<>MIT|commandPrintOutput=1|commandOutput=Version 1\nMIT|MENU_CLICKED_DATA_END"
        );
        assert_eq!(outcome.message, Some((MessageKind::Info, "Version 1\nMIT".into())));
        assert_eq!(outcome.exit, None);
    }

    #[test]
    fn exit_code_in_range_exits() {
        let menu = Menu::parse("Quit;7", "");
        let outcome = menu.item(0, None).unwrap().activate("");
        assert_eq!(outcome.exit, Some(7));
        assert!(outcome.report.ends_with("commandOutput=|MENU_CLICKED_DATA_END"));

        let menu = Menu::parse("Big;300", "");
        assert_eq!(menu.item(0, None).unwrap().activate("").exit, None);
    }
}
