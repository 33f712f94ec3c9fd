//! Command line splitting.
//!
//! General window options are consumed here. Every other long option is passed through,
//! in order, to the forms compiler.

use std::ffi::OsString;

use lexopt::prelude::*;

use crate::{
    error::Error,
    forms::{FormArg, takes_value},
};

/// Zenity dialog types this program recognises but does not build.
const OTHER_DIALOGS: &[&str] = &[
    "calendar",
    "color-selection",
    "entry",
    "error",
    "file-selection",
    "info",
    "list",
    "notification",
    "password",
    "progress",
    "question",
    "scale",
    "text-info",
    "warning",
];

/// Window and output options shared by every dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralOptions {
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub timeout: Option<u64>,
    pub ok_label: Option<String>,
    pub cancel_label: Option<String>,
    pub always_on_top: bool,
    pub no_taskbar: bool,
    pub output_prefix_ok: String,
    pub output_prefix_err: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Forms {
        options: GeneralOptions,
        args: Vec<FormArg>,
    },
}

/// Parses the process arguments.
pub fn parse_env() -> Result<Command, Error> {
    parse(lexopt::Parser::from_env())
}

/// Parses `args`, which must not include the program name.
pub fn parse_args<I>(args: I) -> Result<Command, Error>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    parse(lexopt::Parser::from_args(args))
}

fn parse(mut parser: lexopt::Parser) -> Result<Command, Error> {
    let mut options = GeneralOptions::default();
    let mut args = Vec::new();
    let mut forms = false;

    while let Some(arg) = parser.next()? {
        match arg {
            Long("help") | Short('h') => return Ok(Command::Help),
            Long("version") => return Ok(Command::Version),

            Long("forms") => forms = true,

            Long("title") => options.title = Some(parser.value()?.string()?),
            Long("width") => options.width = Some(positive("width", &parser.value()?.string()?)?),
            Long("height") => options.height = Some(positive("height", &parser.value()?.string()?)?),
            Long("timeout") => {
                options.timeout = Some(positive("timeout", &parser.value()?.string()?)?.into());
            }
            Long("ok-label") => options.ok_label = Some(parser.value()?.string()?),
            Long("cancel-label") => options.cancel_label = Some(parser.value()?.string()?),
            Long("always-on-top") => options.always_on_top = true,
            Long("no-taskbar") => options.no_taskbar = true,
            Long("output-prefix-ok") => options.output_prefix_ok = parser.value()?.string()?,
            Long("output-prefix-err") => options.output_prefix_err = parser.value()?.string()?,

            // Window placement hints without an X11 equivalent here.
            Long("window-icon") | Long("attach") => {
                let ignored = parser.value()?;
                tracing::debug!(?ignored, "ignoring window hint");
            }
            Long("modal") => {}

            Long(name) if OTHER_DIALOGS.contains(&name) => {
                return Err(Error::UnsupportedDialog(name.to_string()));
            }

            Long(name) => {
                let name = name.to_string();
                let value = if takes_value(&name) {
                    Some(parser.value()?.string()?)
                } else {
                    parser.optional_value().map(|v| v.string()).transpose()?
                };
                args.push(FormArg { name, value });
            }

            _ => return Err(arg.unexpected().into()),
        }
    }

    if !forms {
        return Err(Error::Usage("no dialog type given, expected --forms".to_string()));
    }

    Ok(Command::Forms { options, args })
}

fn positive(option: &str, value: &str) -> Result<u32, Error> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Usage(format!(
            "--{option} expects a positive integer, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forms(args: &[&str]) -> (GeneralOptions, Vec<FormArg>) {
        match parse_args(args.iter().copied()).unwrap() {
            Command::Forms { options, args } => (options, args),
            other => panic!("expected forms, got {other:?}"),
        }
    }

    #[test]
    fn splits_general_and_form_options() {
        let (options, args) = forms(&[
            "--forms",
            "--title=Sign up",
            "--width",
            "400",
            "--add-entry=Name",
            "--col1",
            "--add-combo",
            "Size",
        ]);
        assert_eq!(options.title.as_deref(), Some("Sign up"));
        assert_eq!(options.width, Some(400));
        assert_eq!(
            args,
            vec![
                FormArg::new("add-entry", Some("Name")),
                FormArg::new("col1", None),
                FormArg::new("add-combo", Some("Size")),
            ]
        );
    }

    #[test]
    fn values_may_start_with_dashes() {
        let (_, args) = forms(&["--forms", "--add-entry", "--weird--", "--hide"]);
        assert_eq!(args[0].value.as_deref(), Some("--weird--"));
        assert_eq!(args[1], FormArg::new("hide", None));
    }

    #[test]
    fn prefixes_and_flags() {
        let (options, _) = forms(&[
            "--forms",
            "--output-prefix-ok=OK:",
            "--always-on-top",
            "--no-taskbar",
            "--timeout=10",
        ]);
        assert_eq!(options.output_prefix_ok, "OK:");
        assert!(options.always_on_top);
        assert!(options.no_taskbar);
        assert_eq!(options.timeout, Some(10));
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(matches!(
            parse_args(["--forms", "--width=0"]),
            Err(Error::Usage(_))
        ));
        assert!(matches!(
            parse_args(["--forms", "--height=tall"]),
            Err(Error::Usage(_))
        ));
    }

    #[test]
    fn other_dialogs_are_unsupported() {
        match parse_args(["--calendar"]) {
            Err(Error::UnsupportedDialog(name)) => assert_eq!(name, "calendar"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn forms_is_required() {
        assert!(matches!(parse_args(["--add-entry=A"]), Err(Error::Usage(_))));
        assert_eq!(parse_args(["--help"]).unwrap(), Command::Help);
    }
}
