//! guid - Build form dialogs from the command line.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use guid::cli::{self, Command};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const ERROR_EXIT: u8 = 100;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GUID_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let compact = matches!(
        std::env::var("GUID_LOG_FORMAT").ok().as_deref(),
        Some("compact") | Some("COMPACT")
    );
    if compact {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();

    let command = match cli::parse_env() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("guid: {e}");
            eprintln!("Try 'guid --help' for more information.");
            return ExitCode::from(ERROR_EXIT);
        }
    };

    match command {
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("guid {VERSION}");
            ExitCode::SUCCESS
        }
        Command::Forms {
            options,
            args,
        } => {
            let prefix = options.output_prefix_err.clone();
            match guid::run(options, args) {
                Ok(result) => ExitCode::from(u8::try_from(result.exit_code()).unwrap_or(ERROR_EXIT)),
                Err(e) => {
                    tracing::error!(error = %e, "forms dialog failed");
                    eprintln!("{prefix}guid: {e}");
                    ExitCode::from(ERROR_EXIT)
                }
            }
        }
    }
}

fn print_help() {
    println!(
        r#"guid {VERSION} - Build form dialogs from the command line

USAGE:
    guid --forms [OPTIONS] [FIELDS...]

GENERAL OPTIONS:
    --title=TEXT                Window title
    --width=PX, --height=PX     Window size
    --timeout=SECONDS           Close the dialog after a delay (exit code 5)
    --ok-label=TEXT             Label of the OK button
    --cancel-label=TEXT         Label of the Cancel button
    --always-on-top             Keep the window above others
    --no-taskbar                Keep the window out of the taskbar
    --output-prefix-ok=TEXT     Prefix for lines printed on OK
    --output-prefix-err=TEXT    Prefix for error messages
    -h, --help                  Print this help message
    --version                   Print version information

FIELDS:
    --add-entry=LABEL           --add-password=LABEL
    --add-calendar=LABEL        --add-checkbox=LABEL
    --add-combo=LABEL           --add-list=LABEL
    --add-scale=LABEL           --add-spin-box=LABEL
    --add-double-spin-box=LABEL --add-file-selection=LABEL
    --add-text=TEXT             --add-text-info=LABEL
    --add-text-browser=LABEL    --add-qr-code=LABEL
    --add-menu=LABEL            --add-hrule=COLOR
    --add-vspacer=HEIGHT        --add-hspacer=before|after

LAYOUT:
    --header=TITLE              Open the header (--header=stop=1@ closes it)
    --group=TITLE               Open a framed group (--group=stop=1@ closes it)
    --tab=NAME                  Add a tab (--tab=stop=1@ closes the tab bar)
    --col1, --col2              Put the next field in a column

    Settings go before the text: --group="addLabel=Account@Details"
    Field modifiers follow the field: --add-entry=Name --var=NAME --tooltip=Hint

FORM OPTIONS:
    --text=TEXT                 Label above the form
    --separator=SEP             Separator between printed values
    --forms-date-format=FMT     strftime format for calendar values
    --forms-align=left|center|right
    --no-cancel                 Hide the Cancel button
    --action-after-ok-click=ACTIONS
    --footer-name=TEXT, --footer-entries=N, --footer-from-file=PATH

ENVIRONMENT:
    GUID_LOG, RUST_LOG          Log filter (default: warn)
    GUID_LOG_FORMAT=compact     Compact log lines

EXIT CODES:
    0   OK clicked
    1   Cancel clicked or Escape pressed
    5   Timeout reached
    100 Error occurred
    255 Dialog was closed
    N   Menu item with exit code N clicked
"#
    );
}
