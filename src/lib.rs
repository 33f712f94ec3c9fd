//! guid - Build form dialogs from the command line.
//!
//! The `--forms` option stream is compiled into a [`forms::model::Form`], shown in an
//! X11 window, and the values are printed to stdout the way zenity's forms dialog does.

pub(crate) mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub(crate) mod render;
pub mod ui;

pub use error::Error;
pub use ui::forms::{FormsBuilder, FormsResult};

use cli::GeneralOptions;
use config::Config;
use forms::FormArg;

/// Compiles `args` into a form and shows it.
///
/// # Example
///
/// ```no_run
/// use guid::{cli::GeneralOptions, forms::FormArg};
///
/// let args = vec![FormArg::new("add-entry", Some("Name"))];
/// let result = guid::run(GeneralOptions::default(), args).unwrap();
/// std::process::exit(result.exit_code());
/// ```
pub fn run(options: GeneralOptions, args: Vec<FormArg>) -> Result<FormsResult, Error> {
    let config = Config::load()?;
    let form = forms::compile(args);
    tracing::debug!(fields = form.fields().len(), "compiled form");
    FormsBuilder::new(form).options(options).config(config).show()
}
