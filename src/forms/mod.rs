//! The `--forms` dialog model: argument compilation, value extraction and the helpers
//! they share. Nothing in here touches the display.

pub mod action;
pub mod compiler;
pub mod date;
pub mod footer;
pub mod menu;
pub mod model;
pub mod settings;
pub mod source;
pub mod values;

pub use compiler::{FormArg, compile, takes_value};
pub use model::Form;
pub use values::{collect, print_line};
