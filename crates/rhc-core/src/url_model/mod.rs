//! URL helpers: log redaction and destination filename hints.

mod path;
mod sanitize;

pub use path::default_filename;
pub use sanitize::{sanitize, sanitize_str};
