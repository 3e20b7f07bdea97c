//! Helper functions shared by formatters, templates and the server

mod date;
mod url;

pub use date::*;
pub use url::*;
