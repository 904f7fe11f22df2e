//! Import and export of designs in the Yosys JSON netlist format.

mod export;
mod import;

pub use export::export;
pub use import::import;

use json::JsonValue;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(json::Error),
    Syntax(String),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<json::Error> for Error {
    fn from(error: json::Error) -> Self {
        Self::Json(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(error) => write!(f, "I/O error: {}", error),
            Error::Json(error) => write!(f, "JSON parse error: {}", error),
            Error::Syntax(near) => write!(f, "syntax error near: {}", near),
        }
    }
}

impl std::error::Error for Error {}

pub(crate) fn syntax_error<T>(near: &JsonValue) -> Result<T, Error> {
    Err(Error::Syntax(near.dump()))
}
