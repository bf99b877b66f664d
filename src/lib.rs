pub mod config;
pub mod converter;
pub mod dom;
pub mod error;
pub mod markdown;
pub mod notebook;
pub mod panic_handler;
pub mod parsing;
pub mod test_utils;

pub use config::{CellMarkers, ConverterConfig};
pub use converter::{Diagnostic, NotebookConverter, RunReport, SourceOutcome, SourceReport};
pub use error::ConvertError;
pub use notebook::{CellKind, ExtractedCell, NotebookDocument};
