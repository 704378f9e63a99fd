// Output formatters
pub mod terminal;

pub use terminal::{truncate_title, CellPreview, TerminalFormatter};
