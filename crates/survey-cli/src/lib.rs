//! Library side of the `survey` command: logging setup and the analysis table.

pub mod logging;
pub mod scripts;
