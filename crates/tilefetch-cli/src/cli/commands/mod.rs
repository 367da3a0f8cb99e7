//! Mode handlers.

mod download;
mod verify;

pub use download::run_download;
pub use verify::run_verify;
