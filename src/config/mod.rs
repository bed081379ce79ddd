pub mod args;
mod structs;
pub mod validators;

pub use args::Args;
pub use structs::*;
