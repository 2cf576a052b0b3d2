#![forbid(unsafe_code)]

mod error;
mod merge;
mod properties;
mod reconstruct;
mod retention;
mod types;

pub use error::*;
pub use merge::*;
pub use properties::*;
pub use reconstruct::*;
pub use retention::*;
pub use types::*;

#[cfg(test)]
mod tests;
