//! Library module for annotated books
//!
//! Resolves device paths, looks up book metadata and assembles books from
//! the device's annotation directory.

mod book;
mod metadata;
mod path;
mod scanner;

pub use book::*;
pub use metadata::*;
pub use path::*;
pub use scanner::*;
