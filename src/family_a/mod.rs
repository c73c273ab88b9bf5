//! FAMILY-A: the later, simpler image format — a fixed 2048-byte header
//! followed by up to 31 512-byte-aligned package payloads.

pub mod builder;
pub mod extractor;
pub mod header;

pub use builder::build;
pub use extractor::{ExtractOptions, extract};
pub use header::{HeaderA, PkgSlot};
