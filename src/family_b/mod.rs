//! FAMILY-B: the earlier, richer image format — three fixed encrypted boot
//! sections, a setup descriptor, device/system descriptor tables, and
//! zlib-compressed, Pattern-B-scrambled device payloads.
//!
//! Unlike FAMILY-A, this format has no builder: creation is out of scope
//! for FAMILY-B (`--create` is only valid with `--type=np1000`).

pub mod descriptors;
pub mod extractor;

pub use descriptors::{DeviceDescriptor, Setup, SystemDescriptor};
pub use extractor::{ExtractOptions, extract};
