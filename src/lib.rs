#![doc = include_str!("../README.md")]

pub mod bitcodec;
pub mod crc32;
pub mod error;
pub mod family_a;
pub mod family_b;
pub mod fstype;
pub mod hexdump;
pub mod manifest;
pub mod xorcodec;

pub use error::{Error, Result};
