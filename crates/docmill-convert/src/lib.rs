//! Bounded headless LibreOffice subprocess supervision.
//!
//! This crate provides:
//! - A command builder for the fixed `soffice` argument contract
//! - A runner that captures output streams in full and enforces a
//!   wall-clock deadline with a forced kill

pub mod command;
pub mod error;

pub use command::{check_soffice, ConvertOutput, ConvertRunner, SofficeCommand};
pub use error::{ConvertError, ConvertResult};
