//! XML production and packaging internals

pub mod cell;
pub mod formula;
pub mod package;
pub mod part;
pub mod serial_date;
pub mod shared_strings;
pub mod styles;
pub mod xml;
