//! Core math modules.

pub mod gaussian;
pub mod stable;
