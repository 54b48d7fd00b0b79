//! Crate-internal building blocks.

pub(crate) mod constants;
pub(crate) mod ring;
