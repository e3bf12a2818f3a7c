//! Text to still image.

pub(crate) mod backend;
pub(crate) mod cpu;
pub(crate) mod engine;
pub(crate) mod layout;
