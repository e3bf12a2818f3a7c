//! Frame manifests and video encoding.

pub(crate) mod assembler;
pub(crate) mod ffmpeg;
pub(crate) mod manifest;
