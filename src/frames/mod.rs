//! Word-by-word frame sequencing for video mode.

pub(crate) mod sequencer;
