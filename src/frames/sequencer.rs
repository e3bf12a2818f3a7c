use std::path::PathBuf;
use std::time::Duration;

use crate::foundation::error::{BratError, BratResult};
use crate::foundation::scratch::{remove_best_effort, remove_best_effort_blocking};
use crate::render::backend::{Renderer, render_with_deadline};

/// Word cap and display durations for typed-out videos.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    /// Only the first `max_words` words become frames.
    pub max_words: usize,
    /// Seconds each intermediate frame stays on screen.
    pub frame_secs: f64,
    /// Seconds the final, complete frame stays on screen.
    pub final_secs: f64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            max_words: 40,
            frame_secs: 0.7,
            final_secs: 2.0,
        }
    }
}

impl FrameTiming {
    /// Reject a zero word cap and non-positive durations.
    pub fn validate(&self) -> BratResult<()> {
        if self.max_words == 0 {
            return Err(BratError::validation("max_words must be non-zero"));
        }
        let ok = |s: f64| s.is_finite() && s > 0.0;
        if !ok(self.frame_secs) || !ok(self.final_secs) {
            return Err(BratError::validation(
                "frame durations must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Cumulative word prefixes of `text`, capped at `max_words`.
///
/// Prefix `i` is words `0..=i` joined by single spaces; any run of whitespace counts as one
/// separator.
pub fn word_prefixes(text: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().take(max_words).collect();
    (1..=words.len()).map(|n| words[..n].join(" ")).collect()
}

/// Per-frame display durations for `count` frames: the last one is held longer.
pub fn frame_durations(count: usize, timing: &FrameTiming) -> Vec<f64> {
    let mut out = vec![timing.frame_secs; count];
    if let Some(last) = out.last_mut() {
        *last = timing.final_secs;
    }
    out
}

/// One rendered prefix of a video.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Position in rendering and display order.
    pub index: usize,
    /// The prefix that was rendered.
    pub text: String,
    /// Still image on disk.
    pub path: PathBuf,
    /// Seconds on screen.
    pub duration: f64,
}

/// Frames produced by one video generation.
///
/// Owns the frame files: dropping the set deletes them (best-effort), so every exit path of a
/// generation call, successful or not, leaves no frame behind.
#[derive(Debug, Default)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    fn with_capacity(n: usize) -> Self {
        Self {
            frames: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame was produced.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Delete every frame file now, without blocking the runtime.
    pub async fn remove(mut self) {
        for frame in self.frames.drain(..) {
            remove_best_effort(&frame.path).await;
        }
    }

    fn clear(&mut self) {
        for frame in self.frames.drain(..) {
            remove_best_effort_blocking(&frame.path);
        }
    }
}

impl Drop for FrameSet {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Renders the word prefixes of a text one after another.
#[derive(Clone, Debug, Default)]
pub struct FrameSequencer {
    timing: FrameTiming,
    render_timeout: Option<Duration>,
}

impl FrameSequencer {
    /// Create a sequencer. `render_timeout` bounds each render call.
    pub fn new(timing: FrameTiming, render_timeout: Option<Duration>) -> BratResult<Self> {
        timing.validate()?;
        Ok(Self {
            timing,
            render_timeout,
        })
    }

    /// Word cap and durations in use.
    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    /// Render every prefix of `text` in order.
    ///
    /// Each render completes before the next starts, since later frames extend earlier ones and
    /// the manifest must follow rendering order. Fails with [`BratError::NoFrames`] before any
    /// render when `text` has no words. On a render failure the frames produced so far are
    /// deleted before the error is returned.
    #[tracing::instrument(level = "debug", skip_all, fields(words = tracing::field::Empty))]
    pub async fn render_frames(&self, renderer: &dyn Renderer, text: &str) -> BratResult<FrameSet> {
        let prefixes = word_prefixes(text, self.timing.max_words);
        if prefixes.is_empty() {
            return Err(BratError::NoFrames);
        }
        tracing::Span::current().record("words", prefixes.len());

        let durations = frame_durations(prefixes.len(), &self.timing);
        let mut set = FrameSet::with_capacity(prefixes.len());
        for (index, (prefix, duration)) in prefixes.into_iter().zip(durations).enumerate() {
            let path = render_with_deadline(renderer, &prefix, index, self.render_timeout).await?;
            set.push(Frame {
                index,
                text: prefix,
                path,
                duration,
            });
        }
        Ok(set)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frames/sequencer.rs"]
mod tests;
