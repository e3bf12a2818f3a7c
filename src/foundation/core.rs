use crate::foundation::error::{BratError, BratResult};

/// Which artifact a request asks for.
///
/// The mode picks the cache namespace; it never contributes to the cache key.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One still PNG of the full text.
    Image,
    /// An MP4 that types the text word by word.
    Video,
}

impl Mode {
    /// Stable lowercase name, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// MIME type of the artifact produced for this mode.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Image => "image/png",
            Self::Video => "video/mp4",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    text: String,
    mode: Mode,
}

impl Request {
    /// Build a request. `text` must be non-empty.
    ///
    /// Whitespace-only text is accepted here; video generation rejects it later with
    /// [`BratError::NoFrames`].
    pub fn new(text: impl Into<String>, mode: Mode) -> BratResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(BratError::validation("text must be non-empty"));
        }
        Ok(Self { text, mode })
    }

    /// Shorthand for [`Mode::Image`].
    pub fn image(text: impl Into<String>) -> BratResult<Self> {
        Self::new(text, Mode::Image)
    }

    /// Shorthand for [`Mode::Video`].
    pub fn video(text: impl Into<String>) -> BratResult<Self> {
        Self::new(text, Mode::Video)
    }

    /// Request text as received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Requested mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }
}
