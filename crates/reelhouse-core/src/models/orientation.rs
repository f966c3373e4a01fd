use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Coarse aspect-ratio bucket of a video, used as the first segment of its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// Buckets a frame size using integer floor division.
    ///
    /// Landscape when `w / 16 == h / 9`, else portrait when `w / 9 == h / 16`,
    /// else other. Near-16:9 sizes land in the same bucket as exact ones.
    pub fn classify(width: u32, height: u32) -> Self {
        if width / 16 == height / 9 {
            Orientation::Landscape
        } else if width / 9 == height / 16 {
            Orientation::Portrait
        } else {
            Orientation::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
