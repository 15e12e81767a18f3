/// Image preview transformation parameters
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageUrlError {
    #[error("file id is empty")]
    EmptyFileId,

    #[error("file id is {0} chars, max is 36")]
    FileIdTooLong(usize),

    #[error("file id contains unsupported characters: {0}")]
    InvalidFileId(String),

    #[error("invalid preview option: {0}")]
    InvalidOption(String),
}

/// Crop anchor used when the source aspect ratio differs from the preview box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gravity {
    Center,
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Gravity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gravity::Center => "center",
            Gravity::TopLeft => "top-left",
            Gravity::Top => "top",
            Gravity::TopRight => "top-right",
            Gravity::Left => "left",
            Gravity::Right => "right",
            Gravity::BottomLeft => "bottom-left",
            Gravity::Bottom => "bottom",
            Gravity::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gravity {
    type Err = StorageUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(Gravity::Center),
            "top-left" => Ok(Gravity::TopLeft),
            "top" => Ok(Gravity::Top),
            "top-right" => Ok(Gravity::TopRight),
            "left" => Ok(Gravity::Left),
            "right" => Ok(Gravity::Right),
            "bottom-left" => Ok(Gravity::BottomLeft),
            "bottom" => Ok(Gravity::Bottom),
            "bottom-right" => Ok(Gravity::BottomRight),
            other => Err(StorageUrlError::InvalidOption(format!("gravity '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewOptions {
    /// Target width in pixels (1..=4000)
    pub width: u32,
    /// Target height in pixels (1..=4000)
    pub height: u32,
    pub gravity: Gravity,
    /// Output quality (0..=100)
    pub quality: u8,
}

impl Default for PreviewOptions {
    /// Post images are served as 2000x2000 top-anchored crops at full quality
    fn default() -> Self {
        Self {
            width: 2000,
            height: 2000,
            gravity: Gravity::Top,
            quality: 100,
        }
    }
}

impl PreviewOptions {
    pub fn validate(&self) -> Result<(), StorageUrlError> {
        if !(1..=4000).contains(&self.width) {
            return Err(StorageUrlError::InvalidOption(format!("width {}", self.width)));
        }
        if !(1..=4000).contains(&self.height) {
            return Err(StorageUrlError::InvalidOption(format!(
                "height {}",
                self.height
            )));
        }
        if self.quality > 100 {
            return Err(StorageUrlError::InvalidOption(format!(
                "quality {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// Query parameters in the order the backend documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("gravity", self.gravity.to_string()),
            ("quality", self.quality.to_string()),
        ]
    }
}
