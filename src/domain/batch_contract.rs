use serde::{Deserialize, Serialize};

use super::ImageError;

/// Longest edge of a generated image unless overridden via configuration.
pub const DEFAULT_MAX_EDGE: u32 = 4096;
/// Seeds are drawn uniformly from `[0, SEED_UPPER_BOUND)`.
pub const SEED_UPPER_BOUND: u64 = 9_999_999;
pub const MAX_IMAGES_PER_BATCH: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    pub fn square() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    pub fn new(width: u32, height: u32) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::invalid_aspect_ratio(format!(
                "{width}/{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Parses a `"W/H"` descriptor with positive integer components.
    /// Anything else is rejected outright rather than producing non-finite
    /// dimensions downstream.
    pub fn parse(descriptor: &str) -> Result<Self, ImageError> {
        let trimmed = descriptor.trim();
        let Some((width_part, height_part)) = trimmed.split_once('/') else {
            return Err(ImageError::invalid_aspect_ratio(descriptor));
        };

        let width = width_part
            .trim()
            .parse::<u32>()
            .map_err(|_| ImageError::invalid_aspect_ratio(descriptor))?;
        let height = height_part
            .trim()
            .parse::<u32>()
            .map_err(|_| ImageError::invalid_aspect_ratio(descriptor))?;

        Self::new(width, height).map_err(|_| ImageError::invalid_aspect_ratio(descriptor))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn descriptor(&self) -> String {
        format!("{}/{}", self.width, self.height)
    }

    /// Scales the ratio so its longest edge equals `max_edge`; the other edge
    /// is scaled proportionally and rounded to the nearest pixel.
    pub fn dimensions(&self, max_edge: u32) -> ImageDimensions {
        let longest = self.width.max(self.height);
        let scale = f64::from(max_edge) / f64::from(longest);
        ImageDimensions {
            width: (f64::from(self.width) * scale).round() as u32,
            height: (f64::from(self.height) * scale).round() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.width == 0 || self.height == 0 {
            return Err(ImageError::validation(format!(
                "image dimensions must be positive (got {}x{})",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// One form submission: every slot of the batch shares these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub prompt: String,
    pub image_count: u8,
    pub aspect_ratio: AspectRatio,
}

impl BatchRequest {
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.prompt.trim().is_empty() {
            return Err(ImageError::validation("prompt must not be empty"));
        }
        if self.image_count == 0 {
            return Err(ImageError::validation("image count must be at least 1"));
        }
        if self.image_count > MAX_IMAGES_PER_BATCH {
            return Err(ImageError::validation(format!(
                "image count must be at most {MAX_IMAGES_PER_BATCH} (got {})",
                self.image_count
            )));
        }
        Ok(())
    }
}

/// A single generation attempt as issued against the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub seed: u64,
    pub dimensions: ImageDimensions,
}

impl ImageRequest {
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.prompt.trim().is_empty() {
            return Err(ImageError::validation("prompt must not be empty"));
        }
        if self.seed >= SEED_UPPER_BOUND {
            return Err(ImageError::validation(format!(
                "seed must be below {SEED_UPPER_BOUND} (got {})",
                self.seed
            )));
        }
        self.dimensions.validate()
    }
}

/// Resolved image bytes together with the exact URL that produced them, so a
/// download affordance can be bound to the same resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
