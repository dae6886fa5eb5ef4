use pictor::domain::{AspectRatio, BatchRequest, ImageError};

use super::{
    ASPECT_RATIO_CHOICES, DEFAULT_ASPECT_RATIO, DEFAULT_IMAGE_COUNT, DEFAULT_PROMPT,
    IMAGE_COUNT_CHOICES,
};

/// Holds the selector state of the prompt form and turns a submission into a
/// validated batch request.
#[derive(Debug, Clone)]
pub(super) struct BatchSubmissionModel {
    image_count: u8,
    aspect_ratio: &'static str,
}

impl BatchSubmissionModel {
    pub(super) fn new() -> Self {
        Self {
            image_count: DEFAULT_IMAGE_COUNT,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
        }
    }

    pub(super) fn image_count(&self) -> u8 {
        self.image_count
    }

    pub(super) fn set_image_count(&mut self, count: u8) {
        if IMAGE_COUNT_CHOICES.contains(&count) {
            self.image_count = count;
        }
    }

    pub(super) fn aspect_ratio_choice(&self) -> &'static str {
        self.aspect_ratio
    }

    pub(super) fn set_aspect_ratio(&mut self, choice: &'static str) {
        if ASPECT_RATIO_CHOICES.contains(&choice) {
            self.aspect_ratio = choice;
        }
    }

    /// An empty prompt falls back to the default prompt rather than failing;
    /// the remaining contract checks still run.
    pub(super) fn prepare_request(&self, prompt_text: &str) -> Result<BatchRequest, ImageError> {
        let request = BatchRequest {
            prompt: normalize_prompt(prompt_text),
            image_count: self.image_count,
            aspect_ratio: AspectRatio::parse(self.aspect_ratio)?,
        };
        request.validate()?;
        Ok(request)
    }
}

pub(super) fn normalize_prompt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        trimmed.to_string()
    }
}
