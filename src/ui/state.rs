use std::sync::Arc;

use gpui::ImageFormat;
use pictor::domain::FetchedImage;

use super::SLOT_FAILED_MESSAGE;

/// View model for one gallery position. State is monotonic within a batch:
/// once Succeeded or Failed it never changes until the whole gallery is
/// replaced by the next batch.
#[derive(Clone)]
pub(super) enum GallerySlotState {
    Loading,
    Succeeded {
        image: Arc<gpui::Image>,
        image_url: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Clone)]
pub(super) struct GallerySlot {
    pub(super) index: usize,
    pub(super) state: GallerySlotState,
}

impl GallerySlot {
    pub(super) fn loading(index: usize) -> Self {
        Self {
            index,
            state: GallerySlotState::Loading,
        }
    }

    pub(super) fn failed(index: usize) -> Self {
        Self {
            index,
            state: GallerySlotState::Failed {
                message: SLOT_FAILED_MESSAGE.to_string(),
            },
        }
    }

    pub(super) fn is_terminal(&self) -> bool {
        !matches!(self.state, GallerySlotState::Loading)
    }
}

/// Wraps fetched bytes for gpui rendering. The endpoint serves JPEG unless
/// the content type says otherwise.
pub(super) fn render_image_source(fetched: &FetchedImage) -> Arc<gpui::Image> {
    let format = image_format_for(fetched.content_type.as_deref());
    Arc::new(gpui::Image::from_bytes(format, fetched.bytes.clone()))
}

pub(super) fn image_format_for(content_type: Option<&str>) -> ImageFormat {
    let Some(content_type) = content_type else {
        return ImageFormat::Jpeg;
    };

    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    match normalized.as_str() {
        "image/png" => ImageFormat::Png,
        "image/webp" => ImageFormat::Webp,
        "image/gif" => ImageFormat::Gif,
        "image/bmp" => ImageFormat::Bmp,
        "image/tiff" => ImageFormat::Tiff,
        "image/svg+xml" => ImageFormat::Svg,
        _ => ImageFormat::Jpeg,
    }
}

pub(super) fn gallery_status_label(slots: &[GallerySlot]) -> Option<String> {
    if slots.is_empty() {
        return None;
    }

    let total = slots.len();
    let terminal = slots.iter().filter(|slot| slot.is_terminal()).count();
    let failed = slots
        .iter()
        .filter(|slot| matches!(slot.state, GallerySlotState::Failed { .. }))
        .count();

    if terminal < total {
        return Some(format!("Generating images ({terminal} of {total} done)..."));
    }
    if failed > 0 {
        return Some(format!(
            "{} of {total} images ready, {failed} failed",
            total - failed
        ));
    }
    Some(format!("All {total} images ready"))
}
