use std::path::Path;

use pictor::domain::{BatchRequest, ImageError};

use super::{DEBUG_PROMPT_LOG_ENV, DEBUG_PROMPT_PREVIEW_CHARS};

pub(super) fn log_batch_submission(request: &BatchRequest) {
    let prompt_chars = request.prompt.chars().count();
    if debug_prompt_log_enabled() {
        let preview = prompt_preview(&request.prompt, DEBUG_PROMPT_PREVIEW_CHARS);
        eprintln!(
            "pictor: submitting batch images={} ratio={} prompt_chars={prompt_chars} prompt_preview={preview:?}",
            request.image_count,
            request.aspect_ratio.descriptor(),
        );
    } else {
        eprintln!(
            "pictor: submitting batch images={} ratio={} prompt_chars={prompt_chars}",
            request.image_count,
            request.aspect_ratio.descriptor(),
        );
    }
}

pub(super) fn log_slot_failure(slot_index: usize, error: Option<&ImageError>) {
    match error {
        Some(error) => eprintln!(
            "pictor: image {} failed after exhausting its retry budget: {error}",
            slot_index + 1
        ),
        None => eprintln!(
            "pictor: image {} failed after exhausting its retry budget",
            slot_index + 1
        ),
    }
}

pub(super) fn log_download_failure(label: &str, error: &ImageError) {
    eprintln!("pictor: download for {label:?} failed: {error}");
}

pub(super) fn log_download_saved(path: &Path) {
    eprintln!("pictor: download saved to {}", path.display());
}

fn debug_prompt_log_enabled() -> bool {
    std::env::var(DEBUG_PROMPT_LOG_ENV)
        .ok()
        .as_deref()
        .is_some_and(parse_truthy_flag)
}

pub(super) fn parse_truthy_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("1")
        || raw.eq_ignore_ascii_case("true")
        || raw.eq_ignore_ascii_case("yes")
        || raw.eq_ignore_ascii_case("on")
}

pub(super) fn prompt_preview(prompt: &str, max_chars: usize) -> String {
    let mut chars = prompt.chars();
    let mut preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        preview.push_str("...");
    }
    preview
}

pub(super) fn display_file_name_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
