mod batch_job_manager;
mod download;
mod fetch_service;
mod theme_controller;

pub use batch_job_manager::{BatchJobManager, SlotJobState, SlotUpdate};
pub use download::{
    DOWNLOAD_FALLBACK_FILE_STEM, DOWNLOAD_FILE_EXTENSION, DownloadJobManager, DownloadService,
    DownloadUpdate, sanitize_download_file_name,
};
pub use fetch_service::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF, FetchRetryConfig, ImageFetchService,
};
pub use theme_controller::{ThemeController, ThemeMode, ThemePreferenceStore};
