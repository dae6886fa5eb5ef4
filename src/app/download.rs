use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use tempfile::NamedTempFile;

use crate::domain::ImageError;
use crate::infra::image::ImageBytesFetcher;

pub const DOWNLOAD_FALLBACK_FILE_STEM: &str = "image";
pub const DOWNLOAD_FILE_EXTENSION: &str = "jpg";
const DOWNLOAD_FILE_STEM_MAX_CHARS: usize = 40;

/// Derives the saved file name from the user's prompt text: characters
/// outside word characters, whitespace and hyphens are stripped, whitespace
/// runs collapse to a single underscore, the stem is capped at 40 characters
/// and falls back to "image", and the ".jpg" extension is appended
/// regardless of the actual image format.
pub fn sanitize_download_file_name(label: &str) -> String {
    let mut stem = String::new();
    let mut pending_separator = false;

    for ch in label.chars() {
        if ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
            continue;
        }
        if pending_separator {
            stem.push('_');
            pending_separator = false;
        }
        stem.push(ch);
    }
    if pending_separator && !stem.is_empty() {
        stem.push('_');
    }

    let mut stem: String = stem.chars().take(DOWNLOAD_FILE_STEM_MAX_CHARS).collect();
    if stem.is_empty() {
        stem = DOWNLOAD_FALLBACK_FILE_STEM.to_string();
    }

    format!("{stem}.{DOWNLOAD_FILE_EXTENSION}")
}

/// Fetches a resolved image URL and saves it under a sanitized name. The
/// bytes go through a named temp file in the target directory that is only
/// persisted to the final path on success, so no partial file survives a
/// failed download.
pub struct DownloadService {
    fetcher: Arc<dyn ImageBytesFetcher>,
    target_dir: PathBuf,
}

impl DownloadService {
    pub fn new(fetcher: Arc<dyn ImageBytesFetcher>, target_dir: PathBuf) -> Self {
        Self {
            fetcher,
            target_dir,
        }
    }

    pub fn default_target_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn download(&self, image_url: &str, label: &str) -> Result<PathBuf, ImageError> {
        let bytes = self.fetcher.fetch_bytes(image_url)?;
        if bytes.is_empty() {
            return Err(ImageError::decode("downloaded image was empty"));
        }

        fs::create_dir_all(&self.target_dir).map_err(|error| {
            ImageError::internal(format!(
                "could not create download directory {}: {error}",
                self.target_dir.display()
            ))
        })?;

        let file_name = sanitize_download_file_name(label);
        let target_path = self.target_dir.join(&file_name);

        let mut temp_file = NamedTempFile::new_in(&self.target_dir).map_err(|error| {
            ImageError::internal(format!("could not create download temp file: {error}"))
        })?;
        temp_file.write_all(&bytes).map_err(|error| {
            ImageError::internal(format!("could not write download temp file: {error}"))
        })?;
        temp_file.persist(&target_path).map_err(|error| {
            ImageError::internal(format!(
                "could not move download into place at {}: {error}",
                target_path.display()
            ))
        })?;

        Ok(target_path)
    }
}

/// Outcome of one download action, labeled so the UI can report it.
#[derive(Debug)]
pub struct DownloadUpdate {
    pub label: String,
    pub outcome: Result<PathBuf, ImageError>,
}

/// Runs downloads off the UI thread, one at a time, and queues outcomes for
/// the poll loop. Download failures are per-action and never retried.
pub struct DownloadJobManager {
    command_tx: mpsc::Sender<DownloadCommand>,
    shared: Arc<Mutex<VecDeque<DownloadUpdate>>>,
    worker_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl DownloadJobManager {
    pub fn new(service: DownloadService) -> Result<Self, ImageError> {
        let shared = Arc::new(Mutex::new(VecDeque::new()));
        let (command_tx, command_rx) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name("pictor-download-worker".to_string())
            .spawn(move || download_worker_loop(service, command_rx, worker_shared))
            .map_err(|error| {
                ImageError::internal(format!("failed to start download worker thread: {error}"))
            })?;

        Ok(Self {
            command_tx,
            shared,
            worker_handle: Mutex::new(Some(handle)),
        })
    }

    pub fn submit_download(
        &self,
        image_url: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<(), ImageError> {
        self.command_tx
            .send(DownloadCommand::Start {
                image_url: image_url.into(),
                label: label.into(),
            })
            .map_err(|error| {
                ImageError::internal(format!(
                    "failed to submit download to worker queue: {error}"
                ))
            })
    }

    pub fn drain_updates(&self) -> Vec<DownloadUpdate> {
        let mut shared = self.shared.lock().expect("download state lock poisoned");
        shared.drain(..).collect()
    }
}

impl Drop for DownloadJobManager {
    fn drop(&mut self) {
        let _ = self.command_tx.send(DownloadCommand::Shutdown);

        if let Some(handle) = self
            .worker_handle
            .lock()
            .expect("download worker handle lock poisoned")
            .take()
        {
            let _ = handle.join();
        }
    }
}

enum DownloadCommand {
    Start { image_url: String, label: String },
    Shutdown,
}

fn download_worker_loop(
    service: DownloadService,
    command_rx: mpsc::Receiver<DownloadCommand>,
    shared: Arc<Mutex<VecDeque<DownloadUpdate>>>,
) {
    while let Ok(command) = command_rx.recv() {
        match command {
            DownloadCommand::Start { image_url, label } => {
                let outcome = service.download(&image_url, &label);
                shared
                    .lock()
                    .expect("download state lock poisoned during update")
                    .push_back(DownloadUpdate { label, outcome });
            }
            DownloadCommand::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use tempfile::tempdir;

    use crate::domain::ImageError;
    use crate::infra::image::ImageBytesFetcher;

    use super::{
        DownloadJobManager, DownloadService, DownloadUpdate, sanitize_download_file_name,
    };

    struct StaticFetcher {
        bytes: Vec<u8>,
    }

    impl ImageBytesFetcher for StaticFetcher {
        fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, ImageError> {
            Ok(self.bytes.clone())
        }
    }

    struct FailingFetcher;

    impl ImageBytesFetcher for FailingFetcher {
        fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, ImageError> {
            Err(ImageError::Upstream { status: 404 })
        }
    }

    #[test]
    fn sanitize_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(
            sanitize_download_file_name("A dragon! @2024 sleeping..."),
            "A_dragon_2024_sleeping.jpg"
        );
        assert_eq!(sanitize_download_file_name("a red fox"), "a_red_fox.jpg");
        assert_eq!(
            sanitize_download_file_name("snow-covered peak"),
            "snow-covered_peak.jpg"
        );
    }

    #[test]
    fn sanitize_truncates_the_stem_to_forty_characters() {
        let long = "x".repeat(60);
        let name = sanitize_download_file_name(&long);
        assert_eq!(name.len(), 40 + ".jpg".len());
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn sanitize_falls_back_to_image_for_all_punctuation_input() {
        assert_eq!(sanitize_download_file_name("!!!***"), "image.jpg");
        assert_eq!(sanitize_download_file_name(""), "image.jpg");
    }

    #[test]
    fn sanitize_always_appends_the_jpg_extension() {
        assert_eq!(sanitize_download_file_name("photo.png"), "photopng.jpg");
    }

    #[test]
    fn download_writes_bytes_under_the_sanitized_name() {
        let dir = tempdir().expect("temp dir should be created");
        let fetcher = Arc::new(StaticFetcher {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01],
        });
        let service = DownloadService::new(fetcher, dir.path().to_path_buf());

        let path = service
            .download("https://images.test/prompt/x?seed=1", "misty forest!")
            .expect("download should succeed");

        assert_eq!(path, dir.path().join("misty_forest.jpg"));
        assert_eq!(
            fs::read(&path).expect("saved file should be readable"),
            vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01]
        );
    }

    #[test]
    fn failed_download_leaves_no_partial_files_behind() {
        let dir = tempdir().expect("temp dir should be created");
        let service = DownloadService::new(Arc::new(FailingFetcher), dir.path().to_path_buf());

        let error = service
            .download("https://images.test/prompt/x?seed=1", "misty forest")
            .expect_err("fetch failure should fail the download");
        assert!(matches!(error, ImageError::Upstream { status: 404 }));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("target dir should be listable")
            .collect();
        assert!(leftovers.is_empty(), "no temp or partial file may remain");
    }

    #[test]
    fn empty_payloads_are_rejected_as_decode_failures() {
        let dir = tempdir().expect("temp dir should be created");
        let service = DownloadService::new(
            Arc::new(StaticFetcher { bytes: Vec::new() }),
            dir.path().to_path_buf(),
        );

        let error = service
            .download("https://images.test/prompt/x?seed=1", "misty forest")
            .expect_err("empty payload should fail");
        assert!(matches!(error, ImageError::Decode { .. }));
    }

    fn wait_for_updates(manager: &DownloadJobManager, timeout: Duration) -> Vec<DownloadUpdate> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            let updates = manager.drain_updates();
            if !updates.is_empty() {
                return updates;
            }
            thread::sleep(Duration::from_millis(5));
        }

        panic!("no download update arrived within {timeout:?}");
    }

    #[test]
    fn manager_runs_downloads_on_a_background_worker() {
        let dir = tempdir().expect("temp dir should be created");
        let service = DownloadService::new(
            Arc::new(StaticFetcher {
                bytes: vec![1, 2, 3],
            }),
            dir.path().to_path_buf(),
        );
        let manager = DownloadJobManager::new(service).expect("download worker should start");

        manager
            .submit_download("https://images.test/prompt/x?seed=1", "a red fox")
            .expect("submit should succeed");

        let updates = wait_for_updates(&manager, Duration::from_millis(1000));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].label, "a red fox");
        let path = updates[0]
            .outcome
            .as_ref()
            .expect("download should succeed");
        assert_eq!(path, &dir.path().join("a_red_fox.jpg"));
    }

    #[test]
    fn manager_reports_failures_as_updates() {
        let dir = tempdir().expect("temp dir should be created");
        let service = DownloadService::new(Arc::new(FailingFetcher), dir.path().to_path_buf());
        let manager = DownloadJobManager::new(service).expect("download worker should start");

        manager
            .submit_download("https://images.test/prompt/x?seed=1", "a red fox")
            .expect("submit should succeed");

        let updates = wait_for_updates(&manager, Duration::from_millis(1000));
        assert_eq!(updates.len(), 1);
        assert!(matches!(
            updates[0].outcome,
            Err(ImageError::Upstream { status: 404 })
        ));
    }
}
