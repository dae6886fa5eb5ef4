use std::sync::Arc;

use pictor::{
    app::{BatchJobManager, DownloadJobManager, DownloadService, ImageFetchService},
    domain::DEFAULT_MAX_EDGE,
    infra::image::{ImageBytesFetcher, ImageProvider, PollinationsClient, max_edge_from_env},
};

pub(super) struct GalleryBackend {
    pub(super) batch_manager: Arc<BatchJobManager>,
    pub(super) download_manager: Arc<DownloadJobManager>,
    pub(super) startup_notice: Option<String>,
}

/// Wires the image endpoint client into the batch and download workers.
/// Bad environment overrides degrade to defaults with a startup notice
/// instead of refusing to launch.
pub(super) fn build_gallery_backend() -> GalleryBackend {
    let mut notices = Vec::new();

    let client = match PollinationsClient::from_env() {
        Ok(client) => client,
        Err(error) => {
            notices.push(format!(
                "Image endpoint overrides were ignored: {}",
                error.user_message()
            ));
            PollinationsClient::new().expect("default image endpoint client should build")
        }
    };
    let client = Arc::new(client);

    let max_edge = match max_edge_from_env() {
        Ok(Some(max_edge)) => max_edge,
        Ok(None) => DEFAULT_MAX_EDGE,
        Err(error) => {
            notices.push(format!(
                "Max edge override was ignored: {}",
                error.user_message()
            ));
            DEFAULT_MAX_EDGE
        }
    };

    let provider: Arc<dyn ImageProvider> = Arc::clone(&client) as Arc<dyn ImageProvider>;
    let service = ImageFetchService::new(provider);
    let batch_manager = BatchJobManager::with_max_edge(service, max_edge)
        .expect("batch coordinator worker should start");

    let fetcher: Arc<dyn ImageBytesFetcher> = client as Arc<dyn ImageBytesFetcher>;
    let download_service = DownloadService::new(fetcher, DownloadService::default_target_dir());
    let download_manager =
        DownloadJobManager::new(download_service).expect("download worker should start");

    GalleryBackend {
        batch_manager: Arc::new(batch_manager),
        download_manager: Arc::new(download_manager),
        startup_notice: (!notices.is_empty()).then(|| notices.join(" ")),
    }
}
