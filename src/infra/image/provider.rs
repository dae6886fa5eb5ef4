use crate::domain::{FetchedImage, ImageError, ImageRequest};

/// Seam for issuing one independent generation attempt against an image
/// endpoint. Implementations must be callable from worker threads.
pub trait ImageProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    fn fetch(&self, request: &ImageRequest) -> Result<FetchedImage, ImageError>;
}

/// Seam for re-fetching an already resolved image URL, used by downloads.
pub trait ImageBytesFetcher: Send + Sync {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}
