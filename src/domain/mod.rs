mod batch_contract;
mod errors;

pub use batch_contract::{
    AspectRatio, BatchRequest, DEFAULT_MAX_EDGE, FetchedImage, ImageDimensions, ImageRequest,
    MAX_IMAGES_PER_BATCH, SEED_UPPER_BOUND,
};
pub use errors::{ImageError, ImageErrorCategory};
