//! Shared constants/defaults for things
//!

/// The default place we put generated images
pub const DEFAULT_IMAGE_DIR: &str = "./images";

/// URL path segment stored images are served under
pub const IMAGE_ROUTE: &str = "images";

/// Header carrying the authenticated owner identifier, set by the upstream auth layer
pub const X_OWNER_ID: &str = "x-owner-id";

/// Longest accepted owner identifier
pub const MAX_OWNER_ID_LENGTH: usize = 128;

/// Generations per batch unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Upper bound on a single batch request
pub const MAX_BATCH_SIZE: usize = 10;

/// Items per page when listing
pub const DEFAULT_PAGE_SIZE: u64 = 12;

/// Largest page a listing may request
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default image model for the OpenAI Images API
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";

#[cfg(test)]
/// Owner id used in tests
pub const TEST_OWNER: &str = "owner-test";
