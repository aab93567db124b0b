//! Shared constants for file layout, image normalization, and cleanup policy.

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Original catalog export, read when no backup exists yet
pub const SOURCE_CSV: &str = "products.csv";

/// Slotted-schema backup, preferred on load and rewritten after every mutation
pub const BACKUP_CSV: &str = "products_with_images.csv";

/// Static files served at the web root
pub const PUBLIC_DIR: &str = "public";

/// Canonical image directory (served under /images)
pub const IMAGES_DIR: &str = "public/images";

/// Staging area for raw upload payloads
pub const UPLOADS_DIR: &str = "uploads";

/// URL prefix for served images
pub const IMAGE_ROUTE: &str = "/images";

/// Extension of normalized stored images
pub const IMAGE_EXT: &str = "jpg";

/// Default page size for the listing endpoint
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Bounding box for uploaded images (fit-inside, never upscaled)
pub const MAX_DIMENSION: u32 = 1200;

/// JPEG quality for re-encoded uploads
pub const JPEG_QUALITY: u8 = 82;

/// Slug fallback when a product name folds down to nothing
pub const SLUG_FALLBACK: &str = "product";

/// Number of image slots per product
pub const SLOT_COUNT: usize = 4;

/// Upload payload cap (raw camera exports can be large)
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Staging-file deletion: initial delay before the first attempt
pub const STAGING_DELETE_INITIAL_MS: u64 = 200;

/// Staging-file deletion: delay between retries
pub const STAGING_DELETE_BACKOFF_MS: u64 = 500;

/// Staging-file deletion: attempts before giving up
pub const STAGING_DELETE_ATTEMPTS: u32 = 5;
