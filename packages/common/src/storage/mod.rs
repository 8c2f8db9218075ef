mod error;
mod name;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use name::{MAX_NAME_LEN, NameError, validate_blob_name};
pub use traits::{BlobHandle, BlobStore, BoxReader};
