//! Archive verification
//!
//! Optional deep checks run on each archive right after it is published:
//! the archive is reopened, every entry is read back and the file's SHA-256
//! is recorded in the batch result.

pub mod checksum;
pub mod verify;

pub use checksum::{calculate_checksum_bytes, calculate_file_checksum};
pub use verify::{verify_archive, ArchiveVerification};
