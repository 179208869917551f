//! Collaborator contract: the library table the pipeline reads from.

use crate::error::LoadResult;
use crate::types::{LibraryId, PartName, PartRecord};

/// Enumerates libraries and the parts inside them.
///
/// Called concurrently from worker threads, so implementations must be `Send + Sync`. Calls may
/// block (network, slow disks); the pipeline imposes no timeout.
pub trait LibraryTable: Send + Sync {
    /// Every library nickname the table knows about.
    fn enumerate_library_ids(&self) -> Vec<LibraryId>;

    /// Prepare `lib` for fast enumeration (open a connection, prime a listing cache).
    fn warm(&self, lib: &str) -> LoadResult<()>;

    /// Part names inside `lib`.
    fn enumerate_parts(&self, lib: &str) -> LoadResult<Vec<PartName>>;

    /// Metadata for one part.
    fn lookup_part(&self, lib: &str, name: &str) -> LoadResult<PartRecord>;

    /// Cheap signature over `lib` (or every library when None). Equal signatures mean nothing
    /// changed. Must never return 0.
    fn freshness_signature(&self, lib: Option<&str>) -> i64;
}
