//! Pipeline components: queues, error collection, the two worker pools and the coordinator.
//!
//! ```text
//! library ids → [prefetch pool] → warmed ids → [enumerate pool] → parts → sort → Catalog
//! ```

pub mod collector;
pub mod context;
pub mod enumerate;
pub mod error_handler;
pub mod orchestrator;
pub mod prefetch;
pub mod queue;

pub use collector::ErrorCollector;
pub use context::{PipelineState, PipelineTuning};
pub use enumerate::spawn_enumerate_workers;
pub use error_handler::{catch_errors, join_workers};
pub use orchestrator::CatalogLoader;
pub use prefetch::spawn_prefetch_workers;
pub use queue::SyncQueue;
