pub mod retry;
mod service;
pub mod tasks;

pub use retry::with_retry;
pub use service::{SchedulerEvent, SchedulerService};
pub use tasks::{collect_all_sources, deliver_pending, ingest_candidates, DeliveryReport, IngestReport};
