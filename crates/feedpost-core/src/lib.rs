pub mod ai;
pub mod cancel;
pub mod config;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod selection;
pub mod storage;

pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use selection::SelectionWindow;
