pub mod providers;
mod summarizer;

pub use providers::Summarizer;
pub use summarizer::{clean_summary, SummaryService};
