pub mod dataset;
pub mod epoch_stats;
pub mod report;
pub mod loop_fn;

pub use dataset::{Dataset, Sample};
pub use epoch_stats::EpochStats;
pub use report::{Report, Series};
pub use loop_fn::{train_loop, DEFAULT_MIN_ERROR};
