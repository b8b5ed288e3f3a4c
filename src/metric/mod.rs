pub mod metric_type;

pub use metric_type::MetricType;
