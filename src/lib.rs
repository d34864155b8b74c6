pub mod data_loader;
pub mod merger;
pub mod metrics;
pub mod models;
pub mod stats;
pub mod visualization;

pub use data_loader::DataLoader;
pub use models::{DailyObservation, DegradationModel, DerivedPoint, GhiBand, SummaryStats};
pub use visualization::PerformanceVisualizer;
