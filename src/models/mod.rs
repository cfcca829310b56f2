/// ML модели

pub mod artifacts;
pub mod evaluation;
pub mod pipeline;
pub mod random_forest;
pub mod trainer;

pub use artifacts::ArtifactPair;
pub use evaluation::ClassificationReport;
pub use pipeline::Pipeline;
pub use random_forest::RandomForest;
