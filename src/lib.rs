pub mod config;
pub mod detection;
pub mod evaluation;
pub mod io;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod render;

pub use config::{Config, ConfigError};
pub use detection::{DetectorSettings, FumaroleDetectionsPerImage, FumaroleDetector};
pub use evaluation::{
    AlgorithmEvaluation, AlgorithmEvaluator, EvaluationSettings, FumaroleDetectionEvaluation,
    GroundTruthPerImage,
};
pub use models::{BoundingBox, Contour, FumaroleDetection, FumaroleType, GroundTruthAnnotation};
pub use pipeline::{
    DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineLocalizations, PipelineStep,
    StagePayload,
};
