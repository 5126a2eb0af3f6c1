mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from fumarole_localization for tests
pub use fumarole_localization::{
    AlgorithmEvaluator, BoundingBox, Config, Contour, FumaroleDetection, FumaroleDetector,
    FumaroleType, GroundTruthAnnotation,
};
