pub mod ground_truth;
pub mod images;
pub mod reports;
