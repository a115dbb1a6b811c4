pub mod classifier;
pub mod network;
pub mod preprocess;
pub mod weights;
