//! Emotion inference pipeline for still images and ordered frame sequences.
//!
//! The pipeline runs face localization, per-face preprocessing, and CNN
//! emotion classification, then assembles per-frame results and optional
//! multi-frame timelines. Transport, persistence, and auth are external
//! collaborator concerns and live outside this crate.

pub mod classification;
pub mod decoding;
pub mod detection;
pub mod pipeline;
pub mod shared;
