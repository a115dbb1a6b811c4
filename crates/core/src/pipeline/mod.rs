pub mod frame_analyzer;
pub mod handle;
pub mod response;
pub mod timeline;
