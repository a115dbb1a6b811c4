pub mod constants;
pub mod emotion;
pub mod error;
pub mod frame;
pub mod region;
