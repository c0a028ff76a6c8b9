pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod providers;
pub mod quiz;
pub mod report;
pub mod select;
pub mod storage;
pub mod timestamp;
