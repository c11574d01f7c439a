pub mod generator;
pub mod pipeline;
pub mod uploader;
