pub mod run_marker;
pub mod signals;
