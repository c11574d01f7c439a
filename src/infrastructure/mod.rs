pub mod os;
pub mod sinks;
pub mod sources;
