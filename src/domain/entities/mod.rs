pub mod alert;
pub mod signal;

pub use alert::{AlertBatch, AlertRecord};
pub use signal::{CommitSignal, JobConclusion, JobResult, SignalSnapshot};
