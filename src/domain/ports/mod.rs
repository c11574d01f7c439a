pub mod data_source;
pub mod sink;

pub use data_source::{DataSourceError, SignalSource};
pub use sink::{AlertSink, DeliveryError, SinkNamespace};
