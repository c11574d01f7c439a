pub mod batch_fmt;
