pub mod config;
pub mod log;

pub use self::config::ConstraintConfig;
pub use self::log::{LogLevel, LogSink, MemorySink, TracingSink};
