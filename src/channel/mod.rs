pub mod events;
pub mod reporter;

pub use events::{LogLevel, OperatorCommand, RunEvent};
pub use reporter::EventReporter;
