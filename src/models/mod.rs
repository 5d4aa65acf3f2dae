pub mod keywords;
pub mod outcome;
pub mod portal;
pub mod record;

pub use keywords::KeywordSet;
pub use outcome::Outcome;
pub use portal::PortalLayout;
pub use record::{Record, RecordFields, Row, RunSummary};
