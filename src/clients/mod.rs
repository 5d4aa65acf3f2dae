pub mod identity;
pub mod sheets_client;

pub use identity::{Credentials, IdentityProvider, StaticTokenProvider};
pub use sheets_client::SheetsClient;
