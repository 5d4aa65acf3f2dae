pub mod connection;
pub mod headless;
pub mod session;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_browser;
pub use session::{ChromiumSessionFactory, Session, SessionFactory};
