pub mod record_store;
pub mod save_queue;
pub mod search_reset;

pub use record_store::{RecordStore, SheetsRecordStore, SheetsStoreFactory, StoreFactory};
pub use save_queue::{FlushReport, SaveQueue};
pub use search_reset::{ResetPath, SearchReset};
