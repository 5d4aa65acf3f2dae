//! 基础设施层
//!
//! 持有稀缺资源（Page），只向上暴露能力

pub mod chromium_driver;
pub mod js_executor;
pub mod page_driver;

pub use chromium_driver::ChromiumDriver;
pub use js_executor::JsExecutor;
pub use page_driver::{ElementState, Locator, PageDriver, WaitPolicy};
