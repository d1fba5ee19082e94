pub mod analytics;
pub mod calculation;
pub mod config;
pub mod enums;
pub mod page;

pub use analytics::*;
pub use calculation::*;
pub use config::*;
pub use enums::*;
pub use page::*;
