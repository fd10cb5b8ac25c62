pub mod config;
pub mod models;
pub mod payload;
pub mod traits;
pub mod wallet;

pub use config::*;
pub use models::*;
pub use payload::*;
pub use traits::*;
pub use wallet::*;
