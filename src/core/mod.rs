pub mod config;
pub mod error;
pub mod meal;


pub use config::*;
pub use error::*;
pub use meal::*;
