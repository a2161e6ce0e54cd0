pub mod config;
pub mod error;

pub use config::{load_dotenv, LimiterConfig};
pub use error::*;
