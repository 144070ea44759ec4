mod data;
pub mod error;

pub use data::Data;
pub use error::Error;
