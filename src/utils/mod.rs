pub mod duration;
pub mod formatting;
