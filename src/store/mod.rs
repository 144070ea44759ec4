mod expiring;

pub use expiring::{ExpiringStore, ExpiryHandle};
