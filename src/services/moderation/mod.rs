mod blocklist;
mod mute;
mod throttle;
mod warnings;

pub use blocklist::Blocklist;
pub use mute::{mute_user, unmute_user};
pub use throttle::{SpamTracker, Verdict};
pub use warnings::{add_warning, remove_warning, WarningOutcome};
