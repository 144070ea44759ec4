mod checkin;
mod ledger;
mod shop;

pub use checkin::{check_in, roll_daily, CheckInError, CheckInOutcome};
pub use ledger::{Achievement, GameOutcome, GameRecord, GameStats, Ledger, UserRecord};
pub use shop::{find_item, purchase, ShopError, ShopItem, CATALOG};
