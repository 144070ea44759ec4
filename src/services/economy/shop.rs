use thiserror::Error;
use tracing::info;

use crate::platform::UserId;

use super::ledger::Ledger;

/// Catalog entry. The catalog is fixed; prices are in points.
#[derive(Debug, Clone, Copy)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub price: i64,
}

/// Items purchasable with points. Effects are cosmetic and resolved by the
/// chat frontend; the core only tracks ownership counts.
pub const CATALOG: &[ShopItem] = &[
    ShopItem {
        id: "title_card",
        name: "Custom title card",
        price: 100,
    },
    ShopItem {
        id: "streak_shield",
        name: "Streak shield (1 day)",
        price: 150,
    },
    ShopItem {
        id: "confetti",
        name: "Confetti burst",
        price: 30,
    },
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShopError {
    #[error("no such item")]
    UnknownItem,
    #[error("not enough points")]
    InsufficientPoints,
}

pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.id == id)
}

/// Atomic check-then-debit purchase: the balance check, the debit, and the
/// inventory increment happen under one ledger entry lock.
pub fn purchase(ledger: &Ledger, user: UserId, item_id: &str) -> Result<i64, ShopError> {
    let item = find_item(item_id).ok_or(ShopError::UnknownItem)?;

    let balance = ledger.with(user, |rec| {
        if rec.points < item.price {
            return Err(ShopError::InsufficientPoints);
        }
        rec.points -= item.price;
        *rec.inventory.entry(item.id.to_string()).or_insert(0) += 1;
        Ok(rec.points)
    })?;

    info!(user = user.0, item = item.id, price = item.price, "shop purchase");
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(4);

    #[test]
    fn purchase_debits_and_adds_inventory() {
        let ledger = Ledger::new();
        ledger.credit(USER, 100);
        assert_eq!(purchase(&ledger, USER, "confetti"), Ok(70));
        let rec = ledger.snapshot(USER);
        assert_eq!(rec.inventory.get("confetti"), Some(&1));
    }

    #[test]
    fn insufficient_balance_is_rejected_without_mutation() {
        let ledger = Ledger::new();
        ledger.credit(USER, 10);
        assert_eq!(
            purchase(&ledger, USER, "title_card"),
            Err(ShopError::InsufficientPoints)
        );
        let rec = ledger.snapshot(USER);
        assert_eq!(rec.points, 10);
        assert!(rec.inventory.is_empty());
    }

    #[test]
    fn unknown_items_are_rejected() {
        let ledger = Ledger::new();
        assert_eq!(purchase(&ledger, USER, "nope"), Err(ShopError::UnknownItem));
    }
}
