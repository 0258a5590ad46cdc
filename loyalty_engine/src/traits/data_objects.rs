use crate::db_types::{Order, Points};

/// The result of trying to register a new order number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(Order),
    /// The order number already exists. `owner` is the user that registered it first.
    DuplicateKey { owner: i64 },
}

/// The result of a status advance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The order moved to the new status. `credited` is the amount added to the owner's balance, which is zero unless
    /// the order became `Processed` with a positive accrual.
    Advanced { order: Order, credited: Points },
    /// The order was not in one of the valid predecessor states, usually because another update got there first.
    Unchanged,
}

impl StatusUpdate {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}
