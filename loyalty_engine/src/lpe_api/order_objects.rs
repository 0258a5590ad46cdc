use serde::{Deserialize, Serialize};

use crate::db_types::{OrderStatusType, Points};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadOutcome {
    /// The order number was new and now belongs to the uploader.
    Accepted,
    /// The uploader had already registered this order number. Nothing changed.
    AlreadyUploadedBySelf,
    /// Another user registered this order number first. Nothing changed.
    OwnedByOther,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// The user who owns the order number, which is not necessarily the uploader.
    pub owner: i64,
    pub outcome: UploadOutcome,
}

/// What a single reconciliation of one order against the accrual system did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The accrual system does not know about the order yet.
    NotRegistered,
    /// The report did not move the order, either because nothing changed or because another update got there first.
    Unchanged,
    Advanced { status: OrderStatusType, credited: Points },
}

/// Totals for one pass over the pending orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub pending: usize,
    pub unchanged: usize,
    pub advanced: usize,
    /// Total points credited during the tick.
    pub credited: Points,
    pub failed: usize,
}
