use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderStatusType, Points},
    lpe_api::{
        errors::AccrualSyncError,
        order_objects::{SyncOutcome, TickSummary},
    },
    traits::{AccrualAuthority, AccrualReport, AuthorityStatus, OrderManagement, OrderRegistryError, StatusUpdate},
};

/// `AccrualSyncApi` reconciles pending orders with the external accrual system.
///
/// A tick walks the pending orders one at a time. Failures for a single order are logged and counted, and the order
/// is simply picked up again on the next tick.
pub struct AccrualSyncApi<B, A> {
    db: B,
    authority: A,
}

impl<B, A> Debug for AccrualSyncApi<B, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualSyncApi")
    }
}

impl<B, A> AccrualSyncApi<B, A> {
    pub fn new(db: B, authority: A) -> Self {
        Self { db, authority }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }
}

impl<B, A> AccrualSyncApi<B, A>
where
    B: OrderManagement,
    A: AccrualAuthority,
{
    /// Runs one pass over all pending orders. Only a failure to fetch the pending orders aborts the tick.
    pub async fn run_tick(&self) -> Result<TickSummary, OrderRegistryError> {
        let pending = self.db.fetch_pending_orders().await?;
        let mut summary = TickSummary { pending: pending.len(), ..Default::default() };
        if pending.is_empty() {
            trace!("🔄️ No pending orders");
            return Ok(summary);
        }
        for order in &pending {
            match self.sync_order(order).await {
                Ok(SyncOutcome::NotRegistered | SyncOutcome::Unchanged) => summary.unchanged += 1,
                Ok(SyncOutcome::Advanced { credited, .. }) => {
                    summary.advanced += 1;
                    summary.credited += credited;
                },
                Err(e) if e.is_transient() => {
                    warn!("🔄️ Could not sync order {}. Will retry next tick. {e}", order.number);
                    summary.failed += 1;
                },
                Err(e) => {
                    error!("🔄️ Could not sync order {}. {e}", order.number);
                    summary.failed += 1;
                },
            }
        }
        debug!(
            "🔄️ Tick complete. {} pending, {} advanced, {} unchanged, {} failed. {} points credited",
            summary.pending, summary.advanced, summary.unchanged, summary.failed, summary.credited
        );
        Ok(summary)
    }

    /// Asks the accrual system about one order and applies whatever it reports.
    pub async fn sync_order(&self, order: &Order) -> Result<SyncOutcome, AccrualSyncError> {
        if order.status.is_final() {
            trace!("🔄️ Order {} is already {}. Not asking the accrual system", order.number, order.status);
            return Ok(SyncOutcome::Unchanged);
        }
        let Some(report) = self.authority.fetch_accrual(&order.number).await? else {
            trace!("🔄️ Order {} is not registered with the accrual system yet", order.number);
            return Ok(SyncOutcome::NotRegistered);
        };
        let (target, accrual) = self.interpret(order, report)?;
        if !order.status.can_transition_to(target) {
            trace!("🔄️ Order {} is {} and stays that way", order.number, order.status);
            return Ok(SyncOutcome::Unchanged);
        }
        match self.db.advance_order_status(order.id, target, accrual).await? {
            StatusUpdate::Advanced { order: updated, credited } => {
                info!("🔄️ Order {} is now {}. {credited} points credited", updated.number, updated.status);
                Ok(SyncOutcome::Advanced { status: updated.status, credited })
            },
            StatusUpdate::Unchanged => {
                debug!("🔄️ Order {} was already moved past {} by someone else", order.number, order.status);
                Ok(SyncOutcome::Unchanged)
            },
        }
    }

    fn interpret(&self, order: &Order, report: AccrualReport) -> Result<(OrderStatusType, Points), AccrualSyncError> {
        if report.order != order.number.as_str() {
            return Err(AccrualSyncError::MismatchedReport {
                expected: order.number.to_string(),
                reported: report.order,
            });
        }
        let result = match report.status {
            AuthorityStatus::Registered | AuthorityStatus::Processing => (OrderStatusType::Processing, Points::ZERO),
            AuthorityStatus::Invalid => (OrderStatusType::Invalid, Points::ZERO),
            AuthorityStatus::Processed => {
                let accrual = report.accrual.unwrap_or_default();
                if accrual.is_negative() {
                    return Err(AccrualSyncError::NegativeAccrual(order.number.to_string()));
                }
                (OrderStatusType::Processed, accrual)
            },
        };
        Ok(result)
    }
}
