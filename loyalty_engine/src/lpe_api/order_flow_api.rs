use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType, Points},
    lpe_api::{
        errors::OrderFlowError,
        order_objects::{UploadOutcome, UploadResult},
    },
    traits::{InsertOrderResult, OrderManagement, OrderRegistryError, StatusUpdate},
};

/// `OrderFlowApi` is the primary API for registering the orders customers upload, and for moving them through their
/// lifecycle as the accrual system reports on them.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Registers an order number for `user_id`.
    ///
    /// The number is validated before storage is touched. Uploading the same number twice is not an error: the
    /// outcome says whether the number is new, already belonged to the uploader, or belongs to someone else.
    pub async fn upload_order(&self, number: &str, user_id: i64) -> Result<UploadResult, OrderFlowError> {
        let number = OrderNumber::parse(number).map_err(|e| OrderFlowError::InvalidFormat(e.0))?;
        let result = self.db.insert_order(NewOrder::new(number.clone(), user_id)).await?;
        let upload = match result {
            InsertOrderResult::Inserted(order) => {
                info!("📦️ Order {} uploaded by user #{user_id}", order.number);
                UploadResult { owner: user_id, outcome: UploadOutcome::Accepted }
            },
            InsertOrderResult::DuplicateKey { owner } if owner == user_id => {
                debug!("📦️ User #{user_id} uploaded order {number} again");
                UploadResult { owner, outcome: UploadOutcome::AlreadyUploadedBySelf }
            },
            InsertOrderResult::DuplicateKey { owner } => {
                info!("📦️ User #{user_id} tried to upload order {number}, which belongs to user #{owner}");
                UploadResult { owner, outcome: UploadOutcome::OwnedByOther }
            },
        };
        Ok(upload)
    }

    /// The user's orders, newest first. Empty if the user has never uploaded anything.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("📦️ Fetched {} orders for user #{user_id}", orders.len());
        Ok(orders)
    }

    pub async fn order_by_number(&self, number: &str) -> Result<Order, OrderFlowError> {
        let parsed = OrderNumber::parse(number).map_err(|_| OrderFlowError::NotFound(number.to_string()))?;
        self.db.fetch_order_by_number(&parsed).await?.ok_or_else(|| OrderFlowError::NotFound(number.to_string()))
    }

    /// Orders that are still waiting on the accrual system, oldest first.
    pub async fn pending_orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_pending_orders().await?;
        Ok(orders)
    }

    /// Moves an order forward through its lifecycle. See [`OrderStatusType::valid_predecessors`] for the allowed
    /// transitions. Requests to move an order backwards are refused without touching storage.
    pub async fn advance_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        accrual: Points,
    ) -> Result<StatusUpdate, OrderFlowError> {
        let predecessors = OrderStatusType::valid_predecessors(new_status);
        if predecessors.is_empty() {
            warn!("📦️ Refusing to move order #{order_id} to {new_status}");
            let err = OrderRegistryError::IllegalTransition { from: predecessors.to_vec(), to: new_status };
            return Err(err.into());
        }
        let update = self.db.advance_order_status(order_id, new_status, accrual).await?;
        Ok(update)
    }
}
