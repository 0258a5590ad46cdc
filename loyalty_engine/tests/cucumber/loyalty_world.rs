use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use cucumber::World;
use log::*;
use loyalty_engine::{
    db_types::OrderNumber,
    order_objects::UploadOutcome,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    traits::{AccrualAuthority, AccrualAuthorityError, AccrualReport},
    AccrualSyncApi,
    AuthApi,
    LedgerApi,
    LedgerError,
    OrderFlowApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
    pub users: HashMap<String, i64>,
    pub last_upload: Option<UploadOutcome>,
    pub last_withdrawal_error: Option<LedgerError>,
    pub last_upload_rejected: bool,
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("Loyalty system not initialised")
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("User {login} has not registered"))
    }
}

/// An accrual system whose answers are set by the scenario.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAuthority {
    reports: Arc<Mutex<HashMap<String, AccrualReport>>>,
}

impl ScriptedAuthority {
    pub fn set_report(&self, report: AccrualReport) {
        self.reports.lock().expect("Poisoned lock").insert(report.order.clone(), report);
    }
}

impl AccrualAuthority for ScriptedAuthority {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<Option<AccrualReport>, AccrualAuthorityError> {
        Ok(self.reports.lock().expect("Poisoned lock").get(number.as_str()).cloned())
    }
}

#[derive(Debug)]
pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub authority: ScriptedAuthority,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub auth: AuthApi<SqliteDatabase>,
    pub sync: AccrualSyncApi<SqliteDatabase, ScriptedAuthority>,
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let authority = ScriptedAuthority::default();
        Self {
            db_path: url,
            orders: OrderFlowApi::new(db.clone()),
            ledger: LedgerApi::new(db.clone()),
            auth: AuthApi::new(db.clone()),
            sync: AccrualSyncApi::new(db.clone(), authority.clone()),
            authority,
            db,
        }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
