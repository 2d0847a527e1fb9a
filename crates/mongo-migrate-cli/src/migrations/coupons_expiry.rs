//! Deactivate coupons whose expiry date has passed.

use async_trait::async_trait;
use mongo_migrate::{MigrateError, MigrationCtx, MigrationHandler, Result, RunOptions};
use mongodb::bson::{doc, DateTime, Document};
use tracing::warn;

const COLLECTION: &str = "coupons";

/// Reference tag shared by this unit's storage name and its dump snapshots.
const REFERENCE: &str = "pV8sLq0=";

/// Flips `active` off on coupons past their `expireDate`.
pub struct DeactivateExpiredCoupons;

#[async_trait]
impl MigrationHandler for DeactivateExpiredCoupons {
    fn collection(&self) -> &str {
        COLLECTION
    }

    fn reference(&self) -> &str {
        REFERENCE
    }

    async fn migrate(&self, ctx: &MigrationCtx, options: &RunOptions) -> Result<()> {
        let outcomes = ctx
            .bridge()
            .create_dump(&ctx.database_name, &[COLLECTION.to_string()], REFERENCE)
            .await;
        if outcomes.iter().any(|o| !o.is_success()) {
            warn!("snapshot failed, continuing without rollback coverage");
        }

        let coupons = ctx.db.collection::<Document>(COLLECTION);
        let now = DateTime::now();
        // Without --all, only currently-active coupons are touched.
        let filter = if options.all {
            doc! { "expireDate": { "$lt": now } }
        } else {
            doc! { "expireDate": { "$lt": now }, "active": true }
        };

        coupons
            .update_many(filter, doc! { "$set": { "active": false } })
            .await
            .map_err(|e| MigrateError::execution(COLLECTION, e.to_string()))?;
        Ok(())
    }

    async fn rollback(&self, ctx: &MigrationCtx, _options: &RunOptions) -> Result<()> {
        let outcomes = ctx
            .bridge()
            .restore_dump(REFERENCE, &[COLLECTION.to_string()])
            .await;
        for outcome in outcomes {
            if let Some(error) = outcome.error {
                return Err(MigrateError::execution(COLLECTION, error.to_string()));
            }
        }
        Ok(())
    }
}
