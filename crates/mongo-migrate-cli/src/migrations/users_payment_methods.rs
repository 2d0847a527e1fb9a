//! Normalize legacy payment-method labels on user documents.

use async_trait::async_trait;
use mongo_migrate::{MigrateError, MigrationCtx, MigrationHandler, Result, RunOptions};
use mongodb::bson::{doc, Document};
use tracing::warn;

const COLLECTION: &str = "users";

/// Reference tag shared by this unit's storage name and its dump snapshots.
const REFERENCE: &str = "tiW3Qk2_";

/// Rewrites the legacy "Abyssinia" payment-method label to "Abyssinia (BOA)".
pub struct NormalizePaymentMethods;

#[async_trait]
impl MigrationHandler for NormalizePaymentMethods {
    fn collection(&self) -> &str {
        COLLECTION
    }

    fn reference(&self) -> &str {
        REFERENCE
    }

    async fn migrate(&self, ctx: &MigrationCtx, options: &RunOptions) -> Result<()> {
        let users = ctx.db.collection::<Document>(COLLECTION);

        let legacy = users
            .count_documents(doc! { "paymentMethod": "Abyssinia" })
            .await
            .map_err(|e| MigrateError::execution(COLLECTION, e.to_string()))?;
        if legacy == 0 && !options.force {
            return Ok(());
        }

        // Snapshot before the destructive rewrite so rollback can restore it.
        let outcomes = ctx
            .bridge()
            .create_dump(&ctx.database_name, &[COLLECTION.to_string()], REFERENCE)
            .await;
        if outcomes.iter().any(|o| !o.is_success()) {
            warn!("snapshot failed, continuing without rollback coverage");
        }

        users
            .update_many(
                doc! { "paymentMethod": "Abyssinia" },
                doc! { "$set": { "paymentMethod": "Abyssinia (BOA)" } },
            )
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
