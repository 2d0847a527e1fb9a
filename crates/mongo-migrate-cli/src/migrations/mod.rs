//! Migration units registered into the catalog.
//!
//! Each unit binds a forward/backward transformation to one collection under
//! a fixed reference. The unit's storage name under the migrations root
//! (`<reference>-<timestamp>-<collection>.rs`) pairs the same reference with
//! its creation timestamp; the resolver discovers versions from those names
//! and looks the handler up here.

mod coupons_expiry;
mod users_payment_methods;

use std::sync::Arc;

use mongo_migrate::MigrationCatalog;

/// Catalog of every compiled-in migration unit.
pub fn catalog() -> MigrationCatalog {
    let mut catalog = MigrationCatalog::new();
    catalog.register(Arc::new(users_payment_methods::NormalizePaymentMethods));
    catalog.register(Arc::new(coupons_expiry::DeactivateExpiredCoupons));
    catalog
}
