// Catalog persistence: connection pool, store contract, reconciler and lookup.

pub mod catalog;
pub mod db;
pub mod lookup;
pub mod reconcile;
