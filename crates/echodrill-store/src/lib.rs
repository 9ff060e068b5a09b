//! On-disk storage of per-item cut plans

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::PlanStore;
