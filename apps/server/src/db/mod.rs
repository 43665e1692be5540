//! Database layer

pub mod memory;
pub mod store;
pub mod traits;

pub use memory::InMemoryClinicalStore;
pub use store::PostgresClinicalStore;
pub use traits::ClinicalStore;
