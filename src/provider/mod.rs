//! Provider driver contract.

mod traits;

pub use traits::ProviderClient;
