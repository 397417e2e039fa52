//! Provider call interface.
//!
//! Vendor-specific drivers (HTTP wrappers for data feeds, news feeds,
//! inference backends) live outside this crate and plug in through this
//! one trait. The router treats every driver polymorphically; it never
//! sees a vendor protocol.

use async_trait::async_trait;

use crate::errors::ProviderCallError;

/// One external provider the router can call.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use provider_governor::provider::ProviderClient;
/// use provider_governor::errors::ProviderCallError;
///
/// struct TickfeedClient {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl ProviderClient for TickfeedClient {
///     fn id(&self) -> &str {
///         "tickfeed-pro"
///     }
///
///     async fn invoke(
///         &self,
///         instructions: &str,
///         payload: &str,
///     ) -> Result<String, ProviderCallError> {
///         // perform the vendor call here
///         # unimplemented!()
///     }
/// }
/// ```
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider identifier; must match the id in its [`crate::config::ProviderSpec`].
    fn id(&self) -> &str;

    /// Execute one call against the provider.
    ///
    /// Drivers should bound their own network deadlines; the router
    /// additionally enforces its configured per-attempt timeout. Map a
    /// 429-equivalent response to [`ProviderCallError::RateLimited`] so the
    /// violation reaches the traffic controller.
    async fn invoke(&self, instructions: &str, payload: &str)
        -> Result<String, ProviderCallError>;
}
