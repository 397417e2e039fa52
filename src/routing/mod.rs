//! Failover routing.
//!
//! Consumes the economist's recommendation and the traffic controller's
//! verdicts, executes against a primary provider, falls back to a single
//! alternate, and declares explicit blindness when every option is
//! exhausted.

mod outcome;
mod router;
mod trace;

pub use outcome::{BlindnessCause, RoutingOutcome};
pub use router::FailoverRouter;
pub use trace::{RouteAttempt, RouteTrace, SkipReason};
