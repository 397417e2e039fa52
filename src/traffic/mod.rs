//! Traffic control: rate ceilings and the penalty box.
//!
//! The controller answers one question (may this call proceed right now?)
//! and records one kind of fact: a provider rejected a call we had allowed.
//! Denial is a verdict, never an error.

mod controller;
mod verdict;

pub use controller::TrafficController;
pub use verdict::{EligibilityVerdict, VerdictReason};
