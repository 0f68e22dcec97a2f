// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! W1/W3 expiry resolution over an append-only log of observed contract expiries.

mod calendar;
mod error;
mod observed;
mod service;

pub use calendar::ExpiryRule;
pub use error::ExpiryError;
pub use observed::{ObservedExpiryLog, RejectedObservation, ScanOutcome};
pub use service::{ExpiryService, ImpactedExpiries, ImpactedExpiry, WindowFailure, WindowResolution};
