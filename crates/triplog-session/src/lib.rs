// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trip session engine for Triplog.
//!
//! Groups canonical samples into trips: the [`TripSession`] state machine,
//! running distance, dilution filtering at termination, and address
//! resolution under a shared daily request budget.

pub mod backoff;
pub mod budget;
pub mod controller;
pub mod dilution;
pub mod distance;
pub mod resolver;
pub mod session;

pub use backoff::RetryBackoff;
pub use budget::RequestBudget;
pub use controller::TripController;
pub use dilution::{BoundingBox, DilutionFilter};
pub use distance::{DistanceAccumulator, EARTH_RADIUS_KM, haversine_km};
pub use resolver::{AddressResolver, Resolution};
pub use session::{StopOutcome, TripSession};
