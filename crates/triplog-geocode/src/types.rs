// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenCage geocoding API response types.

use serde::Deserialize;

/// Top-level response of the geocoding endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub status: Option<ResponseStatus>,
    pub rate: Option<RateInfo>,
}

/// One candidate place.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    pub formatted: String,
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseStatus {
    pub code: u16,
    pub message: String,
}

/// Quota information sent with every response on metered plans.
#[derive(Debug, Clone, Deserialize)]
pub struct RateInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset: u64,
}
