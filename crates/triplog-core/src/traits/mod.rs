// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the trip engine.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod geocode;
pub mod storage;

pub use adapter::PluginAdapter;
pub use geocode::GeocodeProvider;
pub use storage::SessionStore;
