// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource sets and the loader that fills them.

pub mod loader;
pub mod set;

pub use loader::{LoadReport, ResourceLoader, ResourceScope};
pub use set::{FetchOutcome, ResourceKind, ResourceSet, SetState};
