// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire core: types, filter settings, DPI policy, and error definitions
// shared across all crates.

pub mod config;
pub mod dpi;
pub mod error;
pub mod filter;
pub mod types;

pub use config::QuireConfig;
pub use dpi::DpiPolicy;
pub use error::{ErrorClass, QuireError};
pub use filter::FilterSettings;
pub use types::*;
