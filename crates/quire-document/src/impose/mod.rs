// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Imposition: which page goes where on which sheet, and the composed sheets.

pub mod compose;
pub mod plan;

pub use compose::{SheetCanvas, compose, compose_sheet};
pub use plan::{Sheet, Slot, plan, verify_plan};
