// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet planning for 2-up layouts.
//
// Cut-and-stack: print every sheet double-sided (flip on the short edge), cut
// the stack down the middle, then put the left half-stack on top of the right
// one. Reading the result front-then-back gives pages in order. For sheet i
// of `sheets = ceil(n / 4)`:
//
//   front_left  = 2i + 1
//   front_right = 2 * sheets + 2i + 1
//   back_left   = 2 * sheets + 2i + 2
//   back_right  = 2i + 2
//
// Positions past the last page are blank.

use quire_core::LayoutMode;
use quire_core::error::{QuireError, Result};
use serde::Serialize;
use tracing::debug;

/// Content of one half of one sheet side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// 1-based logical page number, relative to the start page.
    Page(usize),
    Blank,
}

impl Slot {
    fn for_position(position: usize, page_count: usize) -> Self {
        if position <= page_count {
            Self::Page(position)
        } else {
            Self::Blank
        }
    }

    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Page(n) => Some(*n),
            Self::Blank => None,
        }
    }
}

/// One physical sheet. Sequential plans leave the back side empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub index: usize,
    pub front_left: Slot,
    pub front_right: Slot,
    /// `None` for single-sided (sequential) sheets.
    pub back: Option<(Slot, Slot)>,
}

impl Sheet {
    /// Slots in print order: front left, front right, then back left, back
    /// right when present.
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = vec![self.front_left, self.front_right];
        if let Some((left, right)) = self.back {
            slots.push(left);
            slots.push(right);
        }
        slots
    }

    /// The sides of this sheet as (left, right) pairs, front first.
    pub fn sides(&self) -> Vec<(Slot, Slot)> {
        let mut sides = vec![(self.front_left, self.front_right)];
        sides.extend(self.back);
        sides
    }
}

/// Plan the sheets for the pages from `start_page` (1-based) to
/// `page_count`.
///
/// Slot numbers are logical: slot `k` holds document page
/// `start_page - 1 + k`.
pub fn plan(page_count: usize, mode: LayoutMode, start_page: usize) -> Result<Vec<Sheet>> {
    if start_page < 1 {
        return Err(QuireError::validation("start_page is 1-based"));
    }
    if start_page > page_count {
        return Err(QuireError::validation(format!(
            "start_page {start_page} is past the last page ({page_count})"
        )));
    }
    let n = page_count - start_page + 1;

    let sheets: Vec<Sheet> = match mode {
        LayoutMode::Sequential => (0..n.div_ceil(2))
            .map(|i| Sheet {
                index: i,
                front_left: Slot::for_position(2 * i + 1, n),
                front_right: Slot::for_position(2 * i + 2, n),
                back: None,
            })
            .collect(),
        LayoutMode::CutAndStack => {
            let count = n.div_ceil(4);
            (0..count)
                .map(|i| Sheet {
                    index: i,
                    front_left: Slot::for_position(2 * i + 1, n),
                    front_right: Slot::for_position(2 * count + 2 * i + 1, n),
                    back: Some((
                        Slot::for_position(2 * count + 2 * i + 2, n),
                        Slot::for_position(2 * i + 2, n),
                    )),
                })
                .collect()
        }
    };

    debug!(pages = n, ?mode, sheets = sheets.len(), "Sheet plan computed");
    verify_plan(&sheets, n)?;
    Ok(sheets)
}

/// Check that every logical page appears exactly once and that blanks sit
/// only at positions past the last page.
pub fn verify_plan(sheets: &[Sheet], page_count: usize) -> Result<()> {
    let mut seen = vec![false; page_count];
    for sheet in sheets {
        for slot in sheet.slots() {
            if let Slot::Page(n) = slot {
                let Some(flag) = n.checked_sub(1).and_then(|i| seen.get_mut(i)) else {
                    return Err(QuireError::Internal(format!(
                        "sheet {} references page {n} of {page_count}",
                        sheet.index
                    )));
                };
                if *flag {
                    return Err(QuireError::Internal(format!(
                        "page {n} placed twice (sheet {})",
                        sheet.index
                    )));
                }
                *flag = true;
            }
        }
    }
    if let Some(missing) = seen.iter().position(|placed| !placed) {
        return Err(QuireError::Internal(format!(
            "page {} missing from sheet plan",
            missing + 1
        )));
    }
    Ok(())
}
