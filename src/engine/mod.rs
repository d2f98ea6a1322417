// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget reconciliation, deadline and recurrence monitoring, and reporting.

pub mod goals;
pub mod recurring;
pub mod reconcile;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::{DEFAULT_REMINDER_WINDOW_DAYS, Settings};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Knobs shared by the goal and recurring monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub window_days: i64,
    /// Key notifications by condition so repeated scans do not duplicate them.
    pub dedupe: bool,
    /// Move a missed occurrence's next-due date forward one period.
    pub advance_recurrence: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            window_days: DEFAULT_REMINDER_WINDOW_DAYS,
            dedupe: true,
            advance_recurrence: false,
        }
    }
}

impl From<&Settings> for ScanOptions {
    fn from(s: &Settings) -> Self {
        ScanOptions {
            window_days: s.reminder_window_days,
            dedupe: s.dedupe_notifications,
            advance_recurrence: s.advance_recurrence,
        }
    }
}
