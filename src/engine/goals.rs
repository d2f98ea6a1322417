// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};

use super::{SECONDS_PER_DAY, ScanOptions};
use crate::errors::Result;
use crate::models::{Goal, NewNotification, Notification, NotificationPayload, UserId};
use crate::store::{GoalStore, NotificationStore};

/// Whole days until `deadline` (taken at 00:00 UTC), rounded up.
pub fn days_left(deadline: NaiveDate, now: DateTime<Utc>) -> i64 {
    let deadline = deadline.and_time(chrono::NaiveTime::MIN).and_utc();
    let secs = (deadline - now).num_seconds();
    let days = secs.div_euclid(SECONDS_PER_DAY);
    if secs.rem_euclid(SECONDS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

fn reminder_for(goal: &Goal, days: i64, dedupe: bool) -> NewNotification {
    let unit = if days == 1 { "day" } else { "days" };
    NewNotification {
        user_id: goal.user_id,
        label: goal.name.clone(),
        message: format!(
            "Reminder: your goal '{}' is due in {} {} ({:.2}% reached).",
            goal.name,
            days,
            unit,
            goal.progress()
        ),
        payload: NotificationPayload::Goal {
            goal_id: goal.id,
            goal_name: goal.name.clone(),
            days_left: days,
            deadline: goal.deadline,
        },
        dedupe_key: dedupe.then(|| format!("goal:{}:{}", goal.id, goal.deadline)),
    }
}

/// Emits a reminder for every goal of `user_id` due within the window.
pub fn scan_deadlines<G, N>(
    goals: &G,
    notifications: &N,
    user_id: UserId,
    now: DateTime<Utc>,
    opts: ScanOptions,
) -> Result<Vec<Notification>>
where
    G: GoalStore + ?Sized,
    N: NotificationStore + ?Sized,
{
    let mut emitted = Vec::new();
    for goal in goals.list_goals(user_id)? {
        let days = days_left(goal.deadline, now);
        if days <= 0 || days > opts.window_days {
            continue;
        }
        if let Some(n) = notifications.append(&reminder_for(&goal, days, opts.dedupe))? {
            emitted.push(n);
        }
    }
    log::info!(
        "goal scan for user {} emitted {} reminder(s)",
        user_id,
        emitted.len()
    );
    Ok(emitted)
}
