// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{Error, Result};
use crate::models::{
    Budget, BudgetLevel, Category, NewNotification, Notification, NotificationPayload, UserId,
};
use crate::store::{BudgetStore, NotificationStore};

/// Attempts at the versioned budget write before giving up.
pub const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Where accumulated spend sits relative to the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    Exceeded { overage: Decimal },
    Nearing,
    Clear,
}

pub fn nearing_line(limit: Decimal) -> Decimal {
    limit * Decimal::new(8, 1)
}

pub fn classify(limit: Decimal, total_spent: Decimal) -> Threshold {
    if total_spent > limit {
        Threshold::Exceeded {
            overage: total_spent - limit,
        }
    } else if total_spent > nearing_line(limit) {
        Threshold::Nearing
    } else {
        Threshold::Clear
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub budget: Budget,
    pub notification: Option<Notification>,
}

/// Folds one confirmed expense into the user's budget for `category`.
///
/// Returns `Ok(None)` when the user has no budget for the category. The
/// spend update and the alert are separate writes; a failed alert leaves
/// the updated budget in place.
pub fn reconcile<B, N>(
    budgets: &B,
    notifications: &N,
    user_id: UserId,
    category: Category,
    amount: Decimal,
) -> Result<Option<Reconciliation>>
where
    B: BudgetStore + ?Sized,
    N: NotificationStore + ?Sized,
{
    if amount < Decimal::ZERO {
        return Err(Error::validation(format!(
            "Expense amount must not be negative, got {}",
            amount
        )));
    }

    let mut attempts = 0;
    let budget = loop {
        let Some(mut budget) = budgets.find_budget(user_id, category, None)? else {
            log::debug!("user {} has no {} budget; spend untracked", user_id, category);
            return Ok(None);
        };
        attempts += 1;
        let new_total = budget.total_spent + amount;
        if budgets.compare_and_set_spent(budget.id, budget.version, new_total)? {
            budget.total_spent = new_total;
            budget.version += 1;
            break budget;
        }
        if attempts >= MAX_UPDATE_ATTEMPTS {
            return Err(Error::Conflict {
                budget_id: budget.id,
                attempts,
            });
        }
        log::debug!(
            "budget {} changed underneath us (attempt {}), retrying",
            budget.id,
            attempts
        );
    };

    let alert = match classify(budget.limit, budget.total_spent) {
        Threshold::Exceeded { overage } => Some((
            BudgetLevel::Exceeded,
            format!(
                "You exceeded your {} budget by {:.2}. Limit: {:.2}, Spent: {:.2}, Balance: {:.2}",
                category,
                overage,
                budget.limit,
                budget.total_spent,
                budget.balance()
            ),
        )),
        Threshold::Nearing => Some((
            BudgetLevel::Nearing,
            format!(
                "You are nearing your {} budget. Limit: {:.2}, Spent: {:.2}, Balance: {:.2}",
                category,
                budget.limit,
                budget.total_spent,
                budget.balance()
            ),
        )),
        Threshold::Clear => None,
    };

    let notification = match alert {
        Some((level, message)) => {
            log::info!(
                "budget {} for user {} is {:?} at {}",
                budget.id,
                user_id,
                level,
                budget.total_spent
            );
            notifications.append(&NewNotification {
                user_id,
                label: category.to_string(),
                message,
                payload: NotificationPayload::Budget {
                    level,
                    limit: budget.limit,
                    total_spent: budget.total_spent,
                    balance_after_spending: budget.balance(),
                },
                dedupe_key: None,
            })?
        }
        None => None,
    };

    Ok(Some(Reconciliation {
        budget,
        notification,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MemStore;
    use crate::models::NewBudget;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn store_with_food_budget(limit: i64) -> MemStore {
        let store = MemStore::default();
        store
            .insert_budget(&NewBudget {
                user_id: 1,
                category: Category::Food,
                limit: dec(limit),
                period: "monthly".into(),
            })
            .unwrap();
        store
    }

    #[test]
    fn threshold_boundaries() {
        assert_eq!(classify(dec(1000), dec(800)), Threshold::Clear);
        assert_eq!(classify(dec(1000), Decimal::new(80001, 2)), Threshold::Nearing);
        assert_eq!(classify(dec(1000), dec(1000)), Threshold::Nearing);
        assert_eq!(
            classify(dec(1000), dec(1050)),
            Threshold::Exceeded { overage: dec(50) }
        );
    }

    #[test]
    fn nearing_then_exceeded() {
        let store = store_with_food_budget(1000);

        let r = reconcile(&store, &store, 1, Category::Food, dec(850))
            .unwrap()
            .unwrap();
        assert_eq!(r.budget.total_spent, dec(850));
        assert_eq!(r.budget.balance(), dec(150));
        let n = r.notification.unwrap();
        assert!(matches!(
            n.payload,
            NotificationPayload::Budget {
                level: BudgetLevel::Nearing,
                ..
            }
        ));

        let r = reconcile(&store, &store, 1, Category::Food, dec(200))
            .unwrap()
            .unwrap();
        assert_eq!(r.budget.total_spent, dec(1050));
        assert_eq!(r.budget.balance(), dec(-50));
        let n = r.notification.unwrap();
        assert!(n.message.contains("by 50.00"));
        match n.payload {
            NotificationPayload::Budget {
                level,
                balance_after_spending,
                ..
            } => {
                assert_eq!(level, BudgetLevel::Exceeded);
                assert_eq!(balance_after_spending, dec(-50));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(store.notification_count(), 2);
    }

    #[test]
    fn below_eighty_percent_is_silent() {
        let store = store_with_food_budget(1000);
        let r = reconcile(&store, &store, 1, Category::Food, dec(100))
            .unwrap()
            .unwrap();
        assert!(r.notification.is_none());
        assert_eq!(store.notification_count(), 0);
    }

    #[test]
    fn no_budget_means_no_action() {
        let store = store_with_food_budget(1000);
        assert!(
            reconcile(&store, &store, 1, Category::Rent, dec(100))
                .unwrap()
                .is_none()
        );
        // another user's Food budget is never touched
        assert!(
            reconcile(&store, &store, 2, Category::Food, dec(100))
                .unwrap()
                .is_none()
        );
        assert_eq!(store.budget(1).total_spent, Decimal::ZERO);
    }

    #[test]
    fn lost_update_is_retried() {
        let store = store_with_food_budget(1000);
        // A concurrent writer lands 100 between our read and our write.
        store.interfere_once(dec(100));
        let r = reconcile(&store, &store, 1, Category::Food, dec(50))
            .unwrap()
            .unwrap();
        assert_eq!(r.budget.total_spent, dec(150));
        assert_eq!(store.budget(1).total_spent, dec(150));
    }

    #[test]
    fn persistent_contention_surfaces_conflict() {
        let store = store_with_food_budget(1000);
        store.always_conflict();
        let err = reconcile(&store, &store, 1, Category::Food, dec(50)).unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict {
                attempts: MAX_UPDATE_ATTEMPTS,
                ..
            }
        ));
    }

    #[test]
    fn negative_amount_rejected_before_mutation() {
        let store = store_with_food_budget(1000);
        assert!(
            reconcile(&store, &store, 1, Category::Food, dec(-5))
                .unwrap_err()
                .is_validation()
        );
        assert_eq!(store.budget(1).version, 0);
    }
}
