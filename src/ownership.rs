// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::EngineError;
use crate::models::{
    Category, Investment, InvestmentMovement, Objective, RecurringSchedule, Transaction,
};

/// An entity with a single owning user.
///
/// Shared entities (default categories) are owned by every user. A missing
/// owner id is owned by nobody.
pub trait Owned {
    fn entity_name() -> &'static str;
    fn owner_id(&self) -> Option<&str>;

    fn shared(&self) -> bool {
        false
    }
}

pub fn is_owned<T: Owned>(entity: &T, user_id: &str) -> bool {
    if entity.shared() {
        return true;
    }
    match entity.owner_id() {
        Some(owner) => owner == user_id,
        None => false,
    }
}

/// Mandatory precondition before any calculator or synthesis step touches a
/// source entity.
pub fn assert_owned<T: Owned>(entity: &T, user_id: &str) -> Result<(), EngineError> {
    if is_owned(entity, user_id) {
        Ok(())
    } else {
        Err(EngineError::AccessDenied {
            entity: T::entity_name(),
            user_id: user_id.to_string(),
        })
    }
}

impl Owned for Category {
    fn entity_name() -> &'static str {
        "category"
    }

    fn owner_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn shared(&self) -> bool {
        self.is_default
    }
}

impl Owned for Transaction {
    fn entity_name() -> &'static str {
        "transaction"
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for RecurringSchedule {
    fn entity_name() -> &'static str {
        "recurring schedule"
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for Investment {
    fn entity_name() -> &'static str {
        "investment"
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for InvestmentMovement {
    fn entity_name() -> &'static str {
        "investment movement"
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

impl Owned for Objective {
    fn entity_name() -> &'static str {
        "objective"
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    fn category(user_id: Option<&str>, is_default: bool) -> Category {
        Category {
            id: 1,
            name: "Groceries".into(),
            kind: TransactionKind::Expense,
            color: "#607D8B".into(),
            icon: "tag".into(),
            user_id: user_id.map(|s| s.to_string()),
            is_default,
        }
    }

    #[test]
    fn personal_category_owned_by_its_user_only() {
        let cat = category(Some("alice"), false);
        assert!(is_owned(&cat, "alice"));
        assert!(!is_owned(&cat, "bob"));
    }

    #[test]
    fn default_category_owned_by_everyone() {
        let cat = category(None, true);
        assert!(is_owned(&cat, "alice"));
        assert!(is_owned(&cat, "bob"));
    }

    #[test]
    fn missing_owner_is_never_owned() {
        let cat = category(None, false);
        assert!(!is_owned(&cat, "alice"));
        assert!(assert_owned(&cat, "alice").is_err());
    }

    #[test]
    fn assert_owned_reports_entity_and_user() {
        let cat = category(Some("alice"), false);
        let err = assert_owned(&cat, "bob").unwrap_err();
        assert_eq!(err.to_string(), "user 'bob' does not own this category");
    }
}
