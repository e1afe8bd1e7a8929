//! Undoable command records.
//!
//! A [`Record`] is what a successful undoable command leaves behind: its kind,
//! the parameters it ran with, and an [`Effect`] capturing everything needed
//! to take it back or perform it again. Reverting and reapplying are plain
//! functions of the effect and the library; they either apply completely or
//! report a conflict and leave the library untouched.

use std::collections::HashMap;

use tracing::debug;

use crate::OtherHasher;
use crate::catalog::Purchase;
use crate::command::CommandKind;
use crate::error::{LibraryError, Result};
use crate::ledger::{Payment, Transaction};
use crate::library::Library;
use crate::visitor::{CompletedVisit, Visit, Visitor, VisitorId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Registered(Visitor),
    Arrived(Visit),
    Departed(CompletedVisit),
    Borrowed {
        visitor: VisitorId,
        lent: Vec<Transaction>,
    },
    Returned {
        visitor: VisitorId,
        returned: Vec<Transaction>,
    },
    Paid(Payment),
    Purchased(Vec<Purchase>),
}

#[derive(Debug, Clone)]
pub struct Record {
    pub kind: CommandKind,
    pub params: String,
    pub effect: Effect,
}

impl Record {
    pub fn new(kind: CommandKind, params: &str, effect: Effect) -> Self {
        Self {
            kind,
            params: params.to_string(),
            effect,
        }
    }
}

/// Takes an effect back.
pub fn revert(effect: &Effect, library: &mut Library) -> Result<()> {
    debug!(?effect, "revert");
    match effect {
        Effect::Registered(visitor) => {
            if library.ledger.has_activity(visitor.id()) || library.accounts.has_visitor(visitor.id()) {
                return Err(LibraryError::Conflict(format!(
                    "visitor {} is already in use",
                    visitor.id()
                )));
            }
            library.visitors.forget(visitor.id()).map(|_| ())
        }
        Effect::Arrived(visit) => library.visitors.withdraw_arrival(visit),
        Effect::Departed(completed) => library.visitors.withdraw_departure(completed),
        Effect::Borrowed { visitor, lent } => {
            library.ledger.revoke_checkout(*visitor, lent, &mut library.catalog)
        }
        Effect::Returned { visitor, returned } => {
            library.ledger.revoke_return(*visitor, returned, &mut library.catalog)
        }
        Effect::Paid(payment) => library.ledger.revoke_payment(payment),
        Effect::Purchased(purchases) => {
            let mut taken: HashMap<&str, u32, OtherHasher> = HashMap::default();
            for purchase in purchases {
                let quantity = taken.entry(purchase.book.isbn.as_str()).or_insert(0);
                *quantity += purchase.quantity;
                if library.catalog.available(&purchase.book.isbn) < *quantity {
                    return Err(LibraryError::Conflict(format!(
                        "copies of {} are lent out",
                        purchase.book.isbn
                    )));
                }
            }
            for purchase in purchases.iter().rev() {
                library.catalog.revoke_purchase(purchase)?;
            }
            Ok(())
        }
    }
}

/// Performs an effect again, exactly as it first happened. Arrivals and
/// checkouts must still pass the rules they passed the first time.
pub fn reapply(effect: &Effect, library: &mut Library) -> Result<()> {
    debug!(?effect, "reapply");
    let now = library.now();
    if matches!(effect, Effect::Arrived(_) | Effect::Borrowed { .. }) && !library.is_open() {
        return Err(LibraryError::Conflict("the library is closed".to_string()));
    }
    match effect {
        Effect::Registered(visitor) => library.visitors.restore(visitor),
        Effect::Arrived(visit) => library.visitors.repeat_arrival(visit),
        Effect::Departed(completed) => library.visitors.repeat_departure(completed),
        Effect::Borrowed { visitor, lent } => {
            library.ledger.repeat_checkout(
            *visitor,
            lent,
            now,
            &mut library.catalog,
            &library.visitors,
        )
        }
        Effect::Returned { visitor, returned } => {
            library.ledger.repeat_return(*visitor, returned, &mut library.catalog)
        }
        Effect::Paid(payment) => library.ledger.repeat_payment(payment, now),
        Effect::Purchased(purchases) => {
            for purchase in purchases {
                library.catalog.restore_purchase(purchase);
            }
            Ok(())
        }
    }
}
