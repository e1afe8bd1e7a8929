//! Borrowing transactions, fines and payments.
//!
//! Every visitor owns a set of open transactions (books at home) and a set of
//! closed ones (books brought back). A fine is fixed on a transaction when it is
//! closed; open transactions past their due date accrue a fine that is computed
//! on demand from the clock. Payments are kept apart as a running paid total,
//! so the outstanding balance of a visitor is `calculate_fine - paid` and no
//! transaction is ever rewritten by a payment.

use std::collections::HashMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use tracing::warn;

use crate::OtherHasher;
use crate::catalog::Catalog;
use crate::error::{LibraryError, Result};
use crate::visitor::{VisitorId, VisitorRegistry};

// ------------- Policy -------------
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub checkout_days: i64,
    pub max_open_loans: usize,
    pub base_fine: u64,
    pub daily_fine: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            checkout_days: 7,
            max_open_loans: 5,
            base_fine: 8,
            daily_fine: 2,
        }
    }
}

impl Policy {
    /// Nothing is owed for books returned before they are due. From the due
    /// instant on, the base fine plus a daily increment per whole day late.
    pub fn fine(&self, due: NaiveDateTime, returned: NaiveDateTime) -> u64 {
        if returned < due {
            return 0;
        }
        let days_late = u64::try_from((returned - due).num_days()).unwrap_or(0);
        self.base_fine + self.daily_fine * days_late
    }
}

// ------------- Transaction -------------
pub type TransactionId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub isbn: String,
    pub checkout: NaiveDateTime,
    pub due: NaiveDateTime,
    pub returned: Option<NaiveDateTime>,
    pub fine: u64,
}

impl Transaction {
    pub fn is_open(&self) -> bool {
        self.returned.is_none()
    }
    /// The fine as of `now`: fixed once closed, accruing while overdue and open.
    pub fn fine_at(&self, now: NaiveDateTime, policy: &Policy) -> u64 {
        match self.returned {
            Some(_) => self.fine,
            None if now >= self.due => policy.fine(self.due, now),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub visitor: VisitorId,
    pub amount: u64,
    pub at: NaiveDateTime,
}

#[derive(Debug, Default)]
struct Loans {
    open: Vec<Transaction>,
    closed: Vec<Transaction>,
    paid: u64,
}

// ------------- Refusals -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutRefusal {
    OutstandingFine(u64),
    BookLimitExceeded,
    InvalidVisitorId,
    InvalidBookId(String),
    BookNoLongerAvailable(String),
}

impl fmt::Display for CheckoutRefusal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OutstandingFine(amount) => write!(f, "outstanding-fine,{amount}"),
            Self::BookLimitExceeded => write!(f, "book-limit-exceeded"),
            Self::InvalidVisitorId => write!(f, "invalid-visitor-id"),
            Self::InvalidBookId(isbn) => write!(f, "invalid-book-id,{isbn}"),
            Self::BookNoLongerAvailable(isbn) => write!(f, "book-no-longer-available,{isbn}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnRefusal {
    InvalidVisitorId,
    InvalidBookId(String),
}

impl fmt::Display for ReturnRefusal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidVisitorId => write!(f, "invalid-visitor-id"),
            Self::InvalidBookId(isbn) => write!(f, "invalid-book-id,{isbn}"),
        }
    }
}

// ------------- Ledger -------------
#[derive(Debug, Default)]
pub struct Ledger {
    policy: Policy,
    next_id: TransactionId,
    loans: HashMap<VisitorId, Loans, OtherHasher>,
    payments: Vec<Payment>,
}

impl Ledger {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
    pub fn policy(&self) -> &Policy {
        &self.policy
    }
    pub fn open_transactions(&self, visitor: VisitorId) -> &[Transaction] {
        self.loans.get(&visitor).map(|l| l.open.as_slice()).unwrap_or(&[])
    }
    pub fn closed_transactions(&self, visitor: VisitorId) -> &[Transaction] {
        self.loans.get(&visitor).map(|l| l.closed.as_slice()).unwrap_or(&[])
    }
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }
    pub fn has_activity(&self, visitor: VisitorId) -> bool {
        self.loans
            .get(&visitor)
            .is_some_and(|l| !l.open.is_empty() || !l.closed.is_empty() || l.paid > 0)
    }

    // ------------- fines -------------
    pub fn calculate_fine(&self, visitor: VisitorId, now: NaiveDateTime) -> u64 {
        self.loans.get(&visitor).map_or(0, |loans| {
            loans
                .open
                .iter()
                .chain(loans.closed.iter())
                .map(|t| t.fine_at(now, &self.policy))
                .sum()
        })
    }
    pub fn calculate_total_fines(&self, now: NaiveDateTime) -> u64 {
        self.loans.keys().map(|v| self.calculate_fine(*v, now)).sum()
    }
    pub fn paid(&self, visitor: VisitorId) -> u64 {
        self.loans.get(&visitor).map_or(0, |l| l.paid)
    }
    pub fn outstanding(&self, visitor: VisitorId, now: NaiveDateTime) -> u64 {
        self.calculate_fine(visitor, now).saturating_sub(self.paid(visitor))
    }
    pub fn total_outstanding(&self, now: NaiveDateTime) -> u64 {
        self.loans.keys().map(|v| self.outstanding(*v, now)).sum()
    }

    // ------------- checkout -------------
    /// Lends every requested book or none of them.
    pub fn checkout(
        &mut self,
        visitor: VisitorId,
        isbns: &[String],
        now: NaiveDateTime,
        catalog: &mut Catalog,
        registry: &VisitorRegistry,
    ) -> std::result::Result<Vec<Transaction>, CheckoutRefusal> {
        let owed = self.outstanding(visitor, now);
        if owed > 0 {
            return Err(CheckoutRefusal::OutstandingFine(owed));
        }
        if self.open_transactions(visitor).len() + isbns.len() > self.policy.max_open_loans {
            return Err(CheckoutRefusal::BookLimitExceeded);
        }
        if !registry.is_registered(visitor) || !registry.is_present(visitor) {
            return Err(CheckoutRefusal::InvalidVisitorId);
        }
        let mut wanted: HashMap<&str, u32, OtherHasher> = HashMap::default();
        for isbn in isbns {
            if catalog.get(isbn).is_none() {
                return Err(CheckoutRefusal::InvalidBookId(isbn.clone()));
            }
            let count = wanted.entry(isbn.as_str()).or_insert(0);
            *count += 1;
            if catalog.available(isbn) < *count {
                return Err(CheckoutRefusal::BookNoLongerAvailable(isbn.clone()));
            }
        }
        let due = now + Duration::days(self.policy.checkout_days);
        let mut lent = Vec::new();
        for isbn in isbns {
            catalog
                .lend(isbn)
                .map_err(|_| CheckoutRefusal::BookNoLongerAvailable(isbn.clone()))?;
            self.next_id += 1;
            lent.push(Transaction {
                id: self.next_id,
                isbn: isbn.clone(),
                checkout: now,
                due,
                returned: None,
                fine: 0,
            });
        }
        self.loans
            .entry(visitor)
            .or_default()
            .open
            .extend(lent.iter().cloned());
        Ok(lent)
    }

    // ------------- return -------------
    /// Closes one open transaction per requested isbn, oldest first, or none.
    pub fn return_books(
        &mut self,
        visitor: VisitorId,
        isbns: &[String],
        now: NaiveDateTime,
        catalog: &mut Catalog,
        registry: &VisitorRegistry,
    ) -> std::result::Result<Vec<Transaction>, ReturnRefusal> {
        if !registry.is_registered(visitor) {
            return Err(ReturnRefusal::InvalidVisitorId);
        }
        let open = self.open_transactions(visitor);
        let mut picked: Vec<TransactionId> = Vec::new();
        for isbn in isbns {
            let found = open
                .iter()
                .filter(|t| &t.isbn == isbn && !picked.contains(&t.id))
                .min_by_key(|t| (t.checkout, t.id))
                .ok_or_else(|| ReturnRefusal::InvalidBookId(isbn.clone()))?;
            picked.push(found.id);
        }
        let policy = self.policy.clone();
        let loans = self.loans.entry(visitor).or_default();
        let mut closed = Vec::new();
        for id in picked {
            if let Some(position) = loans.open.iter().position(|t| t.id == id) {
                let mut transaction = loans.open.remove(position);
                transaction.returned = Some(now);
                transaction.fine = policy.fine(transaction.due, now);
                // the return still counts when the copy cannot go back on the shelf
                if let Err(e) = catalog.shelve(&transaction.isbn) {
                    warn!(visitor, isbn = %transaction.isbn, error = %e, "returned copy not shelved");
                }
                loans.closed.push(transaction.clone());
                closed.push(transaction);
            }
        }
        Ok(closed)
    }

    // ------------- payments -------------
    /// Records a payment. `None` when the amount is zero or more than is owed.
    pub fn pay(&mut self, visitor: VisitorId, amount: u64, now: NaiveDateTime) -> Option<Payment> {
        if amount == 0 || amount > self.outstanding(visitor, now) {
            return None;
        }
        let payment = Payment {
            visitor,
            amount,
            at: now,
        };
        self.loans.entry(visitor).or_default().paid += amount;
        self.payments.push(payment.clone());
        Some(payment)
    }

    // ------------- history support -------------
    pub fn revoke_checkout(
        &mut self,
        visitor: VisitorId,
        lent: &[Transaction],
        catalog: &mut Catalog,
    ) -> Result<()> {
        let loans = self
            .loans
            .get_mut(&visitor)
            .ok_or_else(|| LibraryError::Conflict(format!("visitor {visitor} has no loans")))?;
        if !lent.iter().all(|t| loans.open.iter().any(|o| o.id == t.id)) {
            return Err(LibraryError::Conflict(format!(
                "books lent to {visitor} were returned since"
            )));
        }
        loans.open.retain(|o| !lent.iter().any(|t| t.id == o.id));
        for transaction in lent {
            catalog.shelve(&transaction.isbn)?;
        }
        Ok(())
    }
    /// Lends the same transactions again, under the rules a fresh checkout
    /// at `now` would have to pass.
    pub fn repeat_checkout(
        &mut self,
        visitor: VisitorId,
        lent: &[Transaction],
        now: NaiveDateTime,
        catalog: &mut Catalog,
        registry: &VisitorRegistry,
    ) -> Result<()> {
        let owed = self.outstanding(visitor, now);
        if owed > 0 {
            return Err(LibraryError::Conflict(format!("visitor {visitor} owes {owed}")));
        }
        if self.open_transactions(visitor).len() + lent.len() > self.policy.max_open_loans {
            return Err(LibraryError::Conflict(format!(
                "visitor {visitor} would exceed the loan limit"
            )));
        }
        if !registry.is_registered(visitor) || !registry.is_present(visitor) {
            return Err(LibraryError::Conflict(format!("visitor {visitor} is not here")));
        }
        ensure_lendable(lent, catalog)?;
        for transaction in lent {
            catalog.lend(&transaction.isbn)?;
        }
        self.loans
            .entry(visitor)
            .or_default()
            .open
            .extend(lent.iter().cloned());
        Ok(())
    }
    pub fn revoke_return(
        &mut self,
        visitor: VisitorId,
        returned: &[Transaction],
        catalog: &mut Catalog,
    ) -> Result<()> {
        ensure_lendable(returned, catalog)?;
        let loans = self
            .loans
            .get_mut(&visitor)
            .ok_or_else(|| LibraryError::Conflict(format!("visitor {visitor} has no loans")))?;
        if !returned.iter().all(|t| loans.closed.iter().any(|c| c.id == t.id)) {
            return Err(LibraryError::Conflict(format!(
                "returns of {visitor} are no longer on record"
            )));
        }
        loans.closed.retain(|c| !returned.iter().any(|t| t.id == c.id));
        for transaction in returned {
            catalog.lend(&transaction.isbn)?;
            loans.open.push(Transaction {
                returned: None,
                fine: 0,
                ..transaction.clone()
            });
        }
        Ok(())
    }
    pub fn repeat_return(
        &mut self,
        visitor: VisitorId,
        returned: &[Transaction],
        catalog: &mut Catalog,
    ) -> Result<()> {
        let loans = self
            .loans
            .get_mut(&visitor)
            .ok_or_else(|| LibraryError::Conflict(format!("visitor {visitor} has no loans")))?;
        if !returned.iter().all(|t| loans.open.iter().any(|o| o.id == t.id)) {
            return Err(LibraryError::Conflict(format!(
                "books of {visitor} are no longer out"
            )));
        }
        loans.open.retain(|o| !returned.iter().any(|t| t.id == o.id));
        for transaction in returned {
            catalog.shelve(&transaction.isbn)?;
            loans.closed.push(transaction.clone());
        }
        Ok(())
    }
    pub fn revoke_payment(&mut self, payment: &Payment) -> Result<()> {
        let position = self
            .payments
            .iter()
            .rposition(|p| p == payment)
            .ok_or_else(|| LibraryError::Conflict("payment is no longer on record".to_string()))?;
        let loans = self
            .loans
            .get_mut(&payment.visitor)
            .ok_or_else(|| LibraryError::Invariant(format!("payer {} has no ledger", payment.visitor)))?;
        loans.paid = loans.paid.saturating_sub(payment.amount);
        self.payments.remove(position);
        Ok(())
    }
    /// Takes the same payment again, as long as it does not exceed what is owed at `now`.
    pub fn repeat_payment(&mut self, payment: &Payment, now: NaiveDateTime) -> Result<()> {
        let owed = self.outstanding(payment.visitor, now);
        if payment.amount > owed {
            return Err(LibraryError::Conflict(format!(
                "payment of {} exceeds the {owed} owed by {}",
                payment.amount, payment.visitor
            )));
        }
        self.loans.entry(payment.visitor).or_default().paid += payment.amount;
        self.payments.push(payment.clone());
        Ok(())
    }
}

fn ensure_lendable(transactions: &[Transaction], catalog: &Catalog) -> Result<()> {
    let mut wanted: HashMap<&str, u32, OtherHasher> = HashMap::default();
    for transaction in transactions {
        let count = wanted.entry(transaction.isbn.as_str()).or_insert(0);
        *count += 1;
        if catalog.available(&transaction.isbn) < *count {
            return Err(LibraryError::Conflict(format!(
                "no copies of {} left",
                transaction.isbn
            )));
        }
    }
    Ok(())
}
