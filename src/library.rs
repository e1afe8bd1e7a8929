// ------------- Library -------------
// This sets up the library with the collaborators every command works against.

use chrono::NaiveDateTime;
use tracing::info;

use crate::account::AccountStore;
use crate::catalog::{BookStore, Catalog};
use crate::clock::Clock;
use crate::ledger::{Ledger, Policy};
use crate::state::{Hours, LibraryState};
use crate::visitor::{CompletedVisit, VisitorRegistry};

pub struct Library {
    pub(crate) clock: Clock,
    pub(crate) hours: Hours,
    pub(crate) catalog: Catalog,
    pub(crate) visitors: VisitorRegistry,
    pub(crate) ledger: Ledger,
    pub(crate) accounts: AccountStore,
    pub(crate) store: Box<dyn BookStore>,
}

impl Library {
    pub fn new(start: NaiveDateTime, hours: Hours, policy: Policy, store: Box<dyn BookStore>) -> Self {
        Self {
            clock: Clock::new(start),
            hours,
            catalog: Catalog::new(),
            visitors: VisitorRegistry::new(),
            ledger: Ledger::new(policy),
            accounts: AccountStore::new(),
            store,
        }
    }
    // functions to access the owned collaborators
    pub fn clock(&self) -> &Clock {
        &self.clock
    }
    pub fn hours(&self) -> Hours {
        self.hours
    }
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
    pub fn visitors(&self) -> &VisitorRegistry {
        &self.visitors
    }
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }
    pub fn store(&self) -> &dyn BookStore {
        self.store.as_ref()
    }
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
    pub fn state(&self) -> LibraryState {
        self.hours.state_at(self.clock.now())
    }
    pub fn is_open(&self) -> bool {
        self.state() == LibraryState::Open
    }
    /// Moves the clock forward. Closing time passing along the way sends every
    /// present visitor home at the closing instant.
    pub fn advance(&mut self, days: i64, hours: i64) -> Vec<CompletedVisit> {
        let before = self.clock.advance(days, hours);
        self.observe_closing(before)
    }
    fn observe_closing(&mut self, before: NaiveDateTime) -> Vec<CompletedVisit> {
        match self.hours.closing_between(before, self.clock.now()) {
            Some(closing) => {
                let departed = self.visitors.depart_all(closing);
                info!(%closing, departed = departed.len(), "library closed");
                departed
            }
            None => Vec::new(),
        }
    }
}
