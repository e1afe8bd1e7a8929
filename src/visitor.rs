// other keepers use HashMap
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDateTime};

use crate::OtherHasher;
use crate::error::{LibraryError, Result};

// ------------- VisitorId -------------
pub type VisitorId = u64;

pub const FIRST_VISITOR: VisitorId = 1_000_000_000;

#[derive(Debug)]
pub struct VisitorIdGenerator {
    next: VisitorId,
}

impl VisitorIdGenerator {
    pub fn new() -> Self {
        Self { next: FIRST_VISITOR }
    }
    pub fn generate(&mut self) -> VisitorId {
        let id = self.next;
        self.next += 1;
        id
    }
    // Identities handed back by a redo must never be generated again.
    pub fn retain(&mut self, id: VisitorId) {
        if id >= self.next {
            self.next = id + 1;
        }
    }
}

impl Default for VisitorIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Visitor -------------
#[derive(Debug, Clone, Eq)]
pub struct Visitor {
    id: VisitorId,
    first_name: String,
    last_name: String,
    address: String,
    phone: String,
    registered: NaiveDateTime,
}

impl Visitor {
    pub fn new(
        id: VisitorId,
        first_name: String,
        last_name: String,
        address: String,
        phone: String,
        registered: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            address,
            phone,
            registered,
        }
    }
    pub fn id(&self) -> VisitorId {
        self.id
    }
    pub fn first_name(&self) -> &str {
        &self.first_name
    }
    pub fn last_name(&self) -> &str {
        &self.last_name
    }
    pub fn address(&self) -> &str {
        &self.address
    }
    pub fn phone(&self) -> &str {
        &self.phone
    }
    pub fn registered(&self) -> NaiveDateTime {
        self.registered
    }
}

// Two registrations are the same person when all details match, whatever their ids.
impl PartialEq for Visitor {
    fn eq(&self, other: &Self) -> bool {
        self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.address == other.address
            && self.phone == other.phone
    }
}
impl Hash for Visitor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.first_name.hash(state);
        self.last_name.hash(state);
        self.address.hash(state);
        self.phone.hash(state);
    }
}

// ------------- Visits -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub visitor: VisitorId,
    pub start: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedVisit {
    pub visitor: VisitorId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CompletedVisit {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitRefusal {
    InvalidId,
    Duplicate,
}

impl fmt::Display for VisitRefusal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "invalid-id"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

// ------------- VisitorRegistry -------------
#[derive(Debug, Default)]
pub struct VisitorRegistry {
    generator: VisitorIdGenerator,
    kept: HashMap<VisitorId, Visitor, OtherHasher>,
    lookup: HashMap<Visitor, VisitorId, OtherHasher>, // double indexing for duplicate detection
    present: HashMap<VisitorId, Visit, OtherHasher>,
    completed: Vec<CompletedVisit>,
}

impl VisitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    /// Registers a visitor, or hands back the structurally equal one already kept.
    pub fn keep(
        &mut self,
        first_name: &str,
        last_name: &str,
        address: &str,
        phone: &str,
        at: NaiveDateTime,
    ) -> (Visitor, bool) {
        let candidate = Visitor::new(
            0,
            first_name.to_string(),
            last_name.to_string(),
            address.to_string(),
            phone.to_string(),
            at,
        );
        if let Some(id) = self.lookup.get(&candidate) {
            if let Some(kept) = self.kept.get(id) {
                return (kept.clone(), true);
            }
        }
        let visitor = Visitor {
            id: self.generator.generate(),
            ..candidate
        };
        self.insert(visitor.clone());
        (visitor, false)
    }
    fn insert(&mut self, visitor: Visitor) {
        self.lookup.insert(visitor.clone(), visitor.id());
        self.kept.insert(visitor.id(), visitor);
    }
    pub fn get(&self, id: VisitorId) -> Option<&Visitor> {
        self.kept.get(&id)
    }
    pub fn is_registered(&self, id: VisitorId) -> bool {
        self.kept.contains_key(&id)
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
    pub fn visitors(&self) -> impl Iterator<Item = &Visitor> {
        self.kept.values()
    }
    /// Forgets a registration. Visitors with a visit on record are kept.
    pub fn forget(&mut self, id: VisitorId) -> Result<Visitor> {
        if self.present.contains_key(&id) || self.completed.iter().any(|v| v.visitor == id) {
            return Err(LibraryError::Conflict(format!("visitor {id} has visited")));
        }
        let visitor = self
            .kept
            .remove(&id)
            .ok_or_else(|| LibraryError::Conflict(format!("visitor {id} is not registered")))?;
        self.lookup.remove(&visitor);
        Ok(visitor)
    }
    /// Puts a forgotten registration back under its original id.
    pub fn restore(&mut self, visitor: &Visitor) -> Result<()> {
        if self.kept.contains_key(&visitor.id()) || self.lookup.contains_key(visitor) {
            return Err(LibraryError::Conflict(format!(
                "visitor {} is registered again",
                visitor.id()
            )));
        }
        self.generator.retain(visitor.id());
        self.insert(visitor.clone());
        Ok(())
    }

    // ------------- presence -------------
    pub fn is_present(&self, id: VisitorId) -> bool {
        self.present.contains_key(&id)
    }
    pub fn completed(&self) -> &[CompletedVisit] {
        &self.completed
    }
    pub fn arrive(&mut self, id: VisitorId, at: NaiveDateTime) -> std::result::Result<Visit, VisitRefusal> {
        if !self.kept.contains_key(&id) {
            return Err(VisitRefusal::InvalidId);
        }
        if self.present.contains_key(&id) {
            return Err(VisitRefusal::Duplicate);
        }
        let visit = Visit { visitor: id, start: at };
        self.present.insert(id, visit);
        Ok(visit)
    }
    pub fn depart(&mut self, id: VisitorId, at: NaiveDateTime) -> std::result::Result<CompletedVisit, VisitRefusal> {
        let visit = self.present.remove(&id).ok_or(VisitRefusal::InvalidId)?;
        let completed = CompletedVisit {
            visitor: id,
            start: visit.start,
            end: at,
        };
        self.completed.push(completed);
        Ok(completed)
    }
    /// Ends every visit at once, as happens when the library closes.
    pub fn depart_all(&mut self, at: NaiveDateTime) -> Vec<CompletedVisit> {
        let mut ids: Vec<VisitorId> = self.present.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.depart(id, at).ok()).collect()
    }
    pub fn withdraw_arrival(&mut self, visit: &Visit) -> Result<()> {
        match self.present.get(&visit.visitor) {
            Some(current) if current == visit => {
                self.present.remove(&visit.visitor);
                Ok(())
            }
            _ => Err(LibraryError::Conflict(format!(
                "visitor {} is no longer on that visit",
                visit.visitor
            ))),
        }
    }
    pub fn repeat_arrival(&mut self, visit: &Visit) -> Result<()> {
        if !self.kept.contains_key(&visit.visitor) || self.present.contains_key(&visit.visitor) {
            return Err(LibraryError::Conflict(format!(
                "visitor {} cannot arrive again",
                visit.visitor
            )));
        }
        self.present.insert(visit.visitor, *visit);
        Ok(())
    }
    pub fn withdraw_departure(&mut self, completed: &CompletedVisit) -> Result<()> {
        if self.present.contains_key(&completed.visitor) {
            return Err(LibraryError::Conflict(format!(
                "visitor {} has arrived again",
                completed.visitor
            )));
        }
        let position = self
            .completed
            .iter()
            .rposition(|v| v == completed)
            .ok_or_else(|| LibraryError::Conflict(format!("visit of {} is gone", completed.visitor)))?;
        self.completed.remove(position);
        self.present.insert(
            completed.visitor,
            Visit {
                visitor: completed.visitor,
                start: completed.start,
            },
        );
        Ok(())
    }
    pub fn repeat_departure(&mut self, completed: &CompletedVisit) -> Result<()> {
        match self.present.get(&completed.visitor) {
            Some(visit) if visit.start == completed.start => {
                self.present.remove(&completed.visitor);
                self.completed.push(*completed);
                Ok(())
            }
            _ => Err(LibraryError::Conflict(format!(
                "visitor {} is not on that visit",
                completed.visitor
            ))),
        }
    }
}
