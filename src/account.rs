use std::collections::HashMap;

use crate::OtherHasher;
use crate::command::CommandKind;
use crate::history::Record;
use crate::visitor::VisitorId;

// ------------- Role -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Employee,
    Visitor,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "visitor" => Some(Self::Visitor),
            _ => None,
        }
    }
    pub fn permits(&self, kind: CommandKind) -> bool {
        match self {
            Self::Employee => true,
            Self::Visitor => !kind.is_staff_only(),
        }
    }
}

// ------------- History -------------
/// Undo/redo stacks of one account.
#[derive(Debug, Default)]
pub struct History {
    performed: Vec<Record>,
    undone: Vec<Record>,
}

impl History {
    /// A freshly performed command invalidates everything that was undone.
    pub fn performed(&mut self, record: Record) {
        self.performed.push(record);
        self.undone.clear();
    }
    pub fn pop_performed(&mut self) -> Option<Record> {
        self.performed.pop()
    }
    pub fn pop_undone(&mut self) -> Option<Record> {
        self.undone.pop()
    }
    pub fn push_undone(&mut self, record: Record) {
        self.undone.push(record);
    }
    // used by redo, which must not clear what remains undone
    pub fn push_redone(&mut self, record: Record) {
        self.performed.push(record);
    }
    pub fn depth(&self) -> (usize, usize) {
        (self.performed.len(), self.undone.len())
    }
}

// ------------- Account -------------
#[derive(Debug)]
pub struct Account {
    username: String,
    password: String,
    role: Role,
    visitor: Option<VisitorId>,
    history: History,
}

impl Account {
    pub fn new(username: String, password: String, role: Role, visitor: Option<VisitorId>) -> Self {
        Self {
            username,
            password,
            role,
            visitor,
            history: History::default(),
        }
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn role(&self) -> Role {
        self.role
    }
    pub fn visitor(&self) -> Option<VisitorId> {
        self.visitor
    }
    pub fn history(&self) -> &History {
        &self.history
    }
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }
    fn verify(&self, password: &str) -> bool {
        self.password == password
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateRefusal {
    DuplicateUsername,
    DuplicateVisitor,
}

// ------------- AccountStore -------------
#[derive(Debug, Default)]
pub struct AccountStore {
    kept: HashMap<String, Account, OtherHasher>,
    by_visitor: HashMap<VisitorId, String, OtherHasher>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn create(&mut self, account: Account) -> Result<(), CreateRefusal> {
        if self.kept.contains_key(account.username()) {
            return Err(CreateRefusal::DuplicateUsername);
        }
        if let Some(visitor) = account.visitor() {
            if self.by_visitor.contains_key(&visitor) {
                return Err(CreateRefusal::DuplicateVisitor);
            }
            self.by_visitor.insert(visitor, account.username().to_string());
        }
        self.kept.insert(account.username().to_string(), account);
        Ok(())
    }
    /// Both an unknown username and a wrong password come back as `None`.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&Account> {
        self.kept.get(username).filter(|account| account.verify(password))
    }
    pub fn get(&self, username: &str) -> Option<&Account> {
        self.kept.get(username)
    }
    pub fn get_mut(&mut self, username: &str) -> Option<&mut Account> {
        self.kept.get_mut(username)
    }
    pub fn has_visitor(&self, visitor: VisitorId) -> bool {
        self.by_visitor.contains_key(&visitor)
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
