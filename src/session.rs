// used to bind a client to at most one account and an account to at most one client
use bimap::BiMap;

use std::collections::HashMap;

use crate::OtherHasher;
use crate::catalog::BookRecord;

pub type ClientId = u64;

/// The local operator typing requests without a client prefix.
pub const CONSOLE: ClientId = 0;

#[derive(Debug)]
pub struct Session {
    client: ClientId,
    account: Option<String>,
    // numbered results of the last book store search, for buy
    last_search: Vec<BookRecord>,
}

impl Session {
    fn new(client: ClientId) -> Self {
        Self {
            client,
            account: None,
            last_search: Vec::new(),
        }
    }
    pub fn client(&self) -> ClientId {
        self.client
    }
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }
    pub fn last_search(&self) -> &[BookRecord] {
        &self.last_search
    }
    pub fn remember_search(&mut self, results: Vec<BookRecord>) {
        self.last_search = results;
    }
    /// Looks up a book by its 1-based position in the last search.
    pub fn searched(&self, id: &str) -> Option<&BookRecord> {
        let position = id.trim().parse::<usize>().ok()?;
        self.last_search.get(position.checked_sub(1)?)
    }
}

#[derive(Debug)]
pub struct SessionKeeper {
    last_client: ClientId,
    sessions: HashMap<ClientId, Session, OtherHasher>,
    bindings: BiMap<ClientId, String>,
}

impl SessionKeeper {
    /// Starts with the console session in place.
    pub fn new() -> Self {
        let mut sessions = HashMap::default();
        sessions.insert(CONSOLE, Session::new(CONSOLE));
        Self {
            last_client: CONSOLE,
            sessions,
            bindings: BiMap::new(),
        }
    }
    pub fn connect(&mut self) -> ClientId {
        self.last_client += 1;
        let client = self.last_client;
        self.sessions.insert(client, Session::new(client));
        client
    }
    /// Logs out whatever account the client holds and forgets the client.
    pub fn disconnect(&mut self, client: ClientId) -> Option<Session> {
        if client == CONSOLE {
            return None;
        }
        self.bindings.remove_by_left(&client);
        self.sessions.remove(&client)
    }
    pub fn contains(&self, client: ClientId) -> bool {
        self.sessions.contains_key(&client)
    }
    pub fn get(&self, client: ClientId) -> Option<&Session> {
        self.sessions.get(&client)
    }
    pub fn get_mut(&mut self, client: ClientId) -> Option<&mut Session> {
        self.sessions.get_mut(&client)
    }
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
    /// Binds an account to a client. A binding the account held elsewhere is dropped.
    pub fn bind(&mut self, client: ClientId, username: &str) {
        if let Some(previous) = self.bindings.get_by_right(username).copied() {
            if let Some(session) = self.sessions.get_mut(&previous) {
                session.account = None;
            }
        }
        self.bindings.insert(client, username.to_string());
        if let Some(session) = self.sessions.get_mut(&client) {
            session.account = Some(username.to_string());
        }
    }
    /// Returns the account that was bound, if any.
    pub fn unbind(&mut self, client: ClientId) -> Option<String> {
        let (_, username) = self.bindings.remove_by_left(&client)?;
        if let Some(session) = self.sessions.get_mut(&client) {
            session.account = None;
        }
        Some(username)
    }
    pub fn client_of(&self, username: &str) -> Option<ClientId> {
        self.bindings.get_by_right(username).copied()
    }
}

impl Default for SessionKeeper {
    fn default() -> Self {
        Self::new()
    }
}
