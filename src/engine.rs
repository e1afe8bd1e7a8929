//! The request engine.
//!
//! Input arrives as lines. Lines are framed into requests (a request is
//! complete once a line ends with `;`), each request is routed to the session
//! of the client that sent it, checked against the account bound to that
//! session and finally executed against the library. Requests without a client
//! prefix come from the console, which is logged in as the operator from the
//! start; responses to clients carry the same `<id>,` prefix back.

use tracing::{debug, info, warn};

use crate::account::{Account, Role};
use crate::catalog::BookStore;
use crate::command::{Command, CommandKind, ILLEGAL_COMMAND, INVALID_CLIENT_ID};
use crate::library::Library;
use crate::protocol::{DELIMITER, Frame, frame, respond, split_client};
use crate::session::{CONSOLE, ClientId, SessionKeeper};
use crate::settings::Settings;

pub struct Engine {
    library: Library,
    sessions: SessionKeeper,
}

impl Engine {
    /// Creates the operator account and logs the console in with it.
    pub fn new(mut library: Library, operator: Account) -> Self {
        let username = operator.username().to_string();
        if library.accounts.create(operator).is_err() {
            warn!(%username, "operator account already exists");
        }
        let mut sessions = SessionKeeper::new();
        sessions.bind(CONSOLE, &username);
        info!(%username, now = %library.now(), "engine started");
        Self { library, sessions }
    }
    pub fn from_settings(settings: &Settings, store: Box<dyn BookStore>) -> Self {
        let library = Library::new(
            settings.start_time(),
            settings.hours,
            settings.policy.clone(),
            store,
        );
        let operator = Account::new(
            settings.operator.username.clone(),
            settings.operator.password.clone(),
            Role::Employee,
            None,
        );
        Self::new(library, operator)
    }
    pub fn library(&self) -> &Library {
        &self.library
    }
    pub fn sessions(&self) -> &SessionKeeper {
        &self.sessions
    }
    /// Feeds one line of input. Hands back what is still pending and, if the
    /// line completed a request, the response to it.
    pub fn submit(&mut self, pending: String, line: &str) -> (String, Option<String>) {
        match frame(pending, line) {
            Frame::Partial(pending) => (pending, None),
            Frame::Complete(request) => (String::new(), Some(self.execute(&request))),
        }
    }
    /// Executes one complete request and returns the response.
    pub fn execute(&mut self, request: &str) -> String {
        let (client, body) = split_client(request).unwrap_or((CONSOLE, request));
        if !self.sessions.contains(client) {
            debug!(client, "request from unknown client");
            return INVALID_CLIENT_ID.to_string();
        }
        let command = Command::parse(body);
        debug!(client, command = command.kind().keyword(), "request");
        let response = self.dispatch(client, &command);
        if client == CONSOLE {
            response
        } else {
            format!("{client}{DELIMITER}{response}")
        }
    }
    fn dispatch(&mut self, client: ClientId, command: &Command) -> String {
        if command.kind() == CommandKind::Illegal {
            return ILLEGAL_COMMAND.to_string();
        }
        if let Some(refusal) = self.authorize(client, command) {
            return refusal;
        }
        let outcome = command.execute(&mut self.library, &mut self.sessions, client);
        if let Some(record) = outcome.record {
            let username = self
                .sessions
                .get(client)
                .and_then(|session| session.account())
                .map(str::to_string);
            match username.and_then(|u| self.library.accounts.get_mut(&u)) {
                Some(account) => account.history_mut().performed(record),
                None => warn!(client, "undoable command without an account"),
            }
        }
        outcome.response
    }
    /// `None` when the client may run the command.
    fn authorize(&self, client: ClientId, command: &Command) -> Option<String> {
        let kind = command.kind();
        if kind.is_anonymous() {
            return None;
        }
        let refused = Some(respond(kind.keyword(), "not-authorized"));
        let Some(account) = self
            .sessions
            .get(client)
            .and_then(|session| session.account())
            .and_then(|username| self.library.accounts.get(username))
        else {
            return refused;
        };
        if !account.role().permits(kind) {
            debug!(client, username = account.username(), command = kind.keyword(), "not permitted");
            return refused;
        }
        // visitors act for themselves only
        if account.role() == Role::Visitor {
            if let Some(visitor) = command.visitor_param() {
                if account.visitor() != Some(visitor) {
                    return refused;
                }
            }
        }
        None
    }
}
