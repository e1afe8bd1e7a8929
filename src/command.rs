//! Command registry, parameter validation and execution.
//!
//! A [`Command`] is a small record: the [`CommandKind`] its keyword maps to and
//! the raw parameter text. Nothing is checked when a command is built;
//! [`Command::check_params`] turns the text into typed [`Params`] and
//! [`Command::execute`] refuses to touch any state unless that succeeds.
//! Successful undoable commands hand a [`Record`] back in their [`Outcome`].

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::{debug, info};

use crate::account::{Account, CreateRefusal, Role};
use crate::catalog::{SearchFilter, SortOrder, TitlePattern, rank};
use crate::clock::{format_date, format_duration, format_time};
use crate::history::{self, Effect, Record};
use crate::library::Library;
use crate::protocol::{self, TERMINATOR, group_members, respond, respond_lines, split_fields};
use crate::report::Report;
use crate::session::{ClientId, SessionKeeper};
use crate::visitor::VisitorId;

// Issued ids start far above zero, so an unparsable id behaves as an unknown one.
const UNKNOWN_VISITOR: VisitorId = 0;

const MAX_ADVANCE_DAYS: i64 = 7;
const MAX_ADVANCE_HOURS: i64 = 23;

pub const ILLEGAL_COMMAND: &str = "illegal-command;";
pub const INVALID_CLIENT_ID: &str = "invalid-client-id;";

// ------------- CommandKind -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Register,
    Arrive,
    Depart,
    Info,
    Borrow,
    Borrowed,
    Return,
    Pay,
    Search,
    Buy,
    Advance,
    Datetime,
    Report,
    Connect,
    Disconnect,
    Login,
    Logout,
    Create,
    Undo,
    Redo,
    Illegal,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, CommandKind> = CommandKind::KNOWN
        .iter()
        .map(|kind| (kind.keyword(), *kind))
        .collect();
}

impl CommandKind {
    pub const KNOWN: [CommandKind; 20] = [
        Self::Register,
        Self::Arrive,
        Self::Depart,
        Self::Info,
        Self::Borrow,
        Self::Borrowed,
        Self::Return,
        Self::Pay,
        Self::Search,
        Self::Buy,
        Self::Advance,
        Self::Datetime,
        Self::Report,
        Self::Connect,
        Self::Disconnect,
        Self::Login,
        Self::Logout,
        Self::Create,
        Self::Undo,
        Self::Redo,
    ];
    pub fn from_keyword(keyword: &str) -> Self {
        KEYWORDS.get(keyword.trim()).copied().unwrap_or(Self::Illegal)
    }
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Arrive => "arrive",
            Self::Depart => "depart",
            Self::Info => "info",
            Self::Borrow => "borrow",
            Self::Borrowed => "borrowed",
            Self::Return => "return",
            Self::Pay => "pay",
            Self::Search => "search",
            Self::Buy => "buy",
            Self::Advance => "advance",
            Self::Datetime => "datetime",
            Self::Report => "report",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Create => "create",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Illegal => "illegal-command",
        }
    }
    /// Commands only staff may run.
    pub fn is_staff_only(self) -> bool {
        matches!(
            self,
            Self::Buy | Self::Search | Self::Create | Self::Advance | Self::Report | Self::Register
        )
    }
    /// Commands a client may run before logging in.
    pub fn is_anonymous(self) -> bool {
        matches!(self, Self::Connect | Self::Disconnect | Self::Login | Self::Logout)
    }
    /// What the parameters should look like, for missing-parameters responses.
    pub fn shape(self) -> &'static str {
        match self {
            Self::Register => "firstName,lastName,address,phone-number",
            Self::Arrive | Self::Depart | Self::Borrowed => "visitorID",
            Self::Info | Self::Search => "title,[{authors},isbn,publisher,sort-order]",
            Self::Borrow | Self::Return => "visitorID,isbn[,isbns]",
            Self::Pay => "visitorID,amount",
            Self::Buy => "quantity,id[,ids]",
            Self::Advance => "number-of-days[,number-of-hours]",
            Self::Report => "[month]",
            Self::Login => "username,password",
            Self::Create => "username,password,role,visitorID",
            _ => "",
        }
    }
}

// ------------- Params -------------
/// Field values of `info` and `search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub title: String,
    pub authors: Vec<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub sort: String,
}

impl Query {
    fn filter(&self) -> Option<SearchFilter> {
        Some(SearchFilter {
            title: TitlePattern::parse(&self.title),
            authors: self.authors.clone(),
            isbn: self.isbn.clone(),
            publisher: self.publisher.clone(),
            sort: SortOrder::parse(&self.sort)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    Register {
        first_name: String,
        last_name: String,
        address: String,
        phone: String,
    },
    Arrive(VisitorId),
    Depart(VisitorId),
    Info(Query),
    Borrow {
        visitor: VisitorId,
        isbns: Vec<String>,
    },
    Borrowed(VisitorId),
    Return {
        visitor: VisitorId,
        isbns: Vec<String>,
    },
    Pay {
        visitor: VisitorId,
        amount: String,
    },
    Search(Query),
    Buy {
        quantity: String,
        ids: Vec<String>,
    },
    Advance {
        days: String,
        hours: Option<String>,
    },
    Datetime,
    Report(Option<String>),
    Connect,
    Disconnect,
    Login {
        username: String,
        password: String,
    },
    Logout,
    Create {
        username: String,
        password: String,
        role: String,
        visitor: Option<String>,
    },
    Undo,
    Redo,
    Illegal,
}

fn visitor_id(field: &str) -> VisitorId {
    field.trim().parse().unwrap_or(UNKNOWN_VISITOR)
}

fn optional(field: Option<&String>) -> Option<String> {
    field
        .map(|f| f.trim())
        .filter(|f| !f.is_empty() && *f != "*")
        .map(str::to_string)
}

fn query(fields: &[String]) -> Query {
    Query {
        title: fields[0].clone(),
        authors: fields.get(1).map(|f| group_members(f)).unwrap_or_default(),
        isbn: optional(fields.get(2)),
        publisher: optional(fields.get(3)),
        sort: fields.get(4).cloned().unwrap_or_default(),
    }
}

// every listed isbn, whether given one by one or as a {group}
fn isbn_list(fields: &[String]) -> Vec<String> {
    fields.iter().flat_map(|f| group_members(f)).collect()
}

// ------------- Command -------------
#[derive(Debug)]
pub struct Outcome {
    pub response: String,
    pub record: Option<Record>,
}

impl Outcome {
    fn reply(response: String) -> Self {
        Self {
            response,
            record: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    params: String,
}

impl Command {
    /// Maps a complete request onto a command. Unknown keywords become `Illegal`.
    pub fn parse(request: &str) -> Self {
        let (keyword, rest) = protocol::split_request(request);
        Self {
            kind: CommandKind::from_keyword(keyword),
            params: rest.to_string(),
        }
    }
    pub fn kind(&self) -> CommandKind {
        self.kind
    }
    pub fn params(&self) -> &str {
        &self.params
    }
    /// The visitor a visitor-scoped command acts on, when one is given.
    pub fn visitor_param(&self) -> Option<VisitorId> {
        match self.kind {
            CommandKind::Arrive
            | CommandKind::Depart
            | CommandKind::Borrow
            | CommandKind::Borrowed
            | CommandKind::Return
            | CommandKind::Pay => split_fields(&self.params)
                .first()
                .filter(|f| !f.is_empty())
                .map(|f| visitor_id(f)),
            _ => None,
        }
    }
    /// Validates the shape of the parameters. The error is the expected shape.
    pub fn check_params(&self) -> Result<Params, &'static str> {
        let fields = split_fields(&self.params);
        let given = |n: usize| fields.len() >= n && fields.iter().take(n).all(|f| !f.is_empty());
        let missing = self.kind.shape();
        let params = match self.kind {
            CommandKind::Register => {
                if fields.len() != 4 || !given(4) {
                    return Err(missing);
                }
                Params::Register {
                    first_name: fields[0].clone(),
                    last_name: fields[1].clone(),
                    address: fields[2].clone(),
                    phone: fields[3].clone(),
                }
            }
            CommandKind::Arrive | CommandKind::Depart | CommandKind::Borrowed => {
                if !given(1) {
                    return Err(missing);
                }
                let visitor = visitor_id(&fields[0]);
                match self.kind {
                    CommandKind::Arrive => Params::Arrive(visitor),
                    CommandKind::Depart => Params::Depart(visitor),
                    _ => Params::Borrowed(visitor),
                }
            }
            CommandKind::Borrow | CommandKind::Return => {
                let isbns = isbn_list(&fields[1.min(fields.len())..]);
                if !given(1) || isbns.is_empty() {
                    return Err(missing);
                }
                let visitor = visitor_id(&fields[0]);
                if self.kind == CommandKind::Borrow {
                    Params::Borrow { visitor, isbns }
                } else {
                    Params::Return { visitor, isbns }
                }
            }
            CommandKind::Pay => {
                if !given(2) {
                    return Err(missing);
                }
                Params::Pay {
                    visitor: visitor_id(&fields[0]),
                    amount: fields[1].clone(),
                }
            }
            CommandKind::Info | CommandKind::Search => {
                if !given(1) {
                    return Err(missing);
                }
                if self.kind == CommandKind::Info {
                    Params::Info(query(&fields))
                } else {
                    Params::Search(query(&fields))
                }
            }
            CommandKind::Buy => {
                if !given(2) {
                    return Err(missing);
                }
                Params::Buy {
                    quantity: fields[0].clone(),
                    ids: fields[1..].iter().filter(|f| !f.is_empty()).cloned().collect(),
                }
            }
            CommandKind::Advance => {
                if !given(1) {
                    return Err(missing);
                }
                Params::Advance {
                    days: fields[0].clone(),
                    hours: fields.get(1).filter(|f| !f.is_empty()).cloned(),
                }
            }
            CommandKind::Report => Params::Report(fields.first().filter(|f| !f.is_empty()).cloned()),
            CommandKind::Login => {
                if !given(2) {
                    return Err(missing);
                }
                Params::Login {
                    username: fields[0].clone(),
                    password: fields[1].clone(),
                }
            }
            CommandKind::Create => {
                if !given(3) {
                    return Err(missing);
                }
                Params::Create {
                    username: fields[0].clone(),
                    password: fields[1].clone(),
                    role: fields[2].clone(),
                    visitor: fields.get(3).filter(|f| !f.is_empty()).cloned(),
                }
            }
            CommandKind::Datetime => Params::Datetime,
            CommandKind::Connect => Params::Connect,
            CommandKind::Disconnect => Params::Disconnect,
            CommandKind::Logout => Params::Logout,
            CommandKind::Undo => Params::Undo,
            CommandKind::Redo => Params::Redo,
            CommandKind::Illegal => Params::Illegal,
        };
        Ok(params)
    }

    /// Runs the command on behalf of `client`. Parameters are checked first and
    /// nothing is mutated when they do not fit.
    pub fn execute(
        &self,
        library: &mut Library,
        sessions: &mut SessionKeeper,
        client: ClientId,
    ) -> Outcome {
        let keyword = self.kind.keyword();
        let params = match self.check_params() {
            Ok(params) => params,
            Err(shape) => {
                debug!(command = keyword, "missing parameters");
                return Outcome::reply(respond(keyword, format!("missing-parameters,{shape}")));
            }
        };
        let (response, effect) = match params {
            Params::Register {
                first_name,
                last_name,
                address,
                phone,
            } => register(library, &first_name, &last_name, &address, &phone),
            Params::Arrive(visitor) => arrive(library, visitor),
            Params::Depart(visitor) => depart(library, visitor),
            Params::Info(query) => (info(library, &query), None),
            Params::Borrow { visitor, isbns } => borrow(library, visitor, &isbns),
            Params::Borrowed(visitor) => (borrowed(library, visitor), None),
            Params::Return { visitor, isbns } => return_books(library, visitor, &isbns),
            Params::Pay { visitor, amount } => pay(library, visitor, &amount),
            Params::Search(query) => (search(library, sessions, client, &query), None),
            Params::Buy { quantity, ids } => buy(library, sessions, client, &quantity, &ids),
            Params::Advance { days, hours } => (advance(library, &days, hours.as_deref()), None),
            Params::Datetime => (
                respond(
                    keyword,
                    format!(
                        "{},{}",
                        format_date(library.now().date()),
                        format_time(library.now().time())
                    ),
                ),
                None,
            ),
            Params::Report(month) => (report(library, month.as_deref()), None),
            Params::Connect => {
                let connected = sessions.connect();
                info!(client = connected, "client connected");
                (respond(keyword, connected), None)
            }
            Params::Disconnect => (disconnect(library, sessions, client), None),
            Params::Login { username, password } => {
                (login(library, sessions, client, &username, &password), None)
            }
            Params::Logout => (
                match sessions.unbind(client) {
                    Some(username) => {
                        info!(client, %username, "logged out");
                        respond(keyword, "success")
                    }
                    None => respond(keyword, "not-logged-in"),
                },
                None,
            ),
            Params::Create {
                username,
                password,
                role,
                visitor,
            } => (create(library, username, password, &role, visitor.as_deref()), None),
            Params::Undo => (undo(library, sessions, client), None),
            Params::Redo => (redo(library, sessions, client), None),
            Params::Illegal => (ILLEGAL_COMMAND.to_string(), None),
        };
        Outcome {
            response,
            record: effect.map(|effect| Record::new(self.kind, &self.params, effect)),
        }
    }
}

type Handled = (String, Option<Effect>);

// ------------- visitors -------------
fn register(
    library: &mut Library,
    first_name: &str,
    last_name: &str,
    address: &str,
    phone: &str,
) -> Handled {
    let now = library.now();
    let (visitor, previously_kept) = library
        .visitors
        .keep(first_name, last_name, address, phone, now);
    if previously_kept {
        return (respond("register", "duplicate"), None);
    }
    info!(visitor = visitor.id(), "visitor registered");
    (
        respond("register", format!("{},{}", visitor.id(), format_date(now.date()))),
        Some(Effect::Registered(visitor)),
    )
}

fn arrive(library: &mut Library, visitor: VisitorId) -> Handled {
    if !library.is_open() {
        return (respond("arrive", "closed-library"), None);
    }
    let now = library.now();
    match library.visitors.arrive(visitor, now) {
        Ok(visit) => (
            respond(
                "arrive",
                format!("{},{},{}", visitor, format_date(now.date()), format_time(now.time())),
            ),
            Some(Effect::Arrived(visit)),
        ),
        Err(refusal) => (respond("arrive", refusal), None),
    }
}

fn depart(library: &mut Library, visitor: VisitorId) -> Handled {
    let now = library.now();
    match library.visitors.depart(visitor, now) {
        Ok(completed) => (
            respond(
                "depart",
                format!(
                    "{},{},{}",
                    visitor,
                    format_time(now.time()),
                    format_duration(completed.duration())
                ),
            ),
            Some(Effect::Departed(completed)),
        ),
        Err(_) => (respond("depart", "invalid-id"), None),
    }
}

// ------------- books -------------
fn info(library: &Library, query: &Query) -> String {
    let Some(filter) = query.filter() else {
        return respond("info", "invalid-sort-order");
    };
    let found: Vec<String> = library
        .catalog
        .search(&filter)
        .into_iter()
        .filter(|book| book.available_copies > 0)
        .map(|book| {
            format!(
                "{},{},{},{},{},{},{}",
                book.available_copies,
                book.isbn,
                book.title,
                book.authors_field(),
                book.publisher,
                book.publish_date,
                book.page_count
            )
        })
        .collect();
    respond_lines("info", found.len(), found)
}

fn search(library: &Library, sessions: &mut SessionKeeper, client: ClientId, query: &Query) -> String {
    let Some(filter) = query.filter() else {
        return respond("search", "invalid-sort-order");
    };
    let unsorted = SearchFilter {
        sort: SortOrder::Unsorted,
        ..filter.clone()
    };
    let found: Vec<_> = library
        .store
        .search(&unsorted)
        .into_iter()
        .map(|mut book| {
            // the store knows nothing of our shelves
            let kept = library.catalog.get(&book.isbn);
            book.total_copies = kept.map_or(0, |k| k.total_copies);
            book.available_copies = kept.map_or(0, |k| k.available_copies);
            book
        })
        .collect();
    let found = rank(found, filter.sort);
    let lines: Vec<String> = found
        .iter()
        .enumerate()
        .map(|(i, book)| format!("{},{}", i + 1, book))
        .collect();
    if let Some(session) = sessions.get_mut(client) {
        session.remember_search(found);
    }
    respond_lines("search", lines.len(), lines)
}

fn buy(
    library: &mut Library,
    sessions: &SessionKeeper,
    client: ClientId,
    quantity: &str,
    ids: &[String],
) -> Handled {
    let count = match quantity.trim().parse::<u32>() {
        Ok(count) if count > 0 => count,
        _ => return (respond("buy", format!("invalid-quantity,{}", quantity.trim())), None),
    };
    let Some(session) = sessions.get(client) else {
        return (INVALID_CLIENT_ID.to_string(), None);
    };
    let mut books = Vec::new();
    for id in ids {
        match session.searched(id) {
            Some(book) => books.push(book.clone()),
            None => return (respond("buy", format!("invalid-book-id,{}", id.trim())), None),
        }
    }
    let now = library.now();
    let purchases = library.catalog.purchase(count, &books, now);
    info!(books = purchases.len(), quantity = count, "books purchased");
    let lines: Vec<String> = purchases
        .iter()
        .map(|p| format!("{},{}", p.book, p.quantity))
        .collect();
    (
        respond_lines("buy", format!("success,{}", lines.len()), lines),
        Some(Effect::Purchased(purchases)),
    )
}

fn borrow(library: &mut Library, visitor: VisitorId, isbns: &[String]) -> Handled {
    if !library.is_open() {
        return (respond("borrow", "closed-library"), None);
    }
    let now = library.now();
    match library
        .ledger
        .checkout(visitor, isbns, now, &mut library.catalog, &library.visitors)
    {
        Ok(lent) => {
            info!(visitor, books = lent.len(), "books lent");
            let due = lent.first().map_or(now, |t| t.due);
            (
                respond("borrow", format_date(due.date())),
                Some(Effect::Borrowed { visitor, lent }),
            )
        }
        Err(refusal) => (respond("borrow", refusal), None),
    }
}

fn borrowed(library: &Library, visitor: VisitorId) -> String {
    if !library.visitors.is_registered(visitor) {
        return respond("borrowed", "invalid-visitor-id");
    }
    let lines: Vec<String> = library
        .ledger
        .open_transactions(visitor)
        .iter()
        .map(|t| {
            let title = library.catalog.get(&t.isbn).map_or("", |b| b.title.as_str());
            format!(
                "{},{},{},{}",
                t.isbn,
                title,
                format_date(t.checkout.date()),
                format_date(t.due.date())
            )
        })
        .collect();
    respond_lines("borrowed", lines.len(), lines)
}

fn return_books(library: &mut Library, visitor: VisitorId, isbns: &[String]) -> Handled {
    let now = library.now();
    match library
        .ledger
        .return_books(visitor, isbns, now, &mut library.catalog, &library.visitors)
    {
        Ok(returned) => {
            let overdue: Vec<String> = returned
                .iter()
                .filter(|t| t.fine > 0)
                .map(|t| format!("{},{}", t.isbn, t.fine))
                .collect();
            let total: u64 = returned.iter().map(|t| t.fine).sum();
            info!(visitor, books = returned.len(), fine = total, "books returned");
            let response = if overdue.is_empty() {
                respond("return", "success")
            } else {
                respond_lines("return", format!("overdue,{total}"), overdue)
            };
            (response, Some(Effect::Returned { visitor, returned }))
        }
        Err(refusal) => (respond("return", refusal), None),
    }
}

fn pay(library: &mut Library, visitor: VisitorId, amount: &str) -> Handled {
    if !library.visitors.is_registered(visitor) {
        return (respond("pay", "invalid-visitor-id"), None);
    }
    let now = library.now();
    let balance = library.ledger.outstanding(visitor, now);
    let payment = amount
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|amount| library.ledger.pay(visitor, amount, now));
    match payment {
        Some(payment) => {
            let balance = library.ledger.outstanding(visitor, now);
            info!(visitor, amount = payment.amount, balance, "fine paid");
            (respond("pay", format!("success,{balance}")), Some(Effect::Paid(payment)))
        }
        None => (
            respond("pay", format!("invalid-amount,{},{balance}", amount.trim())),
            None,
        ),
    }
}

// ------------- time and statistics -------------
fn advance(library: &mut Library, days: &str, hours: Option<&str>) -> String {
    let days = match days.trim().parse::<i64>() {
        Ok(d) if (0..=MAX_ADVANCE_DAYS).contains(&d) => d,
        _ => return respond("advance", format!("invalid-number-of-days,{}", days.trim())),
    };
    let hours = match hours.map(|h| (h, h.trim().parse::<i64>())) {
        None => 0,
        Some((_, Ok(h))) if (0..=MAX_ADVANCE_HOURS).contains(&h) => h,
        Some((raw, _)) => {
            return respond("advance", format!("invalid-number-of-hours,{}", raw.trim()));
        }
    };
    library.advance(days, hours);
    info!(days, hours, now = %library.now(), "clock advanced");
    respond("advance", "success")
}

fn report(library: &Library, month: Option<&str>) -> String {
    let month = match month {
        None => None,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(m) if (1..=12).contains(&m) => Some(m),
            _ => return respond("report", format!("invalid-month,{}", raw.trim())),
        },
    };
    respond("report", Report::compile(library, month))
}

// ------------- sessions and accounts -------------
fn disconnect(library: &Library, sessions: &mut SessionKeeper, client: ClientId) -> String {
    match sessions.disconnect(client) {
        Some(session) => {
            info!(
                client,
                account = session.account().unwrap_or("-"),
                accounts = library.accounts.len(),
                "client disconnected"
            );
            format!("{}{TERMINATOR}", CommandKind::Disconnect.keyword())
        }
        None => INVALID_CLIENT_ID.to_string(),
    }
}

fn login(
    library: &Library,
    sessions: &mut SessionKeeper,
    client: ClientId,
    username: &str,
    password: &str,
) -> String {
    if library.accounts.authenticate(username, password).is_none() {
        debug!(client, "login refused");
        return respond("login", "bad-username-or-password");
    }
    sessions.bind(client, username);
    info!(client, %username, "logged in");
    respond("login", "success")
}

fn create(
    library: &mut Library,
    username: String,
    password: String,
    role: &str,
    visitor: Option<&str>,
) -> String {
    let Some(role) = Role::parse(role) else {
        return respond("create", "invalid-role");
    };
    let visitor = match visitor.map(visitor_id) {
        Some(id) if library.visitors.is_registered(id) => Some(id),
        Some(_) => return respond("create", "invalid-visitor"),
        None if role == Role::Visitor => return respond("create", "invalid-visitor"),
        None => None,
    };
    let account = Account::new(username, password, role, visitor);
    let name = account.username().to_string();
    match library.accounts.create(account) {
        Ok(()) => {
            info!(username = %name, ?role, "account created");
            respond("create", "success")
        }
        Err(CreateRefusal::DuplicateUsername) => respond("create", "duplicate-username"),
        Err(CreateRefusal::DuplicateVisitor) => respond("create", "duplicate-visitor"),
    }
}

fn acting_account(sessions: &SessionKeeper, client: ClientId) -> Option<String> {
    sessions.get(client)?.account().map(str::to_string)
}

fn undo(library: &mut Library, sessions: &SessionKeeper, client: ClientId) -> String {
    let Some(username) = acting_account(sessions, client) else {
        return respond("undo", "nothing-to-undo");
    };
    let Some(record) = library
        .accounts
        .get_mut(&username)
        .and_then(|account| account.history_mut().pop_performed())
    else {
        return respond("undo", "nothing-to-undo");
    };
    let reverted = history::revert(&record.effect, library);
    let Some(account) = library.accounts.get_mut(&username) else {
        return respond("undo", "failed");
    };
    match reverted {
        Ok(()) => {
            info!(%username, command = record.kind.keyword(), params = %record.params, "undone");
            account.history_mut().push_undone(record);
            respond("undo", "success")
        }
        Err(e) => {
            info!(%username, command = record.kind.keyword(), params = %record.params, error = %e, "undo failed");
            account.history_mut().push_redone(record);
            respond("undo", "failed")
        }
    }
}

fn redo(library: &mut Library, sessions: &SessionKeeper, client: ClientId) -> String {
    let Some(username) = acting_account(sessions, client) else {
        return respond("redo", "nothing-to-redo");
    };
    let Some(record) = library
        .accounts
        .get_mut(&username)
        .and_then(|account| account.history_mut().pop_undone())
    else {
        return respond("redo", "nothing-to-redo");
    };
    let reapplied = history::reapply(&record.effect, library);
    let Some(account) = library.accounts.get_mut(&username) else {
        return respond("redo", "failed");
    };
    match reapplied {
        Ok(()) => {
            info!(%username, command = record.kind.keyword(), params = %record.params, "redone");
            account.history_mut().push_redone(record);
            respond("redo", "success")
        }
        Err(e) => {
            info!(%username, command = record.kind.keyword(), params = %record.params, error = %e, "redo failed");
            account.history_mut().push_undone(record);
            respond("redo", "failed")
        }
    }
}
