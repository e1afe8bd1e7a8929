//! LBMS – a library backend management system driven by a line protocol.
//!
//! The library keeps a catalog of owned books, a registry of visitors, a ledger
//! of borrowing transactions, fines and payments, and a simulated clock that
//! decides when the library is open. Everything is operated through requests
//! of the form `<command>,<param>,...;`, which may span several lines:
//! * `register`, `arrive`, `depart` manage visitors and their visits.
//! * `info`, `borrow`, `borrowed`, `return`, `pay` deal with the owned books.
//! * `search` and `buy` browse an external book store and add copies.
//! * `advance`, `datetime` and `report` drive the clock and summarize activity.
//! * `connect`, `disconnect`, `login`, `logout`, `create` manage clients and
//!   accounts, and `undo`/`redo` walk the history of the logged in account.
//!
//! Constructs are owned by "keeper" structures (see the `visitor` and `account`
//! modules), so a visitor registered twice is the same visitor, and ids are
//! handed out by a generator that can be told to retain restored ids.
//!
//! ## Modules
//! * [`clock`] – The simulated clock and the date and time formats of responses.
//! * [`state`] – Opening hours and the open/closed state they imply.
//! * [`catalog`] – Book records, search filters, the book store and the owned catalog.
//! * [`visitor`] – Visitor registration and visits.
//! * [`ledger`] – Checkouts, returns, fines and payments.
//! * [`library`] – Owns all of the above for the commands to work against.
//! * [`command`] – Parsing, validation and execution of requests.
//! * [`history`] – What undoable commands leave behind and how to take it back.
//! * [`account`] – Roles, accounts and their undo/redo stacks.
//! * [`session`] – Connected clients and the accounts they are logged in with.
//! * [`protocol`] – Framing of requests and formatting of responses.
//! * [`engine`] – Routes framed requests from clients to commands.
//! * [`report`] – Library statistics.
//! * [`settings`] – Layered configuration.
//!
//! ## Quick Start
//! ```
//! use lbms::catalog::JsonBookStore;
//! use lbms::engine::Engine;
//! use lbms::settings::Settings;
//!
//! let mut engine = Engine::from_settings(&Settings::default(), Box::new(JsonBookStore::default()));
//! assert_eq!(engine.execute("advance,0,1;"), "advance,success;");
//! assert_eq!(engine.execute("datetime;"), "datetime,1970/01/01,10:00:00;");
//! ```

use std::hash::BuildHasherDefault;

// we will use a fast hashing algo for hashmaps where keys are ids and names
use seahash::SeaHasher;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub mod account;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod engine;
pub mod error;
pub mod history;
pub mod ledger;
pub mod library;
pub mod protocol;
pub mod report;
pub mod session;
pub mod settings;
pub mod state;
pub mod visitor;

pub use error::{LibraryError, Result};
