//! Book records owned by the library, and the book store they are bought from.
//!
//! The [`Catalog`] keeps one [`BookRecord`] per ISBN together with its copy
//! counts. Records enter the catalog only through [`Catalog::purchase`], which
//! consumes records found by a [`BookStore`] search. Both sides share the same
//! [`SearchFilter`] and ranking so that `info` and `search` read the same way.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

// ------------- BookRecord -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub total_copies: u32,
    #[serde(default)]
    pub available_copies: u32,
}

impl BookRecord {
    pub fn authors_field(&self) -> String {
        format!("{{{}}}", self.authors.join(","))
    }
}

impl fmt::Display for BookRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.isbn,
            self.title,
            self.authors_field(),
            self.publisher,
            self.publish_date
        )
    }
}

// ------------- Searching -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Unsorted,
    Title,
    PublishDate,
    BookStatus,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "" | "*" => Some(Self::Unsorted),
            "title" => Some(Self::Title),
            "publish-date" => Some(Self::PublishDate),
            "book-status" => Some(Self::BookStatus),
            _ => None,
        }
    }
}

/// A title filter. `*` alone matches anything, an embedded `*` is a glob,
/// otherwise a case-insensitive substring.
#[derive(Debug, Clone)]
pub enum TitlePattern {
    Any,
    Contains(String),
    Glob(Regex),
}

impl TitlePattern {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Self::Any;
        }
        if s.contains('*') {
            let escaped: Vec<String> = s.split('*').map(regex::escape).collect();
            if let Ok(glob) = Regex::new(&format!("(?i)^{}$", escaped.join(".*"))) {
                return Self::Glob(glob);
            }
        }
        Self::Contains(s.to_lowercase())
    }
    pub fn matches(&self, title: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(needle) => title.to_lowercase().contains(needle),
            Self::Glob(glob) => glob.is_match(title),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub title: TitlePattern,
    pub authors: Vec<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub sort: SortOrder,
}

impl SearchFilter {
    pub fn any() -> Self {
        Self {
            title: TitlePattern::Any,
            authors: Vec::new(),
            isbn: None,
            publisher: None,
            sort: SortOrder::Unsorted,
        }
    }
    pub fn matches(&self, book: &BookRecord) -> bool {
        if !self.title.matches(&book.title) {
            return false;
        }
        if let Some(isbn) = &self.isbn {
            if &book.isbn != isbn {
                return false;
            }
        }
        if let Some(publisher) = &self.publisher {
            if !book.publisher.to_lowercase().contains(&publisher.to_lowercase()) {
                return false;
            }
        }
        // every requested author has to appear among the book's authors
        self.authors.iter().all(|wanted| {
            let wanted = wanted.to_lowercase();
            book.authors
                .iter()
                .any(|author| author.to_lowercase().contains(&wanted))
        })
    }
}

/// Sorts matches according to the requested order. Ties keep their incoming order.
pub fn rank(mut books: Vec<BookRecord>, sort: SortOrder) -> Vec<BookRecord> {
    match sort {
        SortOrder::Unsorted => (),
        SortOrder::Title => books.sort_by(|a, b| a.title.cmp(&b.title)),
        SortOrder::PublishDate => books.sort_by(|a, b| b.publish_date.cmp(&a.publish_date)),
        SortOrder::BookStatus => {
            books.sort_by(|a, b| b.available_copies.cmp(&a.available_copies))
        }
    }
    books
}

// ------------- BookStore -------------
/// The external catalog books are purchased from.
pub trait BookStore {
    fn search(&self, filter: &SearchFilter) -> Vec<BookRecord>;
}

/// A store whose whole inventory sits in memory, loaded from a JSON array.
#[derive(Debug, Default)]
pub struct JsonBookStore {
    books: Vec<BookRecord>,
}

impl JsonBookStore {
    pub fn new(books: Vec<BookRecord>) -> Self {
        Self { books }
    }
    pub fn from_json(json: &str) -> Result<Self> {
        let books: Vec<BookRecord> = serde_json::from_str(json)?;
        Ok(Self::new(books))
    }
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
    pub fn len(&self) -> usize {
        self.books.len()
    }
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl BookStore for JsonBookStore {
    fn search(&self, filter: &SearchFilter) -> Vec<BookRecord> {
        let found = self
            .books
            .iter()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect();
        rank(found, filter.sort)
    }
}

// ------------- Catalog -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub book: BookRecord,
    pub quantity: u32,
    pub at: NaiveDateTime,
    // true when the purchase put the record into the catalog
    pub introduced: bool,
}

#[derive(Debug, Default)]
pub struct Catalog {
    books: BTreeMap<String, BookRecord>,
    purchases: Vec<Purchase>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, isbn: &str) -> Option<&BookRecord> {
        self.books.get(isbn)
    }
    pub fn len(&self) -> usize {
        self.books.len()
    }
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
    pub fn total_copies(&self) -> u64 {
        self.books.values().map(|b| u64::from(b.total_copies)).sum()
    }
    pub fn available(&self, isbn: &str) -> u32 {
        self.books.get(isbn).map_or(0, |b| b.available_copies)
    }
    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }
    pub fn search(&self, filter: &SearchFilter) -> Vec<BookRecord> {
        let found = self
            .books
            .values()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect();
        rank(found, filter.sort)
    }
    /// Adds `quantity` copies of every record, in order. Records not yet in the
    /// catalog are introduced with exactly `quantity` copies.
    pub fn purchase(
        &mut self,
        quantity: u32,
        books: &[BookRecord],
        at: NaiveDateTime,
    ) -> Vec<Purchase> {
        let mut bought = Vec::new();
        for book in books {
            let introduced = !self.books.contains_key(&book.isbn);
            let kept = self.books.entry(book.isbn.clone()).or_insert_with(|| BookRecord {
                total_copies: 0,
                available_copies: 0,
                ..book.clone()
            });
            kept.total_copies += quantity;
            kept.available_copies += quantity;
            let purchase = Purchase {
                book: kept.clone(),
                quantity,
                at,
                introduced,
            };
            self.purchases.push(purchase.clone());
            bought.push(purchase);
        }
        bought
    }
    /// Takes back copies added by a purchase. Fails when some of them are lent out.
    pub fn revoke_purchase(&mut self, purchase: &Purchase) -> Result<()> {
        let kept = self.books.get_mut(&purchase.book.isbn).ok_or_else(|| {
            LibraryError::Invariant(format!("purchased book {} is not kept", purchase.book.isbn))
        })?;
        if kept.available_copies < purchase.quantity {
            return Err(LibraryError::Conflict(format!(
                "copies of {} are lent out",
                purchase.book.isbn
            )));
        }
        kept.total_copies -= purchase.quantity;
        kept.available_copies -= purchase.quantity;
        if let Some(position) = self.purchases.iter().rposition(|p| p == purchase) {
            self.purchases.remove(position);
        }
        Ok(())
    }
    pub fn restore_purchase(&mut self, purchase: &Purchase) {
        let kept = self
            .books
            .entry(purchase.book.isbn.clone())
            .or_insert_with(|| BookRecord {
                total_copies: 0,
                available_copies: 0,
                ..purchase.book.clone()
            });
        kept.total_copies += purchase.quantity;
        kept.available_copies += purchase.quantity;
        self.purchases.push(purchase.clone());
    }
    /// Takes one copy off the shelf.
    pub fn lend(&mut self, isbn: &str) -> Result<()> {
        match self.books.get_mut(isbn) {
            Some(book) if book.available_copies > 0 => {
                book.available_copies -= 1;
                Ok(())
            }
            Some(_) => Err(LibraryError::Conflict(format!("no copies of {isbn} left"))),
            None => Err(LibraryError::Conflict(format!("{isbn} is not in the catalog"))),
        }
    }
    /// Puts one copy back on the shelf.
    pub fn shelve(&mut self, isbn: &str) -> Result<()> {
        match self.books.get_mut(isbn) {
            Some(book) if book.available_copies < book.total_copies => {
                book.available_copies += 1;
                Ok(())
            }
            Some(_) => Err(LibraryError::Invariant(format!(
                "every copy of {isbn} is already shelved"
            ))),
            None => Err(LibraryError::Invariant(format!("{isbn} is not in the catalog"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn book(isbn: &str, title: &str, author: &str, date: &str) -> BookRecord {
        BookRecord {
            isbn: isbn.to_string(),
            title: title.to_string(),
            authors: vec![author.to_string()],
            publisher: "Penguin".to_string(),
            publish_date: date.to_string(),
            page_count: 100,
            total_copies: 0,
            available_copies: 0,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn title_patterns() {
        assert!(TitlePattern::parse("*").matches("anything"));
        assert!(TitlePattern::parse("hobbit").matches("The Hobbit"));
        assert!(TitlePattern::parse("The*Rings").matches("The Lord of the Rings"));
        assert!(!TitlePattern::parse("The*Rings").matches("Rings of the Lord"));
    }

    #[test]
    fn purchase_introduces_then_adds_copies() {
        let mut catalog = Catalog::new();
        let hobbit = book("9780261103344", "The Hobbit", "Tolkien", "1937-09-21");
        let first = catalog.purchase(2, &[hobbit.clone()], noon());
        assert!(first[0].introduced);
        let second = catalog.purchase(3, &[hobbit], noon());
        assert!(!second[0].introduced);
        let kept = catalog.get("9780261103344").unwrap();
        assert_eq!((kept.total_copies, kept.available_copies), (5, 5));
        assert_eq!(catalog.purchases().len(), 2);
    }

    #[test]
    fn revoke_refuses_when_copies_are_lent() {
        let mut catalog = Catalog::new();
        let bought = catalog.purchase(1, &[book("1", "A", "X", "2000")], noon());
        catalog.lend("1").unwrap();
        assert!(catalog.revoke_purchase(&bought[0]).is_err());
        catalog.shelve("1").unwrap();
        catalog.revoke_purchase(&bought[0]).unwrap();
        assert_eq!(catalog.get("1").unwrap().total_copies, 0);
        assert!(catalog.purchases().is_empty());
    }

    #[test]
    fn ranking_by_publish_date_is_newest_first() {
        let ranked = rank(
            vec![book("1", "B", "X", "1990"), book("2", "A", "X", "2010")],
            SortOrder::PublishDate,
        );
        assert_eq!(ranked[0].isbn, "2");
        let ranked = rank(ranked, SortOrder::Title);
        assert_eq!(ranked[0].title, "A");
    }

    #[test]
    fn store_loads_from_json() {
        let store = JsonBookStore::from_json(
            r#"[{"isbn":"1","title":"Dune","authors":["Frank Herbert"],"publisher":"Chilton","publish_date":"1965-08-01","page_count":412}]"#,
        )
        .unwrap();
        let mut filter = SearchFilter::any();
        filter.authors = vec!["herbert".to_string()];
        assert_eq!(store.search(&filter).len(), 1);
    }
}
