use chrono::NaiveDate;
use lbms::account::{Account, Role};
use lbms::catalog::JsonBookStore;
use lbms::engine::Engine;
use lbms::ledger::Policy;
use lbms::library::Library;
use lbms::state::Hours;

const HOBBIT: &str = "9780547928227";

// a library owning `copies` of The Hobbit and one present visitor, 1000000000
fn setup(copies: u32) -> Engine {
    let start = NaiveDate::from_ymd_opt(2024, 3, 4)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid start");
    let store = JsonBookStore::from_json(include_str!("fixtures/store.json")).expect("store loads");
    let library = Library::new(start, Hours::default(), Policy::default(), Box::new(store));
    let mut engine = Engine::new(library, Account::new("admin".into(), "admin".into(), Role::Employee, None));
    assert_eq!(engine.execute("search,The Hobbit;").lines().count(), 2);
    assert!(engine.execute(&format!("buy,{copies},1;")).starts_with("buy,success,1"));
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine
}

#[test]
fn borrowing_takes_copies_off_the_shelf() {
    let mut engine = setup(1);
    assert_eq!(
        engine.execute("info,The Hobbit;"),
        format!("info,1\n1,{HOBBIT},The Hobbit,{{J.R.R. Tolkien}},Houghton Mifflin,2012-09-18,300;")
    );
    assert_eq!(engine.execute(&format!("borrow,1000000000,{{{HOBBIT}}};")), "borrow,2024/03/11;");
    assert_eq!(engine.library().catalog().available(HOBBIT), 0);
    assert_eq!(engine.execute("info,The Hobbit;"), "info,0;");
    assert_eq!(
        engine.execute("borrowed,1000000000;"),
        format!("borrowed,1\n{HOBBIT},The Hobbit,2024/03/04,2024/03/11;")
    );

    engine.execute("register,Charles,Babbage,1 Difference St,555-0101;");
    engine.execute("arrive,1000000001;");
    assert_eq!(
        engine.execute(&format!("borrow,1000000001,{HOBBIT};")),
        format!("borrow,book-no-longer-available,{HOBBIT};")
    );
}

#[test]
fn a_sixth_open_loan_is_refused() {
    let mut engine = setup(6);
    let five = vec![HOBBIT; 5].join(",");
    assert_eq!(engine.execute(&format!("borrow,1000000000,{{{five}}};")), "borrow,2024/03/11;");
    assert_eq!(
        engine.execute(&format!("borrow,1000000000,{HOBBIT};")),
        "borrow,book-limit-exceeded;"
    );
    assert_eq!(engine.library().catalog().available(HOBBIT), 1);
}

#[test]
fn unknown_books_and_visitors_are_refused() {
    let mut engine = setup(1);
    assert_eq!(engine.execute("borrow,1000000000,123;"), "borrow,invalid-book-id,123;");
    assert_eq!(engine.execute(&format!("borrow,42,{HOBBIT};")), "borrow,invalid-visitor-id;");
    assert_eq!(engine.execute("return,1000000000,123;"), "return,invalid-book-id,123;");
    assert_eq!(engine.execute("borrowed,42;"), "borrowed,invalid-visitor-id;");
    assert_eq!(engine.execute("pay,42,5;"), "pay,invalid-visitor-id;");
}

#[test]
fn late_returns_are_fined_until_paid() {
    let mut engine = setup(1);
    engine.execute(&format!("borrow,1000000000,{HOBBIT};"));
    assert_eq!(engine.execute(&format!("return,1000000000,{HOBBIT};")), "return,success;");
    engine.execute(&format!("borrow,1000000000,{HOBBIT};"));
    engine.execute("advance,7;");
    engine.execute("advance,3;");
    assert_eq!(engine.execute("datetime;"), "datetime,2024/03/14,10:00:00;");
    assert_eq!(
        engine.execute(&format!("return,1000000000,{HOBBIT};")),
        format!("return,overdue,14\n{HOBBIT},14;")
    );
    assert_eq!(engine.library().catalog().available(HOBBIT), 1);

    engine.execute("arrive,1000000000;");
    assert_eq!(
        engine.execute(&format!("borrow,1000000000,{HOBBIT};")),
        "borrow,outstanding-fine,14;"
    );
    assert_eq!(engine.execute("pay,1000000000,20;"), "pay,invalid-amount,20,14;");
    assert_eq!(engine.execute("pay,1000000000,10;"), "pay,success,4;");
    assert_eq!(engine.execute("pay,1000000000,4;"), "pay,success,0;");
    assert!(engine.execute("report;").contains("Fines Collected: 14\nFines Outstanding: 0;"));
    assert_eq!(engine.execute(&format!("borrow,1000000000,{HOBBIT};")), "borrow,2024/03/21;");
}

#[test]
fn the_store_is_searched_and_bought_from() {
    let mut engine = setup(1);
    assert_eq!(
        engine.execute("search,*,*,*,*,title;"),
        "search,3\n\
         1,9780441013593,Dune,{Frank Herbert},Ace,2005-08-02\n\
         2,9780262033848,Introduction to Algorithms,{Thomas H. Cormen,Charles E. Leiserson},MIT Press,2009-07-31\n\
         3,9780547928227,The Hobbit,{J.R.R. Tolkien},Houghton Mifflin,2012-09-18;"
    );
    assert_eq!(engine.execute("search,*,*,*,*,cheapest;"), "search,invalid-sort-order;");
    assert_eq!(engine.execute("buy,0,1;"), "buy,invalid-quantity,0;");
    assert_eq!(engine.execute("buy,2,4;"), "buy,invalid-book-id,4;");
    assert_eq!(
        engine.execute("buy,2,1,3;"),
        "buy,success,2\n\
         9780441013593,Dune,{Frank Herbert},Ace,2005-08-02,2\n\
         9780547928227,The Hobbit,{J.R.R. Tolkien},Houghton Mifflin,2012-09-18,2;"
    );
    assert_eq!(engine.library().catalog().available(HOBBIT), 3);
    assert!(engine.execute("report;").contains("Number of Books: 5\n"));
    assert!(engine.execute("report;").contains("Number of Books Purchased: 5\n"));
}
