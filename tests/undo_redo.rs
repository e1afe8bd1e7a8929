use chrono::NaiveDate;
use lbms::account::{Account, Role};
use lbms::catalog::JsonBookStore;
use lbms::engine::Engine;
use lbms::ledger::Policy;
use lbms::library::Library;
use lbms::state::Hours;

const HOBBIT: &str = "9780547928227";

fn setup() -> Engine {
    let start = NaiveDate::from_ymd_opt(2024, 3, 4)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid start");
    let store = JsonBookStore::from_json(include_str!("fixtures/store.json")).expect("store loads");
    let library = Library::new(start, Hours::default(), Policy::default(), Box::new(store));
    Engine::new(library, Account::new("admin".into(), "admin".into(), Role::Employee, None))
}

#[test]
fn nothing_to_undo_or_redo_at_first() {
    let mut engine = setup();
    assert_eq!(engine.execute("undo;"), "undo,nothing-to-undo;");
    assert_eq!(engine.execute("redo;"), "redo,nothing-to-redo;");
    // queries leave nothing behind
    engine.execute("datetime;");
    engine.execute("search,Dune;");
    assert_eq!(engine.execute("undo;"), "undo,nothing-to-undo;");
}

#[test]
fn a_registration_is_undone_and_redone_under_the_same_id() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert_eq!(engine.execute("arrive,1000000000;"), "arrive,invalid-id;");
    assert_eq!(engine.execute("redo;"), "redo,success;");
    assert_eq!(
        engine.execute("arrive,1000000000;"),
        "arrive,1000000000,2024/03/04,10:00:00;"
    );
    assert_eq!(engine.execute("redo;"), "redo,nothing-to-redo;");
}

#[test]
fn undoing_a_checkout_puts_the_copy_back() {
    let mut engine = setup();
    engine.execute("search,The Hobbit;");
    engine.execute("buy,1,1;");
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    assert_eq!(engine.execute(&format!("borrow,1000000000,{HOBBIT};")), "borrow,2024/03/11;");
    assert_eq!(engine.library().catalog().available(HOBBIT), 0);

    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert_eq!(engine.library().catalog().available(HOBBIT), 1);
    assert_eq!(engine.execute("borrowed,1000000000;"), "borrowed,0;");

    assert_eq!(engine.execute("redo;"), "redo,success;");
    assert_eq!(engine.library().catalog().available(HOBBIT), 0);
    assert_eq!(engine.library().ledger().open_transactions(1_000_000_000).len(), 1);
}

#[test]
fn undoing_a_purchase_takes_the_copies_back() {
    let mut engine = setup();
    engine.execute("search,*;");
    engine.execute("buy,3,1,2;");
    assert_eq!(engine.library().catalog().total_copies(), 6);
    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert_eq!(engine.library().catalog().total_copies(), 0);
    assert_eq!(engine.execute("redo;"), "redo,success;");
    assert_eq!(engine.library().catalog().total_copies(), 6);
}

#[test]
fn a_new_command_forgets_what_was_undone() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("undo;");
    engine.execute("register,Charles,Babbage,1 Difference St,555-0101;");
    assert_eq!(engine.execute("redo;"), "redo,nothing-to-redo;");
}

#[test]
fn a_payment_is_undone() {
    let mut engine = setup();
    engine.execute("search,The Hobbit;");
    engine.execute("buy,1,1;");
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine.execute(&format!("borrow,1000000000,{HOBBIT};"));
    engine.execute("advance,7;");
    engine.execute(&format!("return,1000000000,{HOBBIT};"));
    assert_eq!(engine.execute("pay,1000000000,8;"), "pay,success,0;");
    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert_eq!(engine.library().ledger().outstanding(1_000_000_000, engine.library().now()), 8);
    assert_eq!(engine.execute("redo;"), "redo,success;");
    assert_eq!(engine.library().ledger().outstanding(1_000_000_000, engine.library().now()), 0);
}

#[test]
fn an_undo_that_no_longer_fits_fails_and_can_be_retried() {
    let mut engine = setup();
    engine.execute("create,bob,pw,employee;");
    engine.execute("connect;");
    engine.execute("1,login,bob,pw;");
    engine.execute("1,search,The Hobbit;");
    engine.execute("1,buy,1,1;");
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine.execute(&format!("borrow,1000000000,{HOBBIT};"));

    // bob's purchase is out on loan
    assert_eq!(engine.execute("1,undo;"), "1,undo,failed;");
    assert_eq!(engine.library().catalog().total_copies(), 1);

    assert_eq!(engine.execute(&format!("return,1000000000,{HOBBIT};")), "return,success;");
    assert_eq!(engine.execute("1,undo;"), "1,undo,success;");
    assert_eq!(engine.library().catalog().total_copies(), 0);
}

// bob, a second employee on client 1, next to the console
fn with_second_employee(engine: &mut Engine) {
    engine.execute("create,bob,pw,employee;");
    engine.execute("connect;");
    assert_eq!(engine.execute("1,login,bob,pw;"), "1,login,success;");
}

#[test]
fn redoing_a_borrow_respects_the_loan_limit() {
    let mut engine = setup();
    with_second_employee(&mut engine);
    engine.execute("search,The Hobbit;");
    engine.execute("buy,10,1;");
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    let five = vec![HOBBIT; 5].join(",");
    assert_eq!(engine.execute(&format!("1,borrow,1000000000,{{{five}}};")), "1,borrow,2024/03/11;");
    assert_eq!(engine.execute("1,undo;"), "1,undo,success;");
    assert_eq!(engine.execute(&format!("borrow,1000000000,{{{five}}};")), "borrow,2024/03/11;");

    assert_eq!(engine.execute("1,redo;"), "1,redo,failed;");
    assert_eq!(engine.library().ledger().open_transactions(1_000_000_000).len(), 5);
    assert_eq!(engine.library().catalog().available(HOBBIT), 5);
}

#[test]
fn redoing_a_borrow_needs_an_open_library_and_a_present_visitor() {
    let mut engine = setup();
    with_second_employee(&mut engine);
    engine.execute("search,The Hobbit;");
    engine.execute("buy,1,1;");
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine.execute(&format!("1,borrow,1000000000,{HOBBIT};"));
    assert_eq!(engine.execute("1,undo;"), "1,undo,success;");

    engine.execute("advance,0,12;");
    assert_eq!(engine.execute("1,redo;"), "1,redo,failed;");
    assert!(engine.library().ledger().open_transactions(1_000_000_000).is_empty());

    // open again, but ada was sent home at closing
    engine.execute("advance,0,12;");
    assert_eq!(engine.execute("1,redo;"), "1,redo,failed;");

    engine.execute("arrive,1000000000;");
    assert_eq!(engine.execute("1,redo;"), "1,redo,success;");
    assert_eq!(engine.library().catalog().available(HOBBIT), 0);
}

#[test]
fn redoing_a_payment_cannot_overpay() {
    let mut engine = setup();
    with_second_employee(&mut engine);
    engine.execute("search,The Hobbit;");
    engine.execute("buy,1,1;");
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine.execute(&format!("borrow,1000000000,{HOBBIT};"));
    engine.execute("advance,7;");
    engine.execute("advance,3;");
    engine.execute(&format!("return,1000000000,{HOBBIT};"));

    assert_eq!(engine.execute("1,pay,1000000000,14;"), "1,pay,success,0;");
    assert_eq!(engine.execute("1,undo;"), "1,undo,success;");
    assert_eq!(engine.execute("pay,1000000000,14;"), "pay,success,0;");
    assert_eq!(engine.execute("1,redo;"), "1,redo,failed;");
    assert_eq!(engine.library().ledger().paid(1_000_000_000), 14);
}

#[test]
fn redoing_an_arrival_after_closing_fails() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert!(!engine.library().visitors().is_present(1_000_000_000));
    engine.execute("advance,0,12;");
    assert_eq!(engine.execute("redo;"), "redo,failed;");
    assert!(!engine.library().visitors().is_present(1_000_000_000));
}

#[test]
fn arrivals_and_departures_are_undone_and_redone() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine.execute("advance,0,2;");
    engine.execute("depart,1000000000;");
    assert!(!engine.library().visitors().is_present(1_000_000_000));

    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert!(engine.library().visitors().is_present(1_000_000_000));
    assert!(engine.library().visitors().completed().is_empty());
    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert!(!engine.library().visitors().is_present(1_000_000_000));

    assert_eq!(engine.execute("redo;"), "redo,success;");
    assert!(engine.library().visitors().is_present(1_000_000_000));
    assert_eq!(engine.execute("redo;"), "redo,success;");
    assert!(!engine.library().visitors().is_present(1_000_000_000));
    assert_eq!(engine.library().visitors().completed().len(), 1);
}

#[test]
fn a_return_is_undone_and_redone() {
    let mut engine = setup();
    engine.execute("search,The Hobbit;");
    engine.execute("buy,1,1;");
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine.execute(&format!("borrow,1000000000,{HOBBIT};"));
    engine.execute(&format!("return,1000000000,{HOBBIT};"));

    assert_eq!(engine.execute("undo;"), "undo,success;");
    assert_eq!(engine.library().ledger().open_transactions(1_000_000_000).len(), 1);
    assert!(engine.library().ledger().closed_transactions(1_000_000_000).is_empty());
    assert_eq!(engine.library().catalog().available(HOBBIT), 0);

    assert_eq!(engine.execute("redo;"), "redo,success;");
    assert!(engine.library().ledger().open_transactions(1_000_000_000).is_empty());
    assert_eq!(engine.library().ledger().closed_transactions(1_000_000_000).len(), 1);
    assert_eq!(engine.library().catalog().available(HOBBIT), 1);
}
