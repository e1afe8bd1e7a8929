use chrono::NaiveDate;
use lbms::account::{Account, Role};
use lbms::catalog::JsonBookStore;
use lbms::engine::Engine;
use lbms::ledger::Policy;
use lbms::library::Library;
use lbms::state::Hours;

fn setup() -> Engine {
    let start = NaiveDate::from_ymd_opt(2024, 3, 4)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid start");
    let store = JsonBookStore::from_json(include_str!("fixtures/store.json")).expect("store loads");
    let library = Library::new(start, Hours::default(), Policy::default(), Box::new(store));
    Engine::new(library, Account::new("admin".into(), "admin".into(), Role::Employee, None))
}

#[test]
fn registering_the_same_person_twice_is_a_duplicate() {
    let mut engine = setup();
    assert_eq!(
        engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;"),
        "register,1000000000,2024/03/04;"
    );
    assert_eq!(
        engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;"),
        "register,duplicate;"
    );
    assert_eq!(
        engine.execute("register,Charles,Babbage,1 Difference St,555-0101;"),
        "register,1000000001,2024/03/04;"
    );
    assert_eq!(engine.library().visitors().len(), 2);
}

#[test]
fn a_visit_lasts_from_arrival_to_departure() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    assert_eq!(
        engine.execute("arrive,1000000000;"),
        "arrive,1000000000,2024/03/04,10:00:00;"
    );
    assert_eq!(engine.execute("arrive,1000000000;"), "arrive,duplicate;");
    assert_eq!(engine.execute("advance,0,2;"), "advance,success;");
    assert_eq!(
        engine.execute("depart,1000000000;"),
        "depart,1000000000,12:00:00,02:00:00;"
    );
    assert_eq!(engine.execute("depart,1000000000;"), "depart,invalid-id;");
    assert_eq!(engine.execute("arrive,42;"), "arrive,invalid-id;");
}

#[test]
fn nobody_arrives_after_hours() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("advance,0,12;");
    assert_eq!(engine.execute("datetime;"), "datetime,2024/03/04,22:00:00;");
    assert_eq!(engine.execute("arrive,1000000000;"), "arrive,closed-library;");
    assert!(!engine.library().visitors().is_present(1_000_000_000));
}

#[test]
fn closing_time_sends_everyone_home() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    engine.execute("arrive,1000000000;");
    engine.execute("advance,1,0;");
    assert_eq!(engine.execute("depart,1000000000;"), "depart,invalid-id;");
    assert_eq!(
        engine.execute("report;"),
        "report,2024/03/05\n\
         Number of Books: 0\n\
         Number of Visitors: 1\n\
         Average Length of Visit: 12:00:00\n\
         Number of Books Purchased: 0\n\
         Fines Collected: 0\n\
         Fines Outstanding: 0;"
    );
}

#[test]
fn reports_narrow_to_a_month() {
    let mut engine = setup();
    engine.execute("register,Ada,Lovelace,12 Analytical Way,555-0100;");
    assert!(engine.execute("report,3;").contains("Number of Visitors: 1"));
    assert!(engine.execute("report,4;").contains("Number of Visitors: 0"));
    assert_eq!(engine.execute("report,13;"), "report,invalid-month,13;");
}
