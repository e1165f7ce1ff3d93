use super::*;
use crate::test_support::{criteria, page, FakeError, ScriptedApi};

fn names(items: &[Arc<Item>]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

fn loaded(entries: &[(&str, &str)]) -> Session {
    let mut session = Session::new(criteria("Restaurants"), 20);
    let ticket = session.request_next_page().unwrap();
    session
        .complete_page::<FakeError>(ticket, Ok(page(entries)))
        .unwrap();
    session
}

fn roma() -> Session {
    loaded(&[("a", "Cafe Roma"), ("b", "Roma Pizza"), ("c", "Sushi Bar")])
}

#[test]
fn only_one_ticket_while_fetch_pending() {
    let mut session = Session::new(criteria("Restaurants"), 20);
    let issued = (0..5).filter_map(|_| session.request_next_page()).count();
    assert_eq!(issued, 1);
    assert!(session.cursor().in_flight);
}

#[test]
fn scroll_near_end_requests_a_page() {
    let mut session = Session::new(criteria("Restaurants"), 20);
    let far = ScrollMetrics {
        content_height: 5000.0,
        viewport_height: 800.0,
        scroll_offset: 0.0,
        dragging: true,
    };
    assert!(session.on_scroll(&far).is_none());

    let near = ScrollMetrics {
        scroll_offset: 4000.0,
        ..far
    };
    assert!(session.on_scroll(&near).is_some());
    assert!(session.on_scroll(&near).is_none(), "already in flight");
}

#[test]
fn first_page_publishes_everything() {
    let session = roma();
    assert_eq!(
        names(session.current_list()),
        vec!["Cafe Roma", "Roma Pizza", "Sushi Bar"]
    );
    assert_eq!(session.current_annotations().len(), 3);
    assert_eq!(session.cursor().offset, 3);
}

#[test]
fn new_criteria_offset_is_first_page_count() {
    let mut session = roma();
    let (ticket, change) = session.apply_new_criteria(criteria("Bars"));
    assert_eq!(names(&change.removed), vec!["Cafe Roma", "Roma Pizza", "Sushi Bar"]);
    assert!(change.list.is_empty());
    assert!(session.current_annotations().is_empty());

    session
        .complete_page::<FakeError>(ticket.unwrap(), Ok(page(&[("x", "Bar X"), ("y", "Bar Y")])))
        .unwrap();
    assert_eq!(session.cursor().offset, 2);
    assert_eq!(names(session.current_list()), vec!["Bar X", "Bar Y"]);
}

#[test]
fn query_narrows_to_matching_names() {
    let mut session = roma();
    let change = session.set_query("roma");

    assert!(session.filter_state().active);
    assert_eq!(names(session.current_list()), vec!["Cafe Roma", "Roma Pizza"]);
    assert!(change.added.is_empty());
    assert_eq!(names(&change.removed), vec!["Sushi Bar"]);
}

#[test]
fn empty_query_restores_full_list() {
    let mut session = roma();
    session.set_query("roma");
    let change = session.set_query("");

    assert!(!session.filter_state().active);
    assert_eq!(session.current_list().len(), 3);
    assert_eq!(names(&change.added), vec!["Sushi Bar"]);
}

#[test]
fn unmatched_query_shows_full_list() {
    let mut session = roma();
    let change = session.set_query("tacos");
    assert!(!session.filter_state().active);
    assert_eq!(session.current_list().len(), 3);
    assert!(change.is_empty());
}

#[test]
fn failed_fetch_leaves_results_and_offset() {
    let mut session = roma();
    let ticket = session.request_next_page().unwrap();
    let err = session
        .complete_page(ticket, Err(FakeError("offline".into())))
        .unwrap_err();

    assert_eq!(err, FakeError("offline".into()));
    assert_eq!(session.results().len(), 3);
    assert_eq!(
        session.cursor(),
        PageCursor {
            offset: 3,
            in_flight: false
        }
    );
}

#[test]
fn next_page_is_filtered_by_active_query() {
    let mut session = roma();
    session.set_query("roma");

    let ticket = session.request_next_page().unwrap();
    let change = session
        .complete_page::<FakeError>(ticket, Ok(page(&[("d", "Roma Deli"), ("e", "Taco Stand")])))
        .unwrap()
        .unwrap();

    assert_eq!(names(&change.added), vec!["Roma Deli"]);
    assert!(change.removed.is_empty());
    assert_eq!(
        names(session.current_list()),
        vec!["Cafe Roma", "Roma Pizza", "Roma Deli"]
    );
    assert_eq!(session.results().len(), 5);
}

#[test]
fn stale_completion_publishes_nothing() {
    let mut session = roma();
    let stale = session.request_next_page().unwrap();
    let (ticket, _) = session.apply_new_criteria(criteria("Bars"));
    assert!(ticket.is_none());

    let change = session
        .complete_page::<FakeError>(stale, Ok(page(&[("old", "Old Diner")])))
        .unwrap();
    assert!(change.is_none());
    assert!(session.current_list().is_empty());

    let reload = session.take_pending_reload().unwrap();
    assert_eq!(reload.query().criteria.term, "Bars");
    assert_eq!(reload.query().offset, 0);
}

#[test]
fn map_region_centers_on_search_location() {
    let session = Session::new(criteria("Restaurants"), 20);
    assert_eq!(session.map_region().center, session.criteria().location);
}

#[tokio::test]
async fn load_next_page_fetches_through_api() {
    let api = ScriptedApi::new(vec![
        Ok(page(&[("a", "Cafe Roma")])),
        Ok(page(&[("b", "Roma Pizza")])),
    ]);
    let mut session = Session::new(criteria("Restaurants"), 1);

    session.load_next_page(&api).await.unwrap();
    session.load_next_page(&api).await.unwrap();

    let offsets: Vec<usize> = api.queries().iter().map(|q| q.offset).collect();
    assert_eq!(offsets, vec![0, 1]);
    assert_eq!(names(session.current_list()), vec!["Cafe Roma", "Roma Pizza"]);
}

#[tokio::test]
async fn load_next_page_wraps_fetch_errors() {
    let api = ScriptedApi::new(vec![Err(FakeError("offline".into()))]);
    let mut session = Session::new(criteria("Restaurants"), 20);

    let err = session.load_next_page(&api).await.unwrap_err();
    assert!(matches!(err, SessionError::Fetch(_)));
    assert!(err.to_string().contains("offline"));
    assert!(!session.cursor().in_flight);
}

#[tokio::test]
async fn load_next_page_stops_when_exhausted() {
    let api = ScriptedApi::new(vec![]);
    let mut session = Session::new(criteria("Restaurants"), 20);

    session.load_next_page(&api).await.unwrap();
    assert!(session.is_exhausted());
    assert!(session.load_next_page(&api).await.unwrap().is_none());
    assert_eq!(api.queries().len(), 1);
}
