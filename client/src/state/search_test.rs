use super::*;

fn hit(title: &str, url: &str) -> RawSearchHit {
    RawSearchHit {
        titulo: title.to_owned(),
        contenido: format!("about {title}"),
        url: url.to_owned(),
        fuente: "wiki".to_owned(),
    }
}

fn searched(state: &mut SearchState, query: &str) {
    state.query = query.to_owned();
    let q = state.begin().unwrap();
    state.finish_success(&q, vec![]);
}

#[test]
fn begin_rejects_blank_and_concurrent_searches() {
    let mut state = SearchState { query: "  ".into(), ..SearchState::default() };
    assert_eq!(state.begin(), None);

    state.query = " rust ".into();
    assert_eq!(state.begin().as_deref(), Some("rust"));
    assert!(state.searching);
    assert_eq!(state.begin(), None);
}

#[test]
fn cancel_stops_searching_and_keeps_results() {
    let mut state = SearchState::default();
    searched(&mut state, "rust");
    state.results = vec![SearchResult::from(hit("Rust", "https://rust-lang.org"))];
    state.query = "tokio".into();
    state.begin().unwrap();

    assert!(state.cancel());
    assert!(!state.searching);
    assert_eq!(state.results.len(), 1);
    assert!(!state.cancel());
    assert_eq!(state.begin().as_deref(), Some("tokio"));
}

#[test]
fn results_map_backend_fields() {
    let mut state = SearchState { query: "rust".into(), ..SearchState::default() };
    state.begin();
    state.finish_success("rust", vec![hit("Rust", "https://rust-lang.org")]);

    assert_eq!(
        state.results,
        vec![SearchResult {
            title: "Rust".into(),
            description: "about Rust".into(),
            url: "https://rust-lang.org".into(),
            source: "wiki".into(),
        }]
    );
    assert!(!state.searching);
}

#[test]
fn recent_searches_are_deduped_newest_first_and_capped() {
    let mut state = SearchState::default();
    for q in ["a", "b", "c", "d", "e", "f", "c"] {
        searched(&mut state, q);
    }
    assert_eq!(state.recent, vec!["c", "f", "e", "d", "b"]);
}

#[test]
fn failure_clears_results_but_keeps_recent() {
    let mut state = SearchState::default();
    searched(&mut state, "a");
    state.results = vec![SearchResult::default()];

    state.query = "b".into();
    state.begin();
    state.finish_failure();
    assert!(state.results.is_empty());
    assert_eq!(state.recent, vec!["a"]);
    assert!(!state.searching);
}

#[test]
fn bookmarks_toggle_by_url() {
    let mut state = SearchState::default();
    let first = SearchResult::from(hit("One", "https://one"));
    let same_url = SearchResult { title: "Other title".into(), ..first.clone() };

    assert!(state.toggle_bookmark(&first));
    assert!(state.is_bookmarked("https://one"));
    assert!(!state.toggle_bookmark(&same_url));
    assert!(state.bookmarks.is_empty());
}
