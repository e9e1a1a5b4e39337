use super::*;
use std::collections::HashMap;

const NOW: i64 = 1_700_000_000_000;

fn events(dates: &[&str]) -> Vec<RawEvent> {
    dates
        .iter()
        .map(|d| RawEvent::new(*d, format!("Event in {}", d), "Something happened."))
        .collect()
}

/// Answers from a fixed table; unknown topics have no events.
struct StubSource {
    topics: HashMap<String, Vec<RawEvent>>,
}

impl StubSource {
    fn with(topics: &[(&str, &[&str])]) -> Arc<Self> {
        Arc::new(Self {
            topics: topics
                .iter()
                .map(|(topic, dates)| (topic.to_string(), events(dates)))
                .collect(),
        })
    }
}

impl EventSource for StubSource {
    fn fetch_events(&self, topic: &str) -> Result<Vec<RawEvent>, FetchError> {
        self.topics.get(topic).cloned().ok_or(FetchError::NoEvents)
    }
}

fn wait_for_fetches(app: &mut ChronoLensApp) {
    for _ in 0..500 {
        if !app.poll_fetches() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("fetches did not finish");
}

#[test]
fn begin_fetch_trims_and_marks_pending() {
    let mut board = Board::default();
    assert_eq!(board.begin_fetch("  Apollo 11 ").unwrap(), "Apollo 11");
    assert_eq!(board.pending(), ["Apollo 11".to_string()]);
    assert!(board.is_fetching());
    assert!(board.is_empty());
}

#[test]
fn empty_topic_is_rejected() {
    let mut board = Board::default();
    assert_eq!(board.begin_fetch("   "), Err(AddTimelineError::EmptyTopic));
    assert!(!board.is_fetching());
}

#[test]
fn duplicate_topic_is_rejected_case_insensitively() {
    let mut board = Board::new(vec![Timeline {
        id: "rome1".into(),
        title: "Roman Empire".into(),
        events: events(&["27"]),
    }]);

    let err = board.begin_fetch("roman EMPIRE").unwrap_err();
    assert_eq!(err, AddTimelineError::Duplicate("roman EMPIRE".into()));
    assert_eq!(err.title(), "Timeline exists");
    assert_eq!(
        err.description(),
        "A timeline for \"roman EMPIRE\" is already on display."
    );
    assert_eq!(board.timelines().len(), 1);
}

#[test]
fn pending_topic_counts_as_duplicate() {
    let mut board = Board::default();
    board.begin_fetch("Moon landing").unwrap();
    assert!(matches!(
        board.begin_fetch("moon landing"),
        Err(AddTimelineError::Duplicate(_))
    ));
    assert_eq!(board.pending().len(), 1);
}

#[test]
fn pending_duplicate_check_folds_non_ascii_case() {
    let mut board = Board::default();
    board.begin_fetch("Émile Zola").unwrap();
    assert_eq!(
        board.begin_fetch("émile zola"),
        Err(AddTimelineError::Duplicate("émile zola".into()))
    );
    assert_eq!(board.pending().len(), 1);
}

#[test]
fn successful_fetch_adds_timeline() {
    let mut board = Board::default();
    let topic = board.begin_fetch("Apollo 11").unwrap();
    let id = board
        .complete_fetch(&topic, Ok(events(&["1969-07-16", "1969-07-20"])), NOW)
        .unwrap();

    assert_eq!(id, "apollo 111700000000000");
    assert!(!board.is_fetching());
    let timeline = &board.timelines()[0];
    assert_eq!(timeline.title, "Apollo 11");
    assert_eq!(timeline.events.len(), 2);
}

#[test]
fn failed_fetch_leaves_timelines_unchanged() {
    let mut board = Board::new(vec![Timeline {
        id: "a1".into(),
        title: "A".into(),
        events: events(&["2000"]),
    }]);
    let before = board.timelines().to_vec();

    let topic = board.begin_fetch("Atlantis").unwrap();
    let err = board
        .complete_fetch(&topic, Err(FetchError::Request("connection refused".into())), NOW)
        .unwrap_err();

    assert_eq!(err.title(), "Error");
    assert_eq!(
        err.description(),
        "An unexpected error occurred while fetching timeline data."
    );
    assert_eq!(board.timelines(), before.as_slice());
    assert!(!board.is_fetching());
}

#[test]
fn empty_result_is_no_timeline() {
    let mut board = Board::default();
    let topic = board.begin_fetch("Nothing").unwrap();
    let err = board.complete_fetch(&topic, Ok(Vec::new()), NOW).unwrap_err();

    assert_eq!(err, AddTimelineError::Fetch(FetchError::NoEvents));
    assert_eq!(
        err.description(),
        "Failed to generate timeline. The topic might not be found or lacks significant events."
    );
    assert!(board.is_empty());
}

#[test]
fn fetches_may_finish_out_of_order() {
    let mut board = Board::default();
    let first = board.begin_fetch("First").unwrap();
    let second = board.begin_fetch("Second").unwrap();

    board.complete_fetch(&second, Ok(events(&["1900"])), NOW).unwrap();
    assert_eq!(board.pending(), [first.clone()]);
    board.complete_fetch(&first, Ok(events(&["1800"])), NOW + 5).unwrap();

    let titles: Vec<&str> = board.timelines().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Second", "First"]);
    assert!(!board.is_fetching());
}

#[test]
fn clashing_ids_are_disambiguated() {
    let mut board = Board::new(vec![Timeline {
        id: "x1700000000000".into(),
        title: "Something else".into(),
        events: events(&["2000"]),
    }]);
    let topic = board.begin_fetch("X").unwrap();
    let id = board.complete_fetch(&topic, Ok(events(&["2001"])), NOW).unwrap();
    assert_eq!(id, "x1700000000000-2");
}

#[test]
fn remove_and_clear() {
    let mut board = Board::default();
    for (i, topic) in ["A", "B", "C"].iter().enumerate() {
        let topic = board.begin_fetch(topic).unwrap();
        board.complete_fetch(&topic, Ok(events(&["2000"])), NOW + i as i64).unwrap();
    }

    let removed = board.remove("b1700000000001").unwrap();
    assert_eq!(removed.title, "B");
    assert!(board.remove("missing").is_none());
    assert_eq!(board.timelines().len(), 2);

    board.clear();
    assert!(board.is_empty());
}

#[test]
fn zoom_steps_are_bounded() {
    assert_eq!(zoom_in(1.0), 1.5);
    assert!((zoom_out(1.5) - 1.0).abs() < 1e-6);

    let mut zoom = 1.0;
    for _ in 0..20 {
        zoom = zoom_in(zoom);
    }
    assert_eq!(zoom, MAX_ZOOM);
    assert!(!can_zoom_in(zoom));
    assert!(can_zoom_out(zoom));

    for _ in 0..40 {
        zoom = zoom_out(zoom);
    }
    assert_eq!(zoom, MIN_ZOOM);
    assert!(!can_zoom_out(zoom));
}

#[test]
fn notifications_expire() {
    let notification = Notification::new("Error", "boom");
    let now = Instant::now();
    assert!(!notification.is_expired(now));
    assert!(notification.is_expired(now + Duration::from_secs(9)));
}

#[test]
fn first_launch_fetches_seed_topic() {
    let dir = tempfile::tempdir().unwrap();
    let store = TimelineStore::at(dir.path().join("timelines.json"));
    let source = StubSource::with(&[("History of the Internet", &["1969", "1983", "1991"])]);

    let mut app = ChronoLensApp::with_source(Settings::default(), store, source);
    assert!(app.board().is_fetching());
    wait_for_fetches(&mut app);

    assert_eq!(app.board().timelines().len(), 1);
    assert_eq!(app.board().timelines()[0].title, "History of the Internet");

    // The new board was persisted
    let reloaded = TimelineStore::at(dir.path().join("timelines.json")).load().unwrap();
    assert_eq!(reloaded, app.board().timelines());
}

#[test]
fn stored_timelines_skip_seeding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelines.json");
    TimelineStore::at(&path).save(&[]);

    let app = ChronoLensApp::with_source(
        Settings::default(),
        TimelineStore::at(&path),
        StubSource::with(&[]),
    );
    assert!(!app.board().is_fetching());
    assert!(app.board().is_empty());
}

#[test]
fn corrupt_store_starts_empty_without_seeding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelines.json");
    std::fs::write(&path, "not json").unwrap();

    let app = ChronoLensApp::with_source(
        Settings::default(),
        TimelineStore::at(&path),
        StubSource::with(&[("History of the Internet", &["1969"])]),
    );
    assert!(!app.board().is_fetching());
    assert!(app.board().is_empty());
}

#[test]
fn failed_seed_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let store = TimelineStore::at(dir.path().join("timelines.json"));

    let mut app = ChronoLensApp::with_source(Settings::default(), store, StubSource::with(&[]));
    wait_for_fetches(&mut app);

    assert!(app.board().is_empty());
    assert_eq!(app.notifications().len(), 1);
    assert_eq!(app.notifications()[0].title, "Could not load initial timeline");
}

#[test]
fn add_remove_and_clear_through_app() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timelines.json");
    let settings = Settings {
        seed_topic: None,
        ..Settings::default()
    };
    let source = StubSource::with(&[("Apollo 11", &["1969"]), ("Hubble", &["1990", "2009"])]);
    let mut app = ChronoLensApp::with_source(settings, TimelineStore::at(&path), source);

    assert!(!app.add_timeline(""));
    assert_eq!(app.notifications()[0].description, "Topic cannot be empty.");

    assert!(app.add_timeline("Apollo 11"));
    assert!(app.add_timeline("Hubble"));
    assert!(!app.add_timeline("hubble"));
    wait_for_fetches(&mut app);
    assert_eq!(app.board().timelines().len(), 2);

    let id = app.board().timelines()[0].id.clone();
    app.remove_timeline(&id);
    assert_eq!(TimelineStore::at(&path).load().unwrap().len(), 1);

    app.clear_all();
    assert!(app.board().is_empty());
    assert!(!path.exists());
}

#[test]
fn zoom_is_clamped_in_settings() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        seed_topic: None,
        ..Settings::default()
    };
    let mut app = ChronoLensApp::with_source(
        settings,
        TimelineStore::at(dir.path().join("timelines.json")),
        StubSource::with(&[]),
    );

    app.set_zoom(100.0);
    assert_eq!(app.zoom(), MAX_ZOOM);
    app.set_zoom(0.0);
    assert_eq!(app.zoom(), MIN_ZOOM);
}

fn app_with(source: Arc<StubSource>, dir: &tempfile::TempDir) -> ChronoLensApp {
    let settings = Settings {
        seed_topic: None,
        ..Settings::default()
    };
    ChronoLensApp::with_source(settings, TimelineStore::at(dir.path().join("timelines.json")), source)
}

#[test]
fn clicking_a_card_toggles_its_description() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(StubSource::with(&[]), &dir);
    let key = CardKey {
        timeline_id: "apollo 111700000000000".into(),
        index: 2,
    };

    assert!(!app.is_expanded(&key));
    app.toggle_card(key.clone());
    assert!(app.is_expanded(&key));

    // Other cards in the column stay collapsed
    let neighbour = CardKey { index: 3, ..key.clone() };
    assert!(!app.is_expanded(&neighbour));

    app.toggle_card(key.clone());
    assert!(!app.is_expanded(&key));
}

#[test]
fn removing_a_timeline_forgets_its_expanded_cards() {
    let dir = tempfile::tempdir().unwrap();
    let source = StubSource::with(&[("Apollo 11", &["1969", "1972"]), ("Hubble", &["1990"])]);
    let mut app = app_with(source, &dir);
    app.add_timeline("Apollo 11");
    app.add_timeline("Hubble");
    wait_for_fetches(&mut app);

    let ids: Vec<String> = app.board().timelines().iter().map(|t| t.id.clone()).collect();
    let card = |id: &str, index| CardKey {
        timeline_id: id.to_string(),
        index,
    };
    for id in &ids {
        app.toggle_card(card(id, 0));
    }

    app.remove_timeline(&ids[0]);
    assert!(!app.is_expanded(&card(&ids[0], 0)));
    assert!(app.is_expanded(&card(&ids[1], 0)));

    app.clear_all();
    assert!(!app.is_expanded(&card(&ids[1], 0)));
}
