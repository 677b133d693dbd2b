use taskwidget_core::db::open_db_in_memory;
use taskwidget_core::{
    decode_lists, BoardError, BoardService, PrefsRepository, SqlitePrefsRepository,
    DEFAULT_LIST_ID, DEFAULT_LIST_NAME, KEY_CURRENT_LIST, KEY_TASK_LISTS,
};

fn stored_list_names(repo: &SqlitePrefsRepository<'_>) -> Vec<String> {
    let raw = repo.get_value(KEY_TASK_LISTS).unwrap().unwrap();
    decode_lists(&raw)
        .lists
        .into_iter()
        .map(|list| list.name)
        .collect()
}

#[test]
fn empty_store_synthesizes_and_persists_default_list() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();

    let board = BoardService::load(&repo).unwrap();
    assert_eq!(board.lists().len(), 1);
    assert_eq!(board.current_list_id(), DEFAULT_LIST_ID);
    assert_eq!(board.current_list().name, DEFAULT_LIST_NAME);

    assert_eq!(stored_list_names(&repo), vec![DEFAULT_LIST_NAME.to_string()]);
    assert_eq!(
        repo.get_value(KEY_CURRENT_LIST).unwrap().as_deref(),
        Some(DEFAULT_LIST_ID)
    );
}

#[test]
fn create_list_switches_current_and_persists() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let mut board = BoardService::load(&repo).unwrap();

    let id = board.create_list("  Groceries ").unwrap();
    assert_eq!(board.current_list_id(), id);
    assert_eq!(board.current_list().name, "Groceries");
    assert_eq!(
        stored_list_names(&repo),
        vec![DEFAULT_LIST_NAME.to_string(), "Groceries".to_string()]
    );
    assert_eq!(repo.get_value(KEY_CURRENT_LIST).unwrap(), Some(id));
}

#[test]
fn duplicate_list_names_are_rejected_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let mut board = BoardService::load(&repo).unwrap();

    board.create_list("Work").unwrap();
    let err = board.create_list("wORK").unwrap_err();
    assert!(matches!(err, BoardError::DuplicateListName(name) if name == "wORK"));
    let err = board.create_list("my tasks").unwrap_err();
    assert!(matches!(err, BoardError::DuplicateListName(_)));
    assert_eq!(board.lists().len(), 2);
}

#[test]
fn blank_list_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let mut board = BoardService::load(&repo).unwrap();

    assert!(matches!(
        board.create_list("   ").unwrap_err(),
        BoardError::EmptyListName
    ));
}

#[test]
fn rename_enforces_uniqueness_against_other_lists_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let mut board = BoardService::load(&repo).unwrap();
    let work = board.create_list("Work").unwrap();

    board.rename_list(&work, "WORK").unwrap();
    assert_eq!(board.current_list().name, "WORK");

    assert!(matches!(
        board.rename_list(&work, "WORK").unwrap_err(),
        BoardError::UnchangedListName
    ));
    assert!(matches!(
        board.rename_list(&work, "my TASKS").unwrap_err(),
        BoardError::DuplicateListName(_)
    ));
    assert!(matches!(
        board.rename_list("missing", "Other").unwrap_err(),
        BoardError::ListNotFound(_)
    ));
    assert_eq!(
        stored_list_names(&repo),
        vec![DEFAULT_LIST_NAME.to_string(), "WORK".to_string()]
    );
}

#[test]
fn at_least_one_list_survives_any_delete_sequence() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let mut board = BoardService::load(&repo).unwrap();
    board.create_list("A").unwrap();
    board.create_list("B").unwrap();

    let ids = board
        .lists()
        .iter()
        .map(|list| list.id.clone())
        .collect::<Vec<_>>();
    let mut refused = 0;
    for id in ids.iter().chain(ids.iter()) {
        match board.delete_list(id) {
            Ok(()) | Err(BoardError::ListNotFound(_)) => {}
            Err(BoardError::LastList) => refused += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
        assert!(!board.lists().is_empty());
        assert!(board
            .lists()
            .iter()
            .any(|list| list.id == board.current_list_id()));
    }

    assert_eq!(board.lists().len(), 1);
    assert!(refused >= 1);
    assert_eq!(stored_list_names(&repo).len(), 1);
}

#[test]
fn deleting_current_list_falls_back_to_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let mut board = BoardService::load(&repo).unwrap();
    let errands = board.create_list("Errands").unwrap();

    board.delete_list(&errands).unwrap();
    assert_eq!(board.current_list_id(), DEFAULT_LIST_ID);
    assert_eq!(
        repo.get_value(KEY_CURRENT_LIST).unwrap().as_deref(),
        Some(DEFAULT_LIST_ID)
    );
}

#[test]
fn select_list_rejects_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let mut board = BoardService::load(&repo).unwrap();
    board.create_list("Other").unwrap();

    board.select_list(DEFAULT_LIST_ID).unwrap();
    assert_eq!(board.current_list_id(), DEFAULT_LIST_ID);
    assert!(matches!(
        board.select_list("nope").unwrap_err(),
        BoardError::ListNotFound(_)
    ));
    assert_eq!(board.current_list_id(), DEFAULT_LIST_ID);
}

#[test]
fn stale_current_pointer_is_repaired_on_load() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    repo.put_value(KEY_TASK_LISTS, r#"[{"id":"x","name":"X"},{"id":"y","name":"Y"}]"#)
        .unwrap();
    repo.put_value(KEY_CURRENT_LIST, "gone").unwrap();

    let board = BoardService::load(&repo).unwrap();
    assert_eq!(board.current_list_id(), "x");
    assert_eq!(
        repo.get_value(KEY_CURRENT_LIST).unwrap().as_deref(),
        Some("x")
    );
}

#[test]
fn valid_stored_pointer_is_kept() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    repo.put_value(KEY_TASK_LISTS, r#"[{"id":"x","name":"X"},{"id":"y","name":"Y"}]"#)
        .unwrap();
    repo.put_value(KEY_CURRENT_LIST, "y").unwrap();

    let board = BoardService::load(&repo).unwrap();
    assert_eq!(board.current_list().name, "Y");
}
