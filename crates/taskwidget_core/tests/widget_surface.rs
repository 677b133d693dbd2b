use taskwidget_core::db::open_db_in_memory;
use taskwidget_core::{
    BoardService, PrefsRepository, SqlitePrefsRepository, WidgetActionOutcome, WidgetService,
    DEFAULT_LIST_NAME, KEY_CURRENT_LIST, KEY_TASK_LISTS, WIDGET_TASK_CAP,
};

const NOW: i64 = 1_700_000_000_000;

fn seed_tasks(repo: &SqlitePrefsRepository<'_>, count: usize) -> Vec<String> {
    let mut board = BoardService::load(repo).unwrap();
    (0..count)
        .map(|n| board.add_task(&format!("task {n}"), None).unwrap())
        .collect()
}

#[test]
fn render_caps_rows_and_reports_overflow() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    seed_tasks(&repo, 11);

    let snapshot = WidgetService::new(&repo).render(NOW).unwrap();
    assert_eq!(snapshot.rows.len(), WIDGET_TASK_CAP);
    assert_eq!(snapshot.overflow, 3);
    assert_eq!(
        snapshot.overflow_label().as_deref(),
        Some("... and 3 more tasks")
    );
    assert_eq!(snapshot.rows[7].index, 7);
    assert_eq!(snapshot.rows[7].text, "task 7");
}

#[test]
fn title_counts_completed_among_shown_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let ids = seed_tasks(&repo, 10);
    let mut board = BoardService::load(&repo).unwrap();
    board.toggle_task(&ids[0]).unwrap();
    board.toggle_task(&ids[9]).unwrap();
    board
        .set_due_date(&ids[1], Some(NOW + 3 * 24 * 60 * 60 * 1000))
        .unwrap();

    let snapshot = WidgetService::new(&repo).render(NOW).unwrap();
    assert_eq!(snapshot.completed_count, 1);
    assert_eq!(snapshot.title, format!("{DEFAULT_LIST_NAME} (1/8)"));
    assert_eq!(snapshot.rows[1].due_badge.as_deref(), Some("3d"));
    assert_eq!(snapshot.rows[0].due_badge, None);
}

#[test]
fn render_without_stored_blob_shows_placeholder_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let widget = WidgetService::new(&repo);

    let snapshot = widget.render(NOW).unwrap();
    assert_eq!(snapshot.list_name, DEFAULT_LIST_NAME);
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.overflow_label(), None);

    assert_eq!(
        widget.toggle_at(0).unwrap(),
        WidgetActionOutcome::OutOfRange { index: 0, len: 0 }
    );
    assert_eq!(repo.get_value(KEY_TASK_LISTS).unwrap(), None);
}

#[test]
fn render_follows_current_list_pointer_with_first_list_fallback() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    repo.put_value(
        KEY_TASK_LISTS,
        r#"[{"id":"a","name":"A","tasks":[]},{"id":"b","name":"B","tasks":[{"id":"t","text":"only","completed":false}]}]"#,
    )
    .unwrap();
    let widget = WidgetService::new(&repo);

    repo.put_value(KEY_CURRENT_LIST, "b").unwrap();
    let snapshot = widget.render(NOW).unwrap();
    assert_eq!(snapshot.list_name, "B");
    assert_eq!(snapshot.rows[0].task_id, "t");

    repo.put_value(KEY_CURRENT_LIST, "unknown").unwrap();
    assert_eq!(widget.render(NOW).unwrap().list_name, "A");
}

#[test]
fn toggle_at_flips_exactly_the_task_at_that_position() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let ids = seed_tasks(&repo, 4);
    let widget = WidgetService::new(&repo);

    let outcome = widget.toggle_at(2).unwrap();
    assert_eq!(
        outcome,
        WidgetActionOutcome::Toggled {
            task_id: ids[2].clone(),
            completed: true,
        }
    );

    let board = BoardService::load(&repo).unwrap();
    let completed = board
        .current_list()
        .tasks
        .iter()
        .map(|task| task.completed)
        .collect::<Vec<_>>();
    assert_eq!(completed, vec![false, false, true, false]);
}

#[test]
fn delete_at_removes_exactly_the_task_at_that_position() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let ids = seed_tasks(&repo, 3);
    let widget = WidgetService::new(&repo);

    assert_eq!(
        widget.delete_at(0).unwrap(),
        WidgetActionOutcome::Deleted {
            task_id: ids[0].clone()
        }
    );
    let remaining = BoardService::load(&repo)
        .unwrap()
        .current_list()
        .tasks
        .iter()
        .map(|task| task.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(remaining, vec![ids[1].clone(), ids[2].clone()]);
}

#[test]
fn positional_action_after_reorder_hits_the_task_now_at_that_position() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    let ids = seed_tasks(&repo, 3);
    let widget = WidgetService::new(&repo);
    let rendered = widget.render(NOW).unwrap();
    assert_eq!(rendered.rows[0].task_id, ids[0]);

    let mut board = BoardService::load(&repo).unwrap();
    board.reorder_task(&ids[2], 0).unwrap();

    let outcome = widget.toggle_at(rendered.rows[0].index).unwrap();
    assert_eq!(
        outcome,
        WidgetActionOutcome::Toggled {
            task_id: ids[2].clone(),
            completed: true,
        }
    );
}

#[test]
fn out_of_range_actions_leave_the_blob_untouched() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    seed_tasks(&repo, 2);
    let before = repo.get_value(KEY_TASK_LISTS).unwrap();
    let widget = WidgetService::new(&repo);

    assert_eq!(
        widget.delete_at(5).unwrap(),
        WidgetActionOutcome::OutOfRange { index: 5, len: 2 }
    );
    assert_eq!(repo.get_value(KEY_TASK_LISTS).unwrap(), before);
}

#[test]
fn widget_rewrite_keeps_lists_with_wrong_typed_optional_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePrefsRepository::try_new(&conn).unwrap();
    repo.put_value(
        KEY_TASK_LISTS,
        r#"[
            {"id":"l","name":"L","tasks":[{"id":"a","text":"tap me","completed":false}]},
            {"id":"m","name":"M","color":"blue","tasks":[
                {"id":"k","text":"keep me","completed":false,"dueDate":"soon"}
            ]}
        ]"#,
    )
    .unwrap();
    repo.put_value(KEY_CURRENT_LIST, "l").unwrap();

    assert_eq!(
        WidgetService::new(&repo).toggle_at(0).unwrap(),
        WidgetActionOutcome::Toggled {
            task_id: "a".to_string(),
            completed: true,
        }
    );

    let stored = taskwidget_core::decode_lists(&repo.get_value(KEY_TASK_LISTS).unwrap().unwrap());
    assert_eq!(stored.skipped, 0);
    let kept = stored.lists.iter().find(|list| list.id == "m").unwrap();
    assert_eq!(kept.color, taskwidget_core::DEFAULT_LIST_COLOR);
    assert_eq!(kept.tasks[0].text, "keep me");
    assert_eq!(kept.tasks[0].due_date, None);
}
