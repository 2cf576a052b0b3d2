#![forbid(unsafe_code)]

mod support;

use hist_core::history::{PrincipalKind, PrincipalSnapshot};
use hist_core::ids::PrincipalId;
use rusqlite::Connection;
use support::{open_store, project_request};

fn principal(principal_id: PrincipalId, name: &str) -> PrincipalSnapshot {
    PrincipalSnapshot {
        principal_id,
        name: name.to_string(),
        ou: "/".to_string(),
        description: String::new(),
        email: format!("{name}@example.org"),
        kind: PrincipalKind::User,
        deleted_by: PrincipalId::nil(),
        deleted_date: 1_700_000_000_000,
    }
}

#[test]
fn principal_is_archived_once() {
    let (mut store, _live, dir) = open_store("principal_once");
    let principal_id = PrincipalId::new();

    assert!(store.write_principal(&principal(principal_id, "alice")).expect("first write"));
    assert!(!store.write_principal(&principal(principal_id, "renamed")).expect("second write"));

    let archived = store.read_principal(principal_id).expect("read principal");
    assert_eq!(archived.name, "alice");
    assert_eq!(archived.kind, PrincipalKind::User);

    let conn = Connection::open(dir.join("history.db")).expect("open raw connection");
    let rows: i64 = conn
        .query_row("SELECT COUNT(1) FROM history_principals", [], |row| row.get(0))
        .expect("count principals");
    assert_eq!(rows, 1);
}

#[test]
fn unknown_principal_is_not_found() {
    let (mut store, _live, _dir) = open_store("unknown_principal");
    let err = store
        .read_principal(PrincipalId::new())
        .expect_err("missing principal");
    assert!(err.is_not_found());
}

#[test]
fn publish_events_are_listed_newest_first() {
    let (mut store, _live, _dir) = open_store("publish_events");

    let first = store
        .write_project(&project_request(1, 100, &["/b.txt", "/a.txt"]))
        .expect("first publish");
    assert_eq!(first.paths, vec!["/a.txt".to_string(), "/b.txt".to_string()]);
    store
        .write_project(&project_request(2, 200, &["/c.txt"]))
        .expect("second publish");

    let records = store.read_projects(10).expect("projects");
    let tags: Vec<_> = records.iter().map(|record| record.publish_tag).collect();
    assert_eq!(tags, vec![2, 1]);
    assert_eq!(records[0].paths, vec!["/c.txt".to_string()]);

    assert_eq!(store.read_projects(1).expect("projects").len(), 1);
    assert_eq!(
        store.read_project_resources(1).expect("paths"),
        vec!["/a.txt".to_string(), "/b.txt".to_string()]
    );
    assert!(store.read_project(3).expect_err("missing").is_not_found());
}
