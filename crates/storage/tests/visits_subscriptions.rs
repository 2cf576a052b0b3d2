#![forbid(unsafe_code)]

mod support;

use hist_core::ids::{PrincipalId, StructureId};
use support::open_store;

#[test]
fn visiting_again_replaces_the_marker() {
    let (mut store, _live, _dir) = open_store("visit_marker");
    let user = PrincipalId::new();
    let page = StructureId::new();
    let other = StructureId::new();

    store.mark_resource_visited(user, page, 100).expect("visit");
    store.mark_resource_visited(user, other, 150).expect("visit");
    store.mark_resource_visited(user, page, 200).expect("visit again");

    let visits = store.read_visited(user, None).expect("visits");
    let summary: Vec<_> = visits
        .iter()
        .map(|visit| (visit.structure_id, visit.date_visited))
        .collect();
    assert_eq!(summary, vec![(page, 200), (other, 150)]);

    assert_eq!(store.read_visited(user, Some(180)).expect("recent").len(), 1);
    assert!(
        store
            .read_visited(PrincipalId::new(), None)
            .expect("visits")
            .is_empty()
    );

    assert_eq!(store.delete_visits_older_than(180).expect("expire"), 1);
    assert_eq!(store.read_visited(user, None).expect("visits").len(), 1);
}

#[test]
fn subscriptions_are_soft_deleted_and_revived() {
    let (mut store, _live, _dir) = open_store("subscriptions");
    let principal = PrincipalId::new();
    let page = StructureId::new();
    let other = StructureId::new();

    store.subscribe(principal, page).expect("subscribe");
    store.subscribe(principal, other).expect("subscribe");
    store.subscribe(principal, page).expect("subscribe twice");
    assert_eq!(store.read_subscribed(principal, false).expect("active").len(), 2);

    assert_eq!(store.mark_subscriptions_deleted(page, 500).expect("soft delete"), 1);
    assert_eq!(store.mark_subscriptions_deleted(page, 600).expect("already deleted"), 0);

    let active = store.read_subscribed(principal, false).expect("active");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].structure_id, other);
    assert!(active[0].is_active());

    let all = store.read_subscribed(principal, true).expect("all");
    let deleted = all
        .iter()
        .find(|subscription| subscription.structure_id == page)
        .expect("soft-deleted subscription");
    assert_eq!(deleted.date_deleted, 500);

    store.subscribe(principal, page).expect("revive");
    assert_eq!(store.read_subscribed(principal, false).expect("active").len(), 2);

    assert!(store.unsubscribe(principal, other).expect("unsubscribe"));
    assert!(!store.unsubscribe(principal, other).expect("unsubscribe twice"));

    store.mark_subscriptions_deleted(page, 700).expect("soft delete");
    assert_eq!(store.delete_subscriptions_deleted_before(800).expect("expire"), 1);
    assert!(store.read_subscribed(principal, true).expect("all").is_empty());
}
