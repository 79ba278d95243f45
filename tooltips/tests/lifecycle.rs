mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::RecordingFactory;
use tipdom::{Document, Element, NodeId};
use tooltips::{
    FnFactory, Mutation, Tooltip, TooltipOptions, Tooltips, TooltipsConfig, TooltipsError,
};

fn list_page() -> (Document, NodeId) {
    let doc = Document::new();
    doc.append(
        doc.root(),
        Element::div().id("dynamic").child(
            Element::list()
                .id("targets")
                .child(Element::item().id("existing").data("tip", "Existing")),
        ),
    )
    .unwrap();
    let existing = doc.find_by_id("existing").unwrap();
    (doc, existing)
}

fn watching() -> TooltipsConfig {
    TooltipsConfig::new().key("tip").observe(true)
}

// ============================================================================
// Toggle
// ============================================================================

#[test]
fn test_same_event_toggles_starting_hidden() {
    let doc = Document::new();
    let node = doc.append(doc.root(), Element::item().data("tooltip", "Click")).unwrap();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(
        doc.clone(),
        doc.root(),
        TooltipsConfig::new().toggle_on("click"),
        factory,
    )
    .unwrap();

    // One subscription, so one toggle per event
    assert_eq!(doc.listener_count(node), 1);

    let mut seen = Vec::new();
    for _ in 0..4 {
        doc.dispatch(node, "click");
        seen.push(tips.get(node).unwrap().unwrap().is_visible());
    }

    assert_eq!(seen, vec![true, false, true, false]);
}

#[test]
fn test_bubbled_event_targets_subscribed_node() {
    let doc = Document::new();
    let button = doc
        .append(
            doc.root(),
            Element::new("button")
                .data("tooltip", "Parent tip")
                .child(Element::new("span").id("label")),
        )
        .unwrap();
    let label = doc.find_by_id("label").unwrap();
    let (factory, log) = RecordingFactory::new();
    let _tips = Tooltips::new(
        doc.clone(),
        doc.root(),
        TooltipsConfig::new().toggle_on("click"),
        factory,
    )
    .unwrap();

    doc.dispatch(label, "click");

    let log = log.borrow();
    assert_eq!(log.created.len(), 1);
    assert_eq!(log.created[0].anchor, Some(button));
    assert_eq!(log.count("show"), 1);
}

// ============================================================================
// Mutation watching
// ============================================================================

#[test]
fn test_inserted_node_binds_without_add() {
    let (doc, _) = list_page();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();
    assert!(tips.is_watching().unwrap());

    let list = doc.find_by_id("targets").unwrap();
    let new = doc
        .append(list, Element::item().data("tip", "A new tip appeared!"))
        .unwrap();

    assert!(tips.is_bound(new).unwrap());
    assert_eq!(doc.listener_count(new), 2);
}

#[test]
fn test_inserted_subtree_binds_nested_matches() {
    let (doc, _) = list_page();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();
    let before = tips.len().unwrap();

    let deep = doc.find_by_id("targets").unwrap();
    doc.append(
        deep,
        Element::div().child(
            Element::div()
                .child(Element::item().data("tip", "x"))
                .child(Element::item().data("tip", "y")),
        ),
    )
    .unwrap();

    assert_eq!(tips.len().unwrap(), before + 2);
}

#[test]
fn test_removed_node_unbinds_and_destroys() {
    let (doc, existing) = list_page();
    let (factory, log) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();

    doc.dispatch(existing, "mouseenter");
    doc.remove(existing).unwrap();

    assert!(!tips.is_bound(existing).unwrap());
    assert_eq!(doc.listener_count(existing), 0);
    assert_eq!(log.borrow().count("destroy"), 1);
}

#[test]
fn test_batch_added_then_removed() {
    let (doc, _) = list_page();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();
    let list = doc.find_by_id("targets").unwrap();

    let (gone, kept) = doc.batch(|doc| {
        let gone = doc.append(list, Element::item().data("tip", "gone")).unwrap();
        let kept = doc.append(list, Element::item().data("tip", "kept")).unwrap();
        doc.remove(gone).unwrap();
        (gone, kept)
    });

    assert!(!tips.is_bound(gone).unwrap());
    assert!(tips.is_bound(kept).unwrap());
    assert_eq!(doc.listener_count(gone), 0);
}

#[test]
fn test_moved_node_stays_bound() {
    let (doc, existing) = list_page();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();
    let other = doc.append(doc.root(), Element::div()).unwrap();

    doc.append_child(other, existing).unwrap();

    assert!(tips.is_bound(existing).unwrap());
    assert_eq!(doc.listener_count(existing), 2);
}

#[test]
fn test_mutations_outside_root_are_ignored() {
    let doc = Document::new();
    let scope = doc.append(doc.root(), Element::div()).unwrap();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), scope, watching(), factory).unwrap();

    let outside = doc.append(doc.root(), Element::item().data("tip", "out")).unwrap();
    let inside = doc.append(scope, Element::item().data("tip", "in")).unwrap();

    assert!(!tips.is_bound(outside).unwrap());
    assert!(tips.is_bound(inside).unwrap());
}

#[test]
fn test_unsupported_host_falls_back_to_reload() {
    let doc = Document::without_observers();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();
    assert!(!tips.is_watching().unwrap());

    let node = doc.append(doc.root(), Element::item().data("tip", "late")).unwrap();
    assert!(!tips.is_bound(node).unwrap());

    tips.reload().unwrap();
    assert!(tips.is_bound(node).unwrap());
}

#[test]
fn test_manual_mutation_batches() {
    let doc = Document::without_observers();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();

    let a = doc.append(doc.root(), Element::item().data("tip", "a")).unwrap();
    let b = doc.append(doc.root(), Element::item().data("tip", "b")).unwrap();
    tips.apply(&[Mutation {
        added: vec![a, b],
        removed: vec![],
    }])
    .unwrap();
    assert_eq!(tips.bound().unwrap(), vec![a, b]);

    doc.remove(a).unwrap();
    tips.apply(&[Mutation {
        added: vec![],
        removed: vec![a],
    }])
    .unwrap();
    assert_eq!(tips.bound().unwrap(), vec![b]);
}

/// A widget that renders itself into the document on show, the way a real
/// tooltip inserts its element under the body.
struct Rendered {
    doc: Document,
    element: Option<NodeId>,
    destroyed: Rc<RefCell<usize>>,
}

impl Tooltip<NodeId> for Rendered {
    fn show(&mut self) {
        if self.element.is_none() {
            let el = self
                .doc
                .append(self.doc.root(), Element::div().data("role", "tooltip"))
                .unwrap();
            self.element = Some(el);
        }
    }

    fn hide(&mut self) {
        if let Some(el) = self.element.take() {
            self.doc.remove(el).unwrap();
        }
    }

    fn is_visible(&self) -> bool {
        self.element.is_some()
    }

    fn destroy(&mut self) {
        self.hide();
        *self.destroyed.borrow_mut() += 1;
    }
}

#[test]
fn test_widget_mutating_observed_tree() {
    let (doc, existing) = list_page();
    let destroyed = Rc::new(RefCell::new(0));

    let host = doc.clone();
    let counter = destroyed.clone();
    let factory = FnFactory::new(
        TooltipOptions::new(),
        move |_: &str, _: TooltipOptions| -> Box<dyn Tooltip<NodeId>> {
            Box::new(Rendered {
                doc: host.clone(),
                element: None,
                destroyed: counter.clone(),
            })
        },
    );
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();

    doc.dispatch(existing, "mouseenter");
    assert!(tips.get(existing).unwrap().unwrap().is_visible());
    assert_eq!(doc.children(doc.root()).len(), 2);

    doc.dispatch(existing, "mouseleave");
    assert_eq!(doc.children(doc.root()).len(), 1);

    tips.destroy().unwrap();
    assert_eq!(*destroyed.borrow(), 1);
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn test_managers_over_shared_tree_are_isolated() {
    let doc = Document::new();
    let node = doc
        .append(
            doc.root(),
            Element::new("input").data("tip", "Hover").data("ftip", "Focus"),
        )
        .unwrap();
    let (hover_factory, hover_log) = RecordingFactory::new();
    let (focus_factory, focus_log) = RecordingFactory::new();

    let hover = Tooltips::new(doc.clone(), doc.root(), TooltipsConfig::new().key("tip"), hover_factory)
        .unwrap();
    let focus = Tooltips::new(
        doc.clone(),
        doc.root(),
        TooltipsConfig::new().key("ftip").show_on("focus").hide_on("blur"),
        focus_factory,
    )
    .unwrap();
    assert_ne!(hover.id(), focus.id());

    doc.dispatch(node, "mouseenter");
    doc.dispatch(node, "focus");

    let a = hover.get(node).unwrap().unwrap();
    let b = focus.get(node).unwrap().unwrap();
    assert!(!a.ptr_eq(&b));
    assert_eq!(hover_log.borrow().created[0].content, "Hover");
    assert_eq!(focus_log.borrow().created[0].content, "Focus");

    hover.destroy().unwrap();
    assert_eq!(doc.listener_count(node), 2);
    assert!(focus.is_bound(node).unwrap());
    assert!(b.is_visible());
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_destroy_releases_everything_once() {
    let doc = Document::new();
    let nodes: Vec<NodeId> = (0..3)
        .map(|i| doc.append(doc.root(), Element::item().data("tooltip", format!("t{i}"))).unwrap())
        .collect();
    let unbound = doc.create(Element::item().data("tooltip", "cached"));
    let (factory, log) = RecordingFactory::new();
    let tips = Tooltips::new(
        doc.clone(),
        doc.root(),
        TooltipsConfig::new().observe(true),
        factory,
    )
    .unwrap();

    tips.show(nodes[0]).unwrap();
    tips.show(nodes[2]).unwrap();
    let cached = tips.get(unbound).unwrap().unwrap();

    tips.destroy().unwrap();

    for n in &nodes {
        assert_eq!(doc.listener_count(*n), 0);
    }
    assert_eq!(doc.observer_count(), 0);
    assert!(cached.is_destroyed());

    let log = log.borrow();
    assert_eq!(log.created.len(), 3);
    for index in 0..log.created.len() {
        assert_eq!(log.count_for(index, "destroy"), 1);
    }
}

#[test]
fn test_calls_after_destroy_fail_fast() {
    let (doc, existing) = list_page();
    let (factory, log) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), watching(), factory).unwrap();
    let id = tips.id();
    assert_eq!(doc.listener_count(existing), 2);

    tips.destroy().unwrap();
    assert!(tips.is_destroyed());
    assert_eq!(doc.listener_count(existing), 0);

    let destroyed = TooltipsError::Destroyed { id };
    assert_eq!(tips.show(existing), Err(destroyed.clone()));
    assert_eq!(tips.add(existing), Err(destroyed.clone()));
    assert_eq!(tips.reload(), Err(destroyed.clone()));
    assert_eq!(tips.bound(), Err(destroyed.clone()));
    assert_eq!(tips.destroy(), Err(destroyed));

    // Events and mutations no longer reach the manager
    doc.dispatch(existing, "mouseenter");
    doc.append(doc.root(), Element::item().data("tip", "late")).unwrap();
    assert!(log.borrow().calls.is_empty());
}

#[test]
fn test_adopted_tooltip_survives_binding() {
    let doc = Document::new();
    let node = doc.create(Element::item().data("tooltip", "Early"));
    let (factory, log) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), TooltipsConfig::new(), factory).unwrap();

    let early = tips.get(node).unwrap().unwrap();
    doc.append_child(doc.root(), node).unwrap();
    tips.add(node).unwrap();

    assert!(tips.is_bound(node).unwrap());
    assert!(tips.get(node).unwrap().unwrap().ptr_eq(&early));

    tips.remove(node).unwrap();
    assert!(early.is_destroyed());
    assert_eq!(log.borrow().count("destroy"), 1);
}

#[test]
fn test_remove_releases_tooltip_cached_on_unbound_node() {
    let doc = Document::new();
    let panel = doc.create(
        Element::div()
            .id("panel")
            .child(Element::item().data("tooltip", "Never bound")),
    );
    let inner = doc.children(panel)[0];
    let (factory, log) = RecordingFactory::new();
    let tips = Tooltips::new(doc.clone(), doc.root(), TooltipsConfig::new(), factory).unwrap();

    let cached = tips.get(inner).unwrap().unwrap();
    assert!(!tips.is_bound(inner).unwrap());

    tips.remove(panel).unwrap();

    assert!(cached.is_destroyed());
    assert_eq!(log.borrow().count("destroy"), 1);

    // The next lookup creates a fresh tooltip
    let fresh = tips.get(inner).unwrap().unwrap();
    assert!(!fresh.ptr_eq(&cached));
    assert_eq!(log.borrow().created.len(), 2);

    tips.remove(inner).unwrap();
    assert!(fresh.is_destroyed());
    assert_eq!(log.borrow().count("destroy"), 2);
}

#[test]
fn test_removing_bound_ancestor_keeps_bound_descendant() {
    let doc = Document::new();
    let outer = doc
        .append(
            doc.root(),
            Element::div()
                .data("tooltip", "outer")
                .child(Element::item().id("inner").data("tooltip", "inner")),
        )
        .unwrap();
    let inner = doc.find_by_id("inner").unwrap();
    let (factory, _) = RecordingFactory::new();
    let tips = Tooltips::new(
        doc.clone(),
        doc.root(),
        TooltipsConfig::new().observe(true),
        factory,
    )
    .unwrap();
    assert!(tips.is_bound(inner).unwrap());

    doc.remove(outer).unwrap();

    // A bound node is unbound alone, its subtree is not scanned
    assert!(!tips.is_bound(outer).unwrap());
    assert!(tips.is_bound(inner).unwrap());

    tips.reload().unwrap();
    assert!(!tips.is_bound(inner).unwrap());
    assert_eq!(doc.listener_count(inner), 0);
}
