use super::*;

use std::collections::BTreeMap;

use crate::{
    badge::COUNT_BUBBLE,
    focus::DocumentFocusTrap,
    tests_support::{page_document, DRAWER_SECTION_EMPTY, DRAWER_SECTION_FULL, ICON_SECTION},
};

#[derive(Default)]
struct RecordingTrap {
    engaged: Mutex<Vec<(String, String)>>,
    released: Mutex<Vec<Option<ElementId>>>,
}

impl FocusTrap for RecordingTrap {
    fn engage(&self, container: &str, initial_focus: &str) {
        self.engaged
            .lock()
            .push((container.to_string(), initial_focus.to_string()));
    }

    fn release(&self, restore_to: Option<ElementId>) {
        self.released.lock().push(restore_to);
    }
}

fn drawer() -> (Arc<DrawerController>, Document, Arc<RecordingTrap>) {
    let document = page_document();
    let trap = Arc::new(RecordingTrap::default());
    (DrawerController::create(document.clone(), trap.clone()), document, trap)
}

fn snapshot_with_sections() -> CartSnapshot {
    CartSnapshot {
        item_count: 1,
        sections: BTreeMap::from([
            ("cart-drawer".to_string(), DRAWER_SECTION_FULL.to_string()),
            ("cart-icon-bubble".to_string(), ICON_SECTION.to_string()),
        ]),
        ..CartSnapshot::default()
    }
}

#[test]
fn open_then_transition_end_reaches_open_and_traps_focus() {
    let (drawer, document, trap) = drawer();

    drawer.open(None);
    assert_eq!(drawer.state(), PanelState::Opening);
    assert!(document.has_class(CART_DRAWER, "active"));
    assert!(document.body_has_class("overflow-hidden"));
    assert!(trap.engaged.lock().is_empty());

    drawer.complete_transition();
    assert_eq!(drawer.state(), PanelState::Open);
    assert_eq!(
        trap.engaged.lock().clone(),
        vec![(DRAWER_INNER_EMPTY.to_string(), DRAWER_INNER.to_string())]
    );
}

#[test]
fn focus_trap_targets_content_when_not_empty() {
    let (drawer, document, trap) = drawer();
    document.toggle_class(CART_DRAWER, "is-empty", false);

    drawer.open(None);
    drawer.complete_transition();
    assert_eq!(trap.engaged.lock()[0].0, DRAWER_CONTENT);
}

#[test]
fn reopening_an_open_panel_only_refreshes_the_trap() {
    let (drawer, _document, trap) = drawer();
    drawer.open(None);
    drawer.complete_transition();

    drawer.open(None);
    assert_eq!(drawer.state(), PanelState::Open);
    assert_eq!(trap.engaged.lock().len(), 2);
}

#[test]
fn close_reaches_closed_from_every_state() {
    let (drawer, document, _trap) = drawer();

    drawer.close();
    assert_eq!(drawer.state(), PanelState::Closed);

    drawer.open(None);
    drawer.close();
    assert_eq!(drawer.state(), PanelState::Closed);

    drawer.open(None);
    drawer.complete_transition();
    drawer.close();
    assert_eq!(drawer.state(), PanelState::Closed);
    assert!(!document.has_class(CART_DRAWER, "active"));
    assert!(!document.body_has_class("overflow-hidden"));
}

#[test]
fn late_transition_end_after_close_is_ignored() {
    let (drawer, _document, trap) = drawer();
    drawer.open(None);
    drawer.close();

    drawer.complete_transition();
    assert_eq!(drawer.state(), PanelState::Closed);
    assert!(trap.engaged.lock().is_empty());
}

#[test]
fn close_restores_focus_to_attached_trigger_once() {
    let (drawer, document, trap) = drawer();
    let button = document.element_id("#product-form-submit").expect("button");

    drawer.open(Some(button));
    drawer.complete_transition();
    drawer.close();
    assert_eq!(trap.released.lock().clone(), vec![Some(button)]);
    assert_eq!(drawer.active_element(), None);

    drawer.open(None);
    drawer.close();
    assert_eq!(trap.released.lock().clone(), vec![Some(button), None]);
}

#[test]
fn close_skips_focus_restore_for_detached_trigger() {
    let (drawer, document, trap) = drawer();
    let button = document.element_id("#product-form-submit").expect("button");

    drawer.open(Some(button));
    document.remove("#product-form-submit");
    drawer.close();
    assert_eq!(trap.released.lock().clone(), vec![None]);
}

#[test]
fn escape_and_overlay_close_the_panel() {
    let (drawer, _document, _trap) = drawer();

    assert!(!drawer.handle_key(Key::Escape));
    drawer.open(None);
    assert!(!drawer.handle_key(Key::Enter));
    assert!(drawer.handle_key(Key::Escape));
    assert_eq!(drawer.state(), PanelState::Closed);

    drawer.open(None);
    drawer.complete_transition();
    assert!(drawer.handle_overlay_click());
    assert_eq!(drawer.state(), PanelState::Closed);
}

#[test]
fn header_icon_opens_on_click_or_space() {
    let (drawer, document, _trap) = drawer();
    let icon = document.element_id(HEADER_CART_ICON).expect("icon");

    assert!(!drawer.handle_trigger_activation(TriggerActivation::Key(Key::Enter)));
    assert_eq!(drawer.state(), PanelState::Closed);

    assert!(drawer.handle_trigger_activation(TriggerActivation::Key(Key::Space)));
    assert_eq!(drawer.state(), PanelState::Opening);
    assert_eq!(drawer.active_element(), Some(icon));

    drawer.close();
    assert!(drawer.handle_trigger_activation(TriggerActivation::Click));
    assert_eq!(drawer.state(), PanelState::Opening);
}

#[test]
fn attached_trigger_replaces_header_icon() {
    let (drawer, document, _trap) = drawer();
    let button = document.element_id("#product-form-submit").expect("button");

    drawer.attach_trigger(button);
    assert!(drawer.handle_trigger_activation(TriggerActivation::Click));
    assert_eq!(drawer.active_element(), Some(button));
}

#[test]
fn render_contents_replaces_sections_clears_empty_and_opens() {
    let (drawer, document, _trap) = drawer();

    drawer.render_contents(&snapshot_with_sections());

    let content = document.markup(DRAWER_CONTENT).expect("content");
    assert!(content.contains("Mug x1"), "{content}");
    let icon = document.markup(HEADER_CART_ICON).expect("icon");
    assert!(icon.contains("icon-cart"), "{icon}");
    assert!(!drawer.is_empty());
    assert_eq!(drawer.state(), PanelState::Opening);
    assert!(drawer.handle_overlay_click());
}

#[test]
fn render_contents_keeps_stale_markup_for_missing_sections() {
    let (drawer, document, _trap) = drawer();
    document.set_markup(DRAWER_CONTENT, "previous").expect("mount");

    let snapshot = CartSnapshot {
        item_count: 1,
        sections: BTreeMap::from([("cart-drawer".to_string(), "<div></div>".to_string())]),
        ..CartSnapshot::default()
    };
    drawer.render_contents(&snapshot);

    assert_eq!(document.markup(DRAWER_CONTENT).as_deref(), Some("previous"));
    assert_eq!(drawer.state(), PanelState::Opening);
}

#[test]
fn refresh_toggles_empty_state_from_fragment() {
    let (drawer, document, _trap) = drawer();

    drawer
        .apply_refresh(RefreshTarget::DrawerContent, DRAWER_SECTION_FULL)
        .expect("full");
    assert!(!drawer.is_empty());
    assert!(document.has_class(DRAWER_INNER_EMPTY, "hidden"));

    drawer
        .apply_refresh(RefreshTarget::DrawerContent, DRAWER_SECTION_EMPTY)
        .expect("empty");
    assert!(drawer.is_empty());
    assert!(!document.has_class(DRAWER_INNER_EMPTY, "hidden"));
}

#[test]
fn refresh_without_drawer_markup_is_not_found() {
    let (drawer, document, _trap) = drawer();
    document.set_markup(DRAWER_CONTENT, "previous").expect("mount");

    let err = drawer
        .apply_refresh(RefreshTarget::DrawerContent, "<p>maintenance</p>")
        .expect_err("contract violation");
    assert!(matches!(err, crate::error::CartError::FragmentNotFound { .. }));
    assert_eq!(document.markup(DRAWER_CONTENT).as_deref(), Some("previous"));
}

#[test]
fn refresh_into_removed_content_mount_is_mount_missing() {
    let (drawer, document, _trap) = drawer();
    document.remove(DRAWER_CONTENT);

    let err = drawer
        .apply_refresh(RefreshTarget::DrawerContent, DRAWER_SECTION_FULL)
        .expect_err("no mount");
    assert!(matches!(err, crate::error::CartError::MountMissing { .. }));
    assert!(drawer.is_empty());
}

#[test]
fn rewritten_icon_carries_its_own_count_bubble() {
    let (drawer, document, _trap) = drawer();
    document.insert(COUNT_BUBBLE, "<span aria-hidden=\"true\">1</span>");

    let icon_with_bubble = r#"<div class="shopify-section"><a id="cart-icon-bubble"><div class="cart-count-bubble"><span aria-hidden="true">3</span></div></a></div>"#;
    drawer
        .apply_refresh(RefreshTarget::IconBadge, icon_with_bubble)
        .expect("icon");
    let bubble = document.markup(COUNT_BUBBLE).expect("bubble");
    assert!(bubble.contains(">3<"), "{bubble}");

    let snapshot = CartSnapshot {
        sections: BTreeMap::from([("cart-icon-bubble".to_string(), ICON_SECTION.to_string())]),
        ..CartSnapshot::default()
    };
    drawer.render_contents(&snapshot);
    assert!(!document.contains(COUNT_BUBBLE));
}

#[test]
fn destroy_closes_and_unbinds() {
    let (drawer, _document, _trap) = drawer();
    drawer.open(None);

    drawer.destroy();
    assert_eq!(drawer.state(), PanelState::Closed);
    assert!(!drawer.handle_overlay_click());
    assert!(!drawer.handle_trigger_activation(TriggerActivation::Click));
}

#[test]
fn document_focus_trap_moves_and_restores_focus() {
    let document = page_document();
    let button = document.element_id("#product-form-submit").expect("button");
    let drawer = DrawerController::create(
        document.clone(),
        Arc::new(DocumentFocusTrap::new(document.clone())),
    );

    drawer.open(Some(button));
    drawer.complete_transition();
    assert_eq!(document.focused(), document.element_id(DRAWER_INNER));

    drawer.close();
    assert_eq!(document.focused(), Some(button));
}
