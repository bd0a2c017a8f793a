//! Cart drawer: panel visibility state machine, content rendering and focus
//! management.

use std::sync::Arc;

use parking_lot::Mutex;
use shared::{domain::sections, protocol::CartSnapshot};
use tracing::{debug, info, warn};

use crate::{
    badge::COUNT_BUBBLE,
    dom::{Document, ElementId},
    error::{CartError, Result},
    focus::FocusTrap,
    fragment::{self, FragmentRenderer, EMPTY_CLASS},
    scheduler::{RefreshSink, RefreshTarget},
};

pub const CART_DRAWER: &str = "cart-drawer";
pub const DRAWER_CONTENT: &str = "#CartDrawer";
pub const DRAWER_OVERLAY: &str = "#CartDrawer-Overlay";
pub const DRAWER_INNER: &str = ".drawer__inner";
pub const DRAWER_INNER_EMPTY: &str = ".drawer__inner-empty";
pub const DRAWER_CLOSE: &str = ".drawer__close";
pub const HEADER_CART_ICON: &str = "#cart-icon-bubble";

const ACTIVE_CLASS: &str = "active";
const ANIMATE_CLASS: &str = "animate";
const HIDDEN_CLASS: &str = "hidden";
const SCROLL_LOCK_CLASS: &str = "overflow-hidden";

/// Sections replaced by [`DrawerController::render_contents`], in order:
/// (section id, selector inside the section, mount on the page).
const RENDER_TARGETS: [(&str, &str, &str); 2] = [
    (sections::CART_DRAWER, DRAWER_CONTENT, DRAWER_CONTENT),
    (sections::CART_ICON_BUBBLE, ".shopify-section", HEADER_CART_ICON),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Space,
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerActivation {
    Click,
    Key(Key),
}

/// Anything that owns the rendered cart view and can take a fresh snapshot.
pub trait CartView: Send + Sync {
    /// Section ids the mutation endpoint should render for this view.
    fn section_ids(&self) -> Vec<&'static str>;
    fn set_active_element(&self, element: Option<ElementId>);
    fn render_contents(&self, snapshot: &CartSnapshot);
}

#[derive(Debug)]
struct DrawerState {
    panel: PanelState,
    /// Focused element before the panel opened. Cleared on every close.
    active_element: Option<ElementId>,
    overlay_bound: bool,
    trigger: Option<ElementId>,
}

pub struct DrawerController {
    document: Document,
    renderer: FragmentRenderer,
    focus_trap: Arc<dyn FocusTrap>,
    state: Mutex<DrawerState>,
}

impl DrawerController {
    /// Binds the overlay and the header icon trigger found on the page.
    pub fn create(document: Document, focus_trap: Arc<dyn FocusTrap>) -> Arc<Self> {
        let drawer = Arc::new(Self {
            renderer: FragmentRenderer::new(document.clone()),
            focus_trap,
            state: Mutex::new(DrawerState {
                panel: PanelState::Closed,
                active_element: None,
                overlay_bound: document.contains(DRAWER_OVERLAY),
                trigger: document.element_id(HEADER_CART_ICON),
            }),
            document,
        });
        debug!(
            overlay_bound = drawer.state.lock().overlay_bound,
            "cart drawer created"
        );
        drawer
    }

    /// Closes the panel and drops every binding.
    pub fn destroy(&self) {
        self.close();
        let mut state = self.state.lock();
        state.overlay_bound = false;
        state.trigger = None;
        debug!("cart drawer destroyed");
    }

    pub fn state(&self) -> PanelState {
        self.state.lock().panel
    }

    pub fn is_empty(&self) -> bool {
        self.document.has_class(CART_DRAWER, EMPTY_CLASS)
    }

    pub fn active_element(&self) -> Option<ElementId> {
        self.state.lock().active_element
    }

    pub fn open(&self, trigger: Option<ElementId>) {
        let mut state = self.state.lock();
        if let Some(trigger) = trigger {
            state.active_element = Some(trigger);
        }
        match state.panel {
            PanelState::Closed | PanelState::Closing => {
                self.document.toggle_class(CART_DRAWER, ANIMATE_CLASS, true);
                self.document.toggle_class(CART_DRAWER, ACTIVE_CLASS, true);
                self.document.toggle_body_class(SCROLL_LOCK_CLASS, true);
                transition(&mut state, PanelState::Opening);
            }
            PanelState::Open => self.engage_focus_trap(),
            PanelState::Opening => {}
        }
    }

    /// One-shot transition-end signal for the current opening.
    pub fn complete_transition(&self) {
        let mut state = self.state.lock();
        if state.panel != PanelState::Opening {
            debug!(state = ?state.panel, "ignoring transition end outside of opening");
            return;
        }
        transition(&mut state, PanelState::Open);
        drop(state);
        self.engage_focus_trap();
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        if !matches!(state.panel, PanelState::Open | PanelState::Opening) {
            return;
        }
        transition(&mut state, PanelState::Closing);
        self.document.toggle_class(CART_DRAWER, ACTIVE_CLASS, false);
        let restore_to = state
            .active_element
            .take()
            .filter(|element| self.document.is_attached(*element));
        self.focus_trap.release(restore_to);
        self.document.toggle_body_class(SCROLL_LOCK_CLASS, false);
        transition(&mut state, PanelState::Closed);
    }

    /// Returns whether the key was consumed.
    pub fn handle_key(&self, key: Key) -> bool {
        if key == Key::Escape && matches!(self.state(), PanelState::Open | PanelState::Opening) {
            self.close();
            return true;
        }
        false
    }

    pub fn handle_overlay_click(&self) -> bool {
        if !self.state.lock().overlay_bound {
            debug!("overlay click with no bound handler");
            return false;
        }
        self.close();
        true
    }

    /// Registers `element` as the control that opens the drawer.
    pub fn attach_trigger(&self, element: ElementId) {
        self.state.lock().trigger = Some(element);
    }

    /// Click or Space on the attached trigger opens the drawer.
    pub fn handle_trigger_activation(&self, activation: TriggerActivation) -> bool {
        let Some(trigger) = self.state.lock().trigger else {
            return false;
        };
        match activation {
            TriggerActivation::Click | TriggerActivation::Key(Key::Space) => {
                self.open(Some(trigger));
                true
            }
            TriggerActivation::Key(_) => false,
        }
    }

    /// Optimistically drops the empty state before the refreshed content lands.
    pub fn mark_non_empty(&self) {
        self.document.toggle_class(CART_DRAWER, EMPTY_CLASS, false);
        self.document.toggle_class(DRAWER_INNER_EMPTY, HIDDEN_CLASS, true);
    }

    fn engage_focus_trap(&self) {
        let container = if self.is_empty() {
            DRAWER_INNER_EMPTY
        } else {
            DRAWER_CONTENT
        };
        let initial_focus = if self.document.contains(DRAWER_INNER) {
            DRAWER_INNER
        } else {
            DRAWER_CLOSE
        };
        self.focus_trap.engage(container, initial_focus);
    }

    /// The count bubble lives inside the icon markup; a rewritten icon brings
    /// its own bubble, or none when the cart is empty.
    fn sync_count_bubble(&self, icon: &fragment::Fragment) {
        match fragment::extract(&icon.inner_html, ".cart-count-bubble") {
            Ok(bubble) => {
                if self.document.set_markup(COUNT_BUBBLE, bubble.inner_html.clone()).is_err() {
                    self.document.insert(COUNT_BUBBLE, bubble.inner_html);
                }
            }
            Err(_) => {
                self.document.remove(COUNT_BUBBLE);
            }
        }
    }

    /// Replacing markup drops handlers bound inside it.
    fn rebind_overlay(&self) {
        let bound = self.document.contains(DRAWER_OVERLAY);
        self.state.lock().overlay_bound = bound;
    }
}

fn transition(state: &mut DrawerState, next: PanelState) {
    debug!(from = ?state.panel, to = ?next, "cart drawer transition");
    state.panel = next;
}

impl CartView for DrawerController {
    fn section_ids(&self) -> Vec<&'static str> {
        RENDER_TARGETS.iter().map(|(section, _, _)| *section).collect()
    }

    fn set_active_element(&self, element: Option<ElementId>) {
        self.state.lock().active_element = element;
    }

    fn render_contents(&self, snapshot: &CartSnapshot) {
        for (section_id, selector, mount) in RENDER_TARGETS {
            let Some(markup) = snapshot.section(section_id) else {
                debug!(section_id, "snapshot carries no markup for section");
                continue;
            };
            match self.renderer.render(markup, selector, mount) {
                Ok(fragment) if mount == HEADER_CART_ICON => self.sync_count_bubble(&fragment),
                Ok(_) => {}
                Err(error) => warn!(section_id, %error, "section left as is"),
            }
        }
        self.document.toggle_class(CART_DRAWER, EMPTY_CLASS, false);
        self.rebind_overlay();
        self.open(None);
        info!(item_count = snapshot.item_count, "cart drawer rendered");
    }
}

impl RefreshSink for DrawerController {
    fn apply_refresh(&self, target: RefreshTarget, markup: &str) -> Result<()> {
        match target {
            RefreshTarget::DrawerContent => {
                let root = fragment::extract(markup, CART_DRAWER)?;
                let content = fragment::extract(markup, DRAWER_CONTENT)?;
                if !self.renderer.apply(DRAWER_CONTENT, &content) {
                    return Err(CartError::MountMissing {
                        selector: DRAWER_CONTENT.to_string(),
                    });
                }
                self.document
                    .toggle_class(CART_DRAWER, EMPTY_CLASS, root.is_empty);
                self.document
                    .toggle_class(DRAWER_INNER_EMPTY, HIDDEN_CLASS, !root.is_empty);
                self.rebind_overlay();
            }
            RefreshTarget::IconBadge => {
                let icon = self
                    .renderer
                    .render(markup, ".shopify-section", HEADER_CART_ICON)?;
                self.sync_count_bubble(&icon);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/drawer_tests.rs"]
mod tests;
