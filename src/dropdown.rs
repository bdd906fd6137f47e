use crate::config::WidgetConfig;
use crate::dom::{Dom, NodeId};
use crate::events::{EventTarget, Handler, Listener, ListenerStore};
use crate::selector::parse_selector_groups;
use crate::Result;

const DISPLAY_OPEN: &str = "block";
const DISPLAY_CLOSED: &str = "none";

/// Shows and hides the dropdown menu.
///
/// The open state lives here; the menu's inline `display` is only ever
/// written from it. A missing menu turns every operation into a no-op.
#[derive(Debug, Clone)]
pub struct DropdownController {
    menu_id: String,
    root_selector: String,
    trigger_selector: String,
    trigger: Option<NodeId>,
    is_open: bool,
    attached: bool,
}

impl Default for DropdownController {
    fn default() -> Self {
        Self::new(&WidgetConfig::default())
    }
}

impl DropdownController {
    pub fn new(config: &WidgetConfig) -> Self {
        Self {
            menu_id: config.menu_id.clone(),
            root_selector: config.dropdown_root_selector.clone(),
            trigger_selector: config.trigger_selector.clone(),
            trigger: None,
            is_open: false,
            attached: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn menu(&self, dom: &Dom) -> Option<NodeId> {
        dom.by_id(&self.menu_id)
    }

    /// Reads the initial state and registers the click listeners: the toggle
    /// on the trigger (only if there is one), then the outside-click close on
    /// the window.
    pub(crate) fn attach(&mut self, dom: &Dom, listeners: &mut ListenerStore) -> Result<()> {
        parse_selector_groups(&self.root_selector)?;

        self.is_open = match self.menu(dom) {
            Some(menu) => dom.style_get(menu, "display")? == DISPLAY_OPEN,
            None => false,
        };
        self.trigger = dom.query_selector(&self.trigger_selector)?;

        if let Some(trigger) = self.trigger {
            listeners.add(
                EventTarget::Node(trigger),
                "click",
                Listener {
                    capture: false,
                    handler: Handler::DropdownToggle,
                },
            );
        }
        listeners.add(
            EventTarget::Window,
            "click",
            Listener {
                capture: false,
                handler: Handler::DropdownCloseOutside,
            },
        );
        self.attached = true;
        Ok(())
    }

    /// Flips the open state. Returns `false` when there is no menu to show.
    pub fn toggle(&mut self, dom: &mut Dom) -> Result<bool> {
        let Some(menu) = self.menu(dom) else {
            return Ok(false);
        };
        self.is_open = !self.is_open;
        self.render(dom, menu)?;
        Ok(true)
    }

    /// Closes the menu unless `target` sits inside a dropdown root. Returns
    /// whether the close path ran.
    pub fn close_if_outside(&mut self, dom: &mut Dom, target: NodeId) -> Result<bool> {
        if dom.closest(target, &self.root_selector)?.is_some() {
            return Ok(false);
        }
        let Some(menu) = self.menu(dom) else {
            return Ok(false);
        };
        self.is_open = false;
        self.render(dom, menu)?;
        Ok(true)
    }

    fn render(&self, dom: &mut Dom, menu: NodeId) -> Result<()> {
        let display = if self.is_open {
            DISPLAY_OPEN
        } else {
            DISPLAY_CLOSED
        };
        dom.style_set(menu, "display", display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::Error;

    const MARKUP: &str = r#"
        <nav>
          <div class="dropdown">
            <div id="profile">Account</div>
            <ul id="dropdownMenu"><li id="item">Orders</li></ul>
          </div>
          <a id="home" href="/">Home</a>
        </nav>
    "#;

    fn node(dom: &Dom, id: &str) -> Result<NodeId> {
        dom.by_id(id)
            .ok_or_else(|| Error::SelectorNotFound(format!("#{id}")))
    }

    #[test]
    fn attach_registers_trigger_then_window_listener() -> Result<()> {
        let dom = parse_html(MARKUP)?;
        let mut listeners = ListenerStore::default();
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut listeners)?;

        let profile = node(&dom, "profile")?;
        assert_eq!(controller.trigger(), Some(profile));
        assert_eq!(listeners.count(EventTarget::Node(profile), "click"), 1);
        assert_eq!(listeners.count(EventTarget::Window, "click"), 1);
        assert!(!controller.is_open());
        Ok(())
    }

    #[test]
    fn toggle_alternates_block_and_none() -> Result<()> {
        let mut dom = parse_html(MARKUP)?;
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut ListenerStore::default())?;
        let menu = node(&dom, "dropdownMenu")?;

        assert!(controller.toggle(&mut dom)?);
        assert_eq!(dom.style_get(menu, "display")?, "block");
        assert!(controller.toggle(&mut dom)?);
        assert_eq!(dom.style_get(menu, "display")?, "none");
        assert!(!controller.is_open());
        Ok(())
    }

    #[test]
    fn initial_state_comes_from_inline_display() -> Result<()> {
        let mut dom = parse_html(
            "<div class='dropdown'><div id='t'></div><ul id='dropdownMenu' style='display: block'></ul></div>",
        )?;
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut ListenerStore::default())?;
        assert!(controller.is_open());
        controller.toggle(&mut dom)?;
        let menu = node(&dom, "dropdownMenu")?;
        assert_eq!(dom.style_get(menu, "display")?, "none");
        Ok(())
    }

    #[test]
    fn unknown_display_values_count_as_closed() -> Result<()> {
        let mut dom = parse_html(
            "<div class='dropdown'><div id='t'></div><ul id='dropdownMenu' style='display: flex'></ul></div>",
        )?;
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut ListenerStore::default())?;
        assert!(!controller.is_open());
        controller.toggle(&mut dom)?;
        let menu = node(&dom, "dropdownMenu")?;
        assert_eq!(dom.style_get(menu, "display")?, "block");
        Ok(())
    }

    #[test]
    fn outside_targets_close_inside_targets_do_not() -> Result<()> {
        let mut dom = parse_html(MARKUP)?;
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut ListenerStore::default())?;
        controller.toggle(&mut dom)?;

        let item = node(&dom, "item")?;
        let profile = node(&dom, "profile")?;
        assert!(!controller.close_if_outside(&mut dom, item)?);
        assert!(!controller.close_if_outside(&mut dom, profile)?);
        assert!(controller.is_open());

        let home = node(&dom, "home")?;
        assert!(controller.close_if_outside(&mut dom, home)?);
        assert!(!controller.is_open());
        let menu = node(&dom, "dropdownMenu")?;
        assert_eq!(dom.style_get(menu, "display")?, "none");
        Ok(())
    }

    #[test]
    fn closing_an_unstyled_closed_menu_writes_none() -> Result<()> {
        let mut dom = parse_html(MARKUP)?;
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut ListenerStore::default())?;
        let home = node(&dom, "home")?;
        assert!(controller.close_if_outside(&mut dom, home)?);
        let menu = node(&dom, "dropdownMenu")?;
        assert_eq!(dom.attr(menu, "style").as_deref(), Some("display: none;"));
        Ok(())
    }

    #[test]
    fn missing_menu_is_a_no_op() -> Result<()> {
        let mut dom = parse_html("<div class='dropdown'><div id='t'>x</div></div><p id='out'></p>")?;
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut ListenerStore::default())?;
        let before = dom.dump_node(dom.root());
        assert!(!controller.toggle(&mut dom)?);
        let out = node(&dom, "out")?;
        assert!(!controller.close_if_outside(&mut dom, out)?);
        assert_eq!(dom.dump_node(dom.root()), before);
        assert!(!controller.is_open());
        Ok(())
    }

    #[test]
    fn missing_trigger_only_registers_window_listener() -> Result<()> {
        let dom = parse_html("<div class='dropdown'></div><ul id='dropdownMenu'></ul>")?;
        let mut listeners = ListenerStore::default();
        let mut controller = DropdownController::default();
        controller.attach(&dom, &mut listeners)?;
        assert_eq!(controller.trigger(), None);
        assert_eq!(listeners.count(EventTarget::Window, "click"), 1);
        Ok(())
    }

    #[test]
    fn invalid_root_selector_fails_attach() {
        let config = WidgetConfig {
            dropdown_root_selector: ".dropdown >".into(),
            ..WidgetConfig::default()
        };
        let mut controller = DropdownController::new(&config);
        let dom = Dom::new();
        assert!(matches!(
            controller.attach(&dom, &mut ListenerStore::default()),
            Err(Error::UnsupportedSelector(_))
        ));
        assert!(!controller.is_attached());
    }
}
