use crate::config::WidgetConfig;
use crate::dom::{Dom, NodeId};
use crate::dropdown::DropdownController;
use crate::events::{EventPhase, EventState, EventTarget, Handler, ListenerStore};
use crate::price::{PriceAggregator, PriceSummary};
use crate::{Error, Result};

const SNIPPET_MAX_CHARS: usize = 200;

/// A parsed page hosting the storefront widgets.
///
/// Nothing runs until [`Page::initialize`], which plays the role of the
/// document's "content loaded" moment. User actions then dispatch events
/// through capture, target and bubble phases, ending at the window.
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    prices: PriceAggregator,
    dropdown: DropdownController,
    price_summary: Option<PriceSummary>,
    initialized: bool,
    trace: bool,
    trace_events: bool,
    trace_widgets: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, WidgetConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: WidgetConfig) -> Result<Self> {
        config.validate()?;
        let dom = Dom::from_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            prices: PriceAggregator::new(&config),
            dropdown: DropdownController::new(&config),
            price_summary: None,
            initialized: false,
            trace: config.trace,
            trace_events: true,
            trace_widgets: true,
            trace_logs: Vec::new(),
            trace_log_limit: config.trace_log_limit,
            trace_to_stderr: config.trace_to_stderr,
        })
    }

    /// Runs the price aggregator and attaches the dropdown controller.
    /// May only succeed once per page.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }

        let summary = self.prices.render(&mut self.dom)?;
        match &summary.label {
            Some(label) => self.trace_widget_line(format!(
                "[widget] price total written label={label:?} counted={} skipped={}",
                summary.counted, summary.skipped
            )),
            None => self.trace_widget_line(format!(
                "[widget] price total display missing total={} counted={} skipped={}",
                summary.total, summary.counted, summary.skipped
            )),
        }
        self.price_summary = Some(summary);

        self.dropdown.attach(&self.dom, &mut self.listeners)?;
        let trigger_label = self
            .dropdown
            .trigger()
            .map(|node| self.trace_node_label(node))
            .unwrap_or_else(|| "none".into());
        let menu_label = self
            .dropdown
            .menu(&self.dom)
            .map(|node| self.trace_node_label(node))
            .unwrap_or_else(|| "none".into());
        self.trace_widget_line(format!(
            "[widget] dropdown attached trigger={trigger_label} menu={menu_label} open={}",
            self.dropdown.is_open()
        ));

        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Result of the aggregation run by [`Page::initialize`].
    pub fn price_summary(&self) -> Option<&PriceSummary> {
        self.price_summary.as_ref()
    }

    pub fn dropdown(&self) -> &DropdownController {
        &self.dropdown
    }

    pub fn dropdown_is_open(&self) -> bool {
        self.dropdown.is_open()
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_widgets(&mut self, enabled: bool) {
        self.trace_widgets = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidArgument(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        if self.trace_logs.len() > max_entries {
            let excess = self.trace_logs.len() - max_entries;
            self.trace_logs.drain(..excess);
        }
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, "click")
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn style(&self, selector: &str, property: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.style_get(target, property)
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_get(target, property)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: format!("{selector} style.{property}"),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        let node = self
            .dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))?;
        if !self.dom.is_element(node) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "element".into(),
                actual: "non-element".into(),
            });
        }
        Ok(node)
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), SNIPPET_MAX_CHARS)
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<()> {
        let mut event = EventState::new(event_type, target);

        // Document root first, target last.
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();
        let ancestors = &path[..path.len() - 1];

        let mut invoked = 0usize;

        event.phase = EventPhase::Capturing;
        invoked += self.invoke_listeners(EventTarget::Window, &mut event, true)?;
        for node in ancestors {
            invoked += self.invoke_listeners(EventTarget::Node(*node), &mut event, true)?;
        }

        event.phase = EventPhase::AtTarget;
        invoked += self.invoke_listeners(EventTarget::Node(target), &mut event, true)?;
        invoked += self.invoke_listeners(EventTarget::Node(target), &mut event, false)?;

        event.phase = EventPhase::Bubbling;
        for node in ancestors.iter().rev() {
            invoked += self.invoke_listeners(EventTarget::Node(*node), &mut event, false)?;
        }
        invoked += self.invoke_listeners(EventTarget::Window, &mut event, false)?;

        let target_label = self.trace_node_label(target);
        self.trace_event_line(format!(
            "[event] done {} target={} listeners={}",
            event.event_type, target_label, invoked
        ));
        Ok(())
    }

    fn invoke_listeners(
        &mut self,
        current: EventTarget,
        event: &mut EventState,
        capture: bool,
    ) -> Result<usize> {
        let listeners = self.listeners.get(current, &event.event_type, capture);
        event.current_target = current;
        for listener in &listeners {
            if self.trace && self.trace_events {
                let target_label = self.trace_node_label(event.target);
                let current_label = self.trace_target_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} handler={}",
                    event.event_type,
                    target_label,
                    current_label,
                    event.phase.label(),
                    listener.handler.label()
                ));
            }
            self.run_handler(listener.handler, event)?;
        }
        Ok(listeners.len())
    }

    fn run_handler(&mut self, handler: Handler, event: &EventState) -> Result<()> {
        match handler {
            Handler::DropdownToggle => {
                if self.dropdown.toggle(&mut self.dom)? {
                    self.trace_widget_line(format!(
                        "[widget] dropdown toggled open={}",
                        self.dropdown.is_open()
                    ));
                }
            }
            Handler::DropdownCloseOutside => {
                if self.dropdown.close_if_outside(&mut self.dom, event.target)? {
                    let target_label = self.trace_node_label(event.target);
                    self.trace_widget_line(format!(
                        "[widget] dropdown closed by outside click target={target_label}"
                    ));
                }
            }
        }
        Ok(())
    }

    fn trace_target_label(&self, target: EventTarget) -> String {
        match target {
            EventTarget::Window => "window".into(),
            EventTarget::Node(node) => self.trace_node_label(node),
        }
    }

    fn trace_node_label(&self, node: NodeId) -> String {
        if node == self.dom.root() {
            return "document".into();
        }
        if let Some(id) = self.dom.attr(node, "id") {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        self.dom
            .tag_name(node)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("node-{}", node.0))
    }

    fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.trace_line(line);
        }
    }

    fn trace_widget_line(&mut self, line: String) {
        if self.trace && self.trace_widgets {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        if self.trace_logs.len() >= self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        self.trace_logs.push(line);
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut it = value.chars();
    let mut out: String = it.by_ref().take(max_chars).collect();
    if it.next().is_some() {
        out.push_str("...");
    }
    out
}
