//! Storefront widgets over a deterministic, in-memory document.
//!
//! Two behaviors are provided: a price aggregator that sums every displayed
//! price into the total-price element, and a dropdown controller that toggles
//! a menu from its trigger and closes it on clicks outside the dropdown.
//! Both run on [`Page`], which parses an HTML fixture and dispatches events
//! the way a browser does, so they can be exercised without one.
//!
//! ```
//! use shop_widgets::Page;
//!
//! let mut page = Page::from_html(
//!     r#"<span class="generic-price">€10</span>
//!        <span class="generic-price">€5.5</span>
//!        <p class="total-price"></p>"#,
//! )?;
//! page.initialize()?;
//! page.assert_text(".total-price", "Total Price: €15.50")?;
//! # Ok::<(), shop_widgets::Error>(())
//! ```

use std::error::Error as StdError;
use std::fmt;

mod config;
mod dom;
mod dropdown;
mod events;
mod html;
mod number;
mod page;
mod price;
mod selector;

pub use config::{Profile, WidgetConfig};
pub use dom::{Dom, NodeId};
pub use dropdown::DropdownController;
pub use events::EventTarget;
pub use number::{parse_js_float, to_fixed};
pub use page::Page;
pub use price::{PriceAggregator, PriceSummary, format_total_label, parse_price_text};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    InvalidArgument(String),
    AlreadyInitialized,
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::AlreadyInitialized => write!(f, "page widgets are already initialized"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
