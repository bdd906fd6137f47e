use crate::config::WidgetConfig;
use crate::dom::Dom;
use crate::number::{format_fixed, js_trim, parse_js_float};
use crate::Result;

/// Outcome of one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub total: f64,
    /// Price elements that parsed to a number.
    pub counted: usize,
    /// Price elements whose text was not a number.
    pub skipped: usize,
    /// Text written to the total display, if one was found.
    pub label: Option<String>,
}

/// Reads a displayed price: trim, drop the first currency symbol, then
/// `parseFloat`. Returns `None` when nothing numeric is left.
pub fn parse_price_text(text: &str, currency_symbol: &str) -> Option<f64> {
    let stripped = js_trim(text).replacen(currency_symbol, "", 1);
    let value = parse_js_float(&stripped);
    (!value.is_nan()).then_some(value)
}

/// `"<label><symbol><total to two decimals>"`, e.g. `Total Price: €15.50`.
pub fn format_total_label(total: f64, label: &str, currency_symbol: &str) -> String {
    format!("{label}{currency_symbol}{}", format_fixed(total, 2))
}

#[derive(Debug, Clone)]
pub struct PriceAggregator {
    price_selector: String,
    total_selector: String,
    currency_symbol: String,
    total_label: String,
}

impl Default for PriceAggregator {
    fn default() -> Self {
        Self::new(&WidgetConfig::default())
    }
}

impl PriceAggregator {
    pub fn new(config: &WidgetConfig) -> Self {
        Self {
            price_selector: config.price_selector.clone(),
            total_selector: config.total_selector.clone(),
            currency_symbol: config.currency_symbol.clone(),
            total_label: config.total_label.clone(),
        }
    }

    /// Sums every price element in document order without touching the DOM.
    pub fn calculate(&self, dom: &Dom) -> Result<PriceSummary> {
        let mut summary = PriceSummary {
            total: 0.0,
            counted: 0,
            skipped: 0,
            label: None,
        };
        for node in dom.query_selector_all(&self.price_selector)? {
            match parse_price_text(&dom.text_content(node), &self.currency_symbol) {
                Some(price) => {
                    summary.total += price;
                    summary.counted += 1;
                }
                None => summary.skipped += 1,
            }
        }
        Ok(summary)
    }

    /// Calculates the total and writes it into the first total display.
    /// Without a display the DOM is left untouched.
    pub fn render(&self, dom: &mut Dom) -> Result<PriceSummary> {
        let mut summary = self.calculate(dom)?;
        let Some(display) = dom.query_selector(&self.total_selector)? else {
            return Ok(summary);
        };
        let label = format_total_label(summary.total, &self.total_label, &self.currency_symbol);
        dom.set_text_content(display, &label)?;
        summary.label = Some(label);
        Ok(summary)
    }
}
