use crate::{Error, Result};

const PROFILE_ENV_VAR: &str = "SHOP_WIDGETS_ENV";

/// Deployment profile, picked from `SHOP_WIDGETS_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Development,
    Testing,
    Production,
}

impl Profile {
    /// Reads `SHOP_WIDGETS_ENV`; unset or unknown values mean development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV_VAR)
            .map(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" => Self::Production,
            "testing" => Self::Testing,
            _ => Self::Development,
        }
    }
}

/// Markers and trace defaults for the page widgets.
///
/// The defaults match the storefront templates: `.generic-price` items, a
/// `.total-price` display and a `#dropdownMenu` inside `.dropdown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub price_selector: String,
    pub total_selector: String,
    pub currency_symbol: String,
    pub total_label: String,
    pub menu_id: String,
    pub dropdown_root_selector: String,
    pub trigger_selector: String,
    pub trace: bool,
    pub trace_to_stderr: bool,
    pub trace_log_limit: usize,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            price_selector: ".generic-price".into(),
            total_selector: ".total-price".into(),
            currency_symbol: "€".into(),
            total_label: "Total Price: ".into(),
            menu_id: "dropdownMenu".into(),
            dropdown_root_selector: ".dropdown".into(),
            trigger_selector: ".dropdown > div".into(),
            trace: false,
            trace_to_stderr: true,
            trace_log_limit: 10_000,
        }
    }
}

impl WidgetConfig {
    pub fn for_profile(profile: Profile) -> Self {
        let (trace, trace_to_stderr) = match profile {
            Profile::Development => (true, true),
            Profile::Testing => (true, false),
            Profile::Production => (false, false),
        };
        Self {
            trace,
            trace_to_stderr,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::for_profile(Profile::from_env())
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("price_selector", &self.price_selector),
            ("total_selector", &self.total_selector),
            ("currency_symbol", &self.currency_symbol),
            ("menu_id", &self.menu_id),
            ("dropdown_root_selector", &self.dropdown_root_selector),
            ("trigger_selector", &self.trigger_selector),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidArgument(format!("{name} must not be empty")));
            }
        }
        if self.trace_log_limit == 0 {
            return Err(Error::InvalidArgument(
                "trace_log_limit requires at least 1 entry".into(),
            ));
        }
        Ok(())
    }
}
