use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::FormResult;
use super::registry::ElementKind;

pub const DEFAULT_MESSAGE: &str = "This value is not valid";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveMode {
    /// Validate a field on each of its triggers.
    #[default]
    Enabled,
    /// Only validate when the form is submitted.
    Disabled,
    /// Behave as `Disabled` until the first submit request, then as `Enabled`.
    Submitted,
}

impl LiveMode {
    pub fn validates_on_trigger(self) -> bool {
        self == LiveMode::Enabled
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Input,
    Change,
    Blur,
}

impl Trigger {
    pub fn default_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Radio | ElementKind::Checkbox | ElementKind::Select | ElementKind::File => {
                Trigger::Change
            }
            _ => Trigger::Input,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub live: LiveMode,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub trigger: Option<Vec<Trigger>>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            live: LiveMode::default(),
            message: default_message(),
            trigger: None,
            fields: Vec::new(),
        }
    }
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(source: &str) -> FormResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn live(mut self, live: LiveMode) -> Self {
        self.live = live;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn trigger(mut self, triggers: impl IntoIterator<Item = Trigger>) -> Self {
        self.trigger = Some(triggers.into_iter().collect());
        self
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub trigger: Option<Vec<Trigger>>,
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: None,
            enabled: true,
            message: None,
            trigger: None,
            validators: Vec::new(),
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn trigger(mut self, triggers: impl IntoIterator<Item = Trigger>) -> Self {
        self.trigger = Some(triggers.into_iter().collect());
        self
    }

    pub fn validator(mut self, validator: ValidatorSpec) -> Self {
        self.validators.push(validator);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatorSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ValidatorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: None,
            options: Map::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_owned()
}

fn default_enabled() -> bool {
    true
}
