//! Condition configuration
//!
//! Raw settings are loaded from TOML (or the built-in defaults), layered with
//! a named condition's overrides, and validated once into an immutable
//! [`Condition`]. Generators only ever see the validated form.

use crate::error::{Error, Result};
use crate::types::{Attribute, AttributeValue, Card, Color, Number, Shape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONDITION_NAME: &str = "NA(accidental)";
pub const DEFAULT_CRITERION: i64 = 5;
pub const DEFAULT_RULE_ONLY_COUNT: usize = 3;

/// Incidental value as written in a config file: a name for color/shape,
/// an integer for number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Text(String),
}

impl From<AttributeValue> for RawValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Color(c) => RawValue::Text(c.to_string()),
            AttributeValue::Shape(s) => RawValue::Text(s.to_string()),
            AttributeValue::Number(n) => RawValue::Integer(n.value() as i64),
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl RawValue {
    /// Interpret this value on `attribute`'s axis.
    pub fn resolve(&self, attribute: Attribute) -> Result<AttributeValue> {
        let found = attribute
            .domain()
            .into_iter()
            .find(|candidate| RawValue::from(*candidate) == *self);
        found.ok_or_else(|| {
            let allowed: Vec<String> = attribute
                .domain()
                .into_iter()
                .map(|v| RawValue::from(v).to_string())
                .collect();
            Error::invalid_config(format!(
                "incidental_value {self} is not a {attribute} value (expected one of {})",
                allowed.join(", ")
            ))
        })
    }
}

/// How the incidental card is animated on accidental demo trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationCue {
    /// Instant teleport toward slot 0.
    #[default]
    Accidental,
    /// In-place 180 degree rotation with a glow highlight.
    Pedagogical,
}

/// Participant-facing instruction texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionTexts {
    pub demo_label: String,
    pub transfer_label: String,
    pub intro: String,
    pub sort_transition: String,
    pub transfer_transition: String,
}

impl Default for InstructionTexts {
    fn default() -> Self {
        Self {
            demo_label: "Watch carefully and learn the rule.".into(),
            transfer_label: "Drag the correct card to the leftmost position.".into(),
            intro: "This is a card sorting game. The goal is to correctly sort the bottom card \
                with one of three possible options. Before you begin the game, you will watch \
                a demonstration."
                .into(),
            sort_transition: "Now its your turn! Click the correct card match for the card \
                at the bottom."
                .into(),
            transfer_transition: "New Task! Now, you will see three cards. Your task is to \
                move the correct card into the leftmost position. Once you have arranged the \
                cards, click the \"Submit Order\" button."
                .into(),
        }
    }
}

/// Unvalidated condition parameters, as read from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionSettings {
    pub condition_name: String,
    pub sorting_rule: Attribute,
    pub incidental_attribute: Attribute,
    pub incidental_value: RawValue,
    /// Skip the intro and the demonstration entirely.
    pub skip_demo: bool,
    /// Ordered demo stimuli; one demo trial per entry.
    pub demo_stimuli: Vec<Card>,
    /// The first N demo trials are rule-only.
    pub demo_rule_only_count: usize,
    pub incidental_animation_cue: AnimationCue,
    /// Consecutive correct responses that end the card-sort phase.
    pub card_sort_criterion: i64,
    /// Consecutive correct responses that end the transfer phase.
    pub transfer_criterion: i64,
    pub texts: InstructionTexts,
}

/// The scripted demonstration stimuli, chosen so every color, shape and
/// number appears and the incidental card lands on varied match types.
pub fn default_demo_stimuli() -> Vec<Card> {
    use Color::*;
    use Number::*;
    use Shape::*;
    vec![
        Card::new(Red, Star, Three),
        Card::new(Blue, Circle, One),
        Card::new(Green, Triangle, Two),
        Card::new(Blue, Star, Three),
        Card::new(Red, Circle, Two),
        Card::new(Green, Star, One),
        Card::new(Blue, Triangle, Two),
        Card::new(Red, Triangle, One),
    ]
}

impl Default for ConditionSettings {
    fn default() -> Self {
        Self {
            condition_name: DEFAULT_CONDITION_NAME.into(),
            sorting_rule: Attribute::Number,
            incidental_attribute: Attribute::Color,
            incidental_value: RawValue::Text("Red".into()),
            skip_demo: false,
            demo_stimuli: default_demo_stimuli(),
            demo_rule_only_count: DEFAULT_RULE_ONLY_COUNT,
            incidental_animation_cue: AnimationCue::Accidental,
            card_sort_criterion: DEFAULT_CRITERION,
            transfer_criterion: DEFAULT_CRITERION,
            texts: InstructionTexts::default(),
        }
    }
}

impl ConditionSettings {
    /// Check every parameter and freeze the result.
    pub fn validate(&self) -> Result<Condition> {
        let incidental = self.incidental_value.resolve(self.incidental_attribute)?;
        let card_sort_criterion = validate_criterion("card_sort_criterion", self.card_sort_criterion)?;
        let transfer_criterion = validate_criterion("transfer_criterion", self.transfer_criterion)?;

        if !self.skip_demo && self.demo_stimuli.is_empty() {
            return Err(Error::invalid_config(
                "demo_stimuli is empty but skip_demo is false",
            ));
        }
        if self.demo_rule_only_count > self.demo_stimuli.len() {
            return Err(Error::invalid_config(format!(
                "demo_rule_only_count {} exceeds the {} demo stimuli",
                self.demo_rule_only_count,
                self.demo_stimuli.len()
            )));
        }

        Ok(Condition {
            name: self.condition_name.clone(),
            sorting_rule: self.sorting_rule,
            incidental,
            skip_demo: self.skip_demo,
            demo_stimuli: self.demo_stimuli.clone(),
            demo_rule_only_count: self.demo_rule_only_count,
            animation_cue: self.incidental_animation_cue,
            card_sort_criterion,
            transfer_criterion,
            texts: self.texts.clone(),
        })
    }
}

fn validate_criterion(field: &str, value: i64) -> Result<u32> {
    if value <= 0 {
        return Err(Error::invalid_config(format!(
            "{field} must be at least 1, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| Error::invalid_config(format!("{field} is too large: {value}")))
}

/// A registry entry: any subset of [`ConditionSettings`] fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting_rule: Option<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incidental_attribute: Option<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incidental_value: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_demo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_stimuli: Option<Vec<Card>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_rule_only_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incidental_animation_cue: Option<AnimationCue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_sort_criterion: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_criterion: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texts: Option<InstructionTexts>,
}

impl ConditionOverrides {
    /// Layer these overrides on top of `base`.
    pub fn apply(&self, base: &ConditionSettings) -> ConditionSettings {
        let mut merged = base.clone();
        if let Some(v) = &self.condition_name {
            merged.condition_name = v.clone();
        }
        if let Some(v) = self.sorting_rule {
            merged.sorting_rule = v;
        }
        if let Some(v) = self.incidental_attribute {
            merged.incidental_attribute = v;
        }
        if let Some(v) = &self.incidental_value {
            merged.incidental_value = v.clone();
        }
        if let Some(v) = self.skip_demo {
            merged.skip_demo = v;
        }
        if let Some(v) = &self.demo_stimuli {
            merged.demo_stimuli = v.clone();
        }
        if let Some(v) = self.demo_rule_only_count {
            merged.demo_rule_only_count = v;
        }
        if let Some(v) = self.incidental_animation_cue {
            merged.incidental_animation_cue = v;
        }
        if let Some(v) = self.card_sort_criterion {
            merged.card_sort_criterion = v;
        }
        if let Some(v) = self.transfer_criterion {
            merged.transfer_criterion = v;
        }
        if let Some(v) = &self.texts {
            merged.texts = v.clone();
        }
        merged
    }
}

/// Defaults plus the named condition registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub defaults: ConditionSettings,
    pub conditions: BTreeMap<String, ConditionOverrides>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            defaults: ConditionSettings::default(),
            conditions: builtin_conditions(),
        }
    }
}

fn builtin_conditions() -> BTreeMap<String, ConditionOverrides> {
    let shape_rule = |name: &str, skip_demo: Option<bool>, cue: Option<AnimationCue>| {
        ConditionOverrides {
            condition_name: Some(name.into()),
            sorting_rule: Some(Attribute::Color),
            incidental_attribute: Some(Attribute::Shape),
            incidental_value: Some(RawValue::Text("Circle".into())),
            skip_demo,
            incidental_animation_cue: cue,
            ..Default::default()
        }
    };

    let mut conditions = BTreeMap::new();
    conditions.insert("NA_V1".to_string(), ConditionOverrides::default());
    conditions.insert(
        "NA_V2".to_string(),
        shape_rule("NA(pedagogical)", None, Some(AnimationCue::Pedagogical)),
    );
    conditions.insert(
        "A_V1".to_string(),
        ConditionOverrides {
            condition_name: Some("A(accidental)".into()),
            skip_demo: Some(true),
            ..Default::default()
        },
    );
    conditions.insert(
        "A_V2".to_string(),
        shape_rule("A(pedagogical)", Some(true), None),
    );
    conditions.insert(
        "pilot".to_string(),
        ConditionOverrides {
            skip_demo: Some(true),
            card_sort_criterion: Some(1),
            transfer_criterion: Some(1),
            ..Default::default()
        },
    );
    conditions
}

impl ExperimentConfig {
    /// Load from a TOML file. A missing file means built-in defaults; a file
    /// that exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!(
            "Loaded config from {} ({} conditions)",
            path.display(),
            config.conditions.len()
        );
        Ok(config)
    }

    /// Parse TOML. Entries under `[conditions]` extend the built-in registry,
    /// replacing any built-in entry of the same name.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ExperimentConfig = toml::from_str(content)?;
        let mut config = Self::default();
        config.defaults = file.defaults;
        config.conditions.extend(file.conditions);
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn condition_names(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// Settings for `name` (or the defaults when `None`) before validation.
    pub fn settings(&self, name: Option<&str>) -> Result<ConditionSettings> {
        match name {
            None => Ok(self.defaults.clone()),
            Some(name) => {
                let overrides = self.conditions.get(name).ok_or_else(|| {
                    let known: Vec<&str> = self.condition_names().collect();
                    Error::invalid_config(format!(
                        "unknown condition {name:?} (known: {})",
                        known.join(", ")
                    ))
                })?;
                Ok(overrides.apply(&self.defaults))
            }
        }
    }

    /// Resolve and validate a condition. Call once at session start.
    pub fn resolve(&self, name: Option<&str>) -> Result<Condition> {
        let condition = self.settings(name)?.validate()?;
        tracing::info!(
            condition = %condition.name(),
            rule = %condition.sorting_rule(),
            incidental = %condition.incidental(),
            "Resolved condition"
        );
        Ok(condition)
    }
}

/// Validated, read-only condition parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    name: String,
    sorting_rule: Attribute,
    incidental: AttributeValue,
    skip_demo: bool,
    demo_stimuli: Vec<Card>,
    demo_rule_only_count: usize,
    animation_cue: AnimationCue,
    card_sort_criterion: u32,
    transfer_criterion: u32,
    texts: InstructionTexts,
}

impl Condition {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn sorting_rule(&self) -> Attribute {
        self.sorting_rule
    }
    pub fn incidental(&self) -> AttributeValue {
        self.incidental
    }
    pub fn incidental_attribute(&self) -> Attribute {
        self.incidental.attribute()
    }
    pub fn skip_demo(&self) -> bool {
        self.skip_demo
    }
    pub fn demo_stimuli(&self) -> &[Card] {
        &self.demo_stimuli
    }
    pub fn demo_rule_only_count(&self) -> usize {
        self.demo_rule_only_count
    }
    pub fn animation_cue(&self) -> AnimationCue {
        self.animation_cue
    }
    pub fn card_sort_criterion(&self) -> u32 {
        self.card_sort_criterion
    }
    pub fn transfer_criterion(&self) -> u32 {
        self.transfer_criterion
    }
    pub fn texts(&self) -> &InstructionTexts {
        &self.texts
    }
}
