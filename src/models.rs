use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset};
use serde::{self, Deserialize, Deserializer, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NumberOrString", into = "u8")]
pub enum Citizenship {
    Domestic,
    Overseas,
}

impl Citizenship {
    pub const ALL: [Citizenship; 2] = [Citizenship::Domestic, Citizenship::Overseas];

    pub fn code(self) -> u8 {
        match self {
            Citizenship::Domestic => 1,
            Citizenship::Overseas => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Citizenship::Domestic => "Domestic",
            Citizenship::Overseas => "Overseas",
        }
    }
}

impl From<Citizenship> for u8 {
    fn from(value: Citizenship) -> Self {
        value.code()
    }
}

impl TryFrom<NumberOrString> for Citizenship {
    type Error = String;

    fn try_from(value: NumberOrString) -> Result<Self, Self::Error> {
        let code = match value {
            NumberOrString::Number(n) => n,
            NumberOrString::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|err| format!("invalid citizenship '{s}': {err}"))?,
        };
        match code {
            1 => Ok(Citizenship::Domestic),
            2 => Ok(Citizenship::Overseas),
            other => Err(format!("unknown citizenship code {other}")),
        }
    }
}

/// Backend ids and type identifiers arrive as either JSON numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(u64),
    Text(String),
}

impl NumberOrString {
    fn into_string(self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(deserialize_with = "from_id")]
    pub id: String,
    #[serde(deserialize_with = "from_id")]
    pub competition_id: String,
    pub team_name: String,
    pub citizenship: Citizenship,
    #[serde(default, deserialize_with = "from_opt_string_map")]
    pub team_additional: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalField {
    pub name: String,
    pub normalized_name: String,
    #[serde(rename = "type", deserialize_with = "from_id")]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamDetail {
    pub team: Team,
    #[serde(rename = "additionalField", alias = "additionalFields", default)]
    pub additional_fields: Vec<AdditionalField>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(deserialize_with = "from_id")]
    pub id: String,
    #[serde(deserialize_with = "from_id")]
    pub competition_id: String,
    pub team_name: String,
    #[serde(default)]
    pub competition_name: Option<String>,
    #[serde(default, deserialize_with = "from_opt_datetime")]
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// Partial update body for `PUT /api/competition/{competitionId}/teams/{teamId}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamUpdate {
    pub team_name: String,
    pub citizenship: Citizenship,
    pub team_additional: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Select,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Resolves backend field-type identifiers to the three rendering kinds.
#[derive(Debug, Clone)]
pub struct FieldTypeMap {
    kinds: HashMap<String, FieldKind>,
}

impl Default for FieldTypeMap {
    fn default() -> Self {
        let builtin = [
            ("1", FieldKind::Text),
            ("text", FieldKind::Text),
            ("string", FieldKind::Text),
            ("number", FieldKind::Text),
            ("email", FieldKind::Text),
            ("url", FieldKind::Text),
            ("2", FieldKind::Select),
            ("select", FieldKind::Select),
            ("multiselect", FieldKind::Select),
            ("multi_select", FieldKind::Select),
            ("3", FieldKind::File),
            ("file", FieldKind::File),
            ("document", FieldKind::File),
        ];
        Self {
            kinds: builtin
                .into_iter()
                .map(|(id, kind)| (id.to_string(), kind))
                .collect(),
        }
    }
}

impl FieldTypeMap {
    pub fn with_overrides(overrides: &HashMap<String, FieldKind>) -> Self {
        let mut map = Self::default();
        for (id, kind) in overrides {
            map.kinds.insert(id.trim().to_lowercase(), *kind);
        }
        map
    }

    /// Unknown identifiers render as plain text inputs.
    pub fn resolve(&self, field_type: &str) -> FieldKind {
        match self.kinds.get(&field_type.trim().to_lowercase()) {
            Some(kind) => *kind,
            None => {
                debug!("Unknown field type '{}', rendering as text", field_type);
                FieldKind::Text
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub text: String,
}

impl Notification {
    pub fn success(title: &str, text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.to_string(),
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: "Error!".to_string(),
            text: text.into(),
        }
    }
}

fn from_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberOrString::deserialize(deserializer)?.into_string())
}

fn from_opt_string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    let Some(raw) = opt else {
        return Ok(BTreeMap::new());
    };

    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

fn from_opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    if let Some(s) = opt {
        let dt = DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)?;
        Ok(Some(dt))
    } else {
        Ok(None)
    }
}
