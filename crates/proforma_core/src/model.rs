use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Student record
// ---------------------------------------------------------------------------

/// A student as returned by the backend for one session.
///
/// Every scalar field is optional: the backend omits fields, sends `null`, or
/// sends years as numbers. [`lenient_text`] folds all of these into
/// `Option<String>` so downstream code only ever sees text or nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub father_name: Option<String>,
    #[serde(deserialize_with = "lenient_text", alias = "dateOfBirth")]
    pub dob: Option<String>,
    #[serde(deserialize_with = "lenient_text", alias = "urn")]
    pub university_reg_no: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub branch_year: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub matric_year: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub plus_two_year: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub first_admission_year: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_exam_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub last_exam_year: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub inter_college_graduate_years: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub inter_college_pg_years: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub inter_varsity_years: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub address_with_phone: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub signature_url: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub passport_photo_url: Option<String>,

    #[serde(deserialize_with = "lenient_list")]
    pub sports: Vec<String>,
    #[serde(deserialize_with = "lenient_events")]
    pub event_results: Vec<EventResult>,
}

/// One tournament outcome for a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventResult {
    #[serde(deserialize_with = "lenient_text")]
    pub activity: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub position: Option<String>,
}

impl StudentRecord {
    /// Registration number with surrounding whitespace removed, `None` when blank.
    pub fn reg_no(&self) -> Option<&str> {
        self.university_reg_no
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Sport names joined with `", "`. This is the string the activity filter
    /// searches.
    pub fn sports_joined(&self) -> String {
        self.sports.join(", ")
    }

    /// Activities from event results, falling back to the sport list when the
    /// student has no recorded results.
    pub fn activity_text(&self) -> String {
        let activities: Vec<&str> = self
            .event_results
            .iter()
            .filter_map(|e| e.activity.as_deref())
            .filter(|s| !s.trim().is_empty())
            .collect();
        if activities.is_empty() {
            self.sports_joined()
        } else {
            activities.join(", ")
        }
    }

    /// Positions from event results joined with `", "`.
    pub fn position_text(&self) -> String {
        self.event_results
            .iter()
            .filter_map(|e| e.position.as_deref())
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(value_to_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(_) => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().filter_map(value_to_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_events<'de, D>(deserializer: D) -> Result<Vec<EventResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}
