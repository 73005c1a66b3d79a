//! Roster loading: the backend's per-session student list, or a local JSON
//! file in the same shape.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ProformaError, Result};
use crate::model::StudentRecord;

/// Parse a roster payload. Accepts a bare array, or an object wrapping the
/// array under `students` or `data`.
pub fn parse_roster(body: &str) -> Result<Vec<StudentRecord>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProformaError::InvalidRoster(e.to_string()))?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("students").or_else(|| map.remove("data")) {
            Some(inner @ Value::Array(_)) => inner,
            _ => {
                return Err(ProformaError::InvalidRoster(
                    "expected an array under \"students\" or \"data\"".into(),
                ));
            }
        },
        other => {
            return Err(ProformaError::InvalidRoster(format!(
                "expected a JSON array, got {}",
                kind_of(&other)
            )));
        }
    };
    serde_json::from_value(list).map_err(|e| ProformaError::InvalidRoster(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Read a roster from a JSON file on disk.
pub fn load_roster_file(path: &Path) -> Result<Vec<StudentRecord>> {
    let body = std::fs::read_to_string(path)?;
    let students = parse_roster(&body)?;
    info!(count = students.len(), path = %path.display(), "loaded roster file");
    Ok(students)
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Client for the backend's student listing endpoint.
pub struct RosterClient {
    base_url: String,
    client: reqwest::Client,
}

impl RosterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// `{base}/students?sessionId={id}`
    pub fn students_url(&self, session_id: &str) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/students"))
            .map_err(|e| ProformaError::Config(format!("invalid api_base_url: {e}")))?;
        url.query_pairs_mut().append_pair("sessionId", session_id);
        Ok(url)
    }

    /// Fetch every student in a session. No pagination; the whole roster is
    /// returned in one response.
    pub async fn fetch_students(&self, session_id: &str) -> Result<Vec<StudentRecord>> {
        let url = self.students_url(session_id)?;
        debug!(%url, "fetching roster");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProformaError::Roster(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%url, %status, "roster request failed");
            return Err(ProformaError::Roster(format!("server returned {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ProformaError::Roster(e.to_string()))?;
        let students = parse_roster(&body)?;
        info!(session = %session_id, count = students.len(), "roster fetched");
        Ok(students)
    }
}
