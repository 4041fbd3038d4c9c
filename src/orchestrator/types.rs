use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// An automation definition registered in Orchestrator (an OData "Release").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(alias = "Id")]
    pub id: i64,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(alias = "Description", default, deserialize_with = "null_as_empty")]
    pub description: String,
}

/// One job created by a start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResult {
    #[serde(alias = "Id")]
    pub id: i64,
    #[serde(alias = "Key", default)]
    pub key: String,
    #[serde(alias = "State", default)]
    pub state: String,
    #[serde(alias = "ReleaseName", default)]
    pub release_name: Option<String>,
    #[serde(alias = "CreationTime", default)]
    pub creation_time: Option<String>,
}

impl StartResult {
    pub fn status(&self) -> Option<JobStatus> {
        self.state.parse().ok()
    }
}

/// Body of the StartJobs action.
#[derive(Debug, Clone, Serialize)]
pub struct StartJobsRequest {
    #[serde(rename = "startInfo")]
    pub start_info: StartInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartInfo {
    #[serde(rename = "ReleaseKey")]
    pub release_key: String,
}

impl StartJobsRequest {
    pub fn for_process(process_key: &str) -> Self {
        Self {
            start_info: StartInfo {
                release_key: process_key.to_string(),
            },
        }
    }
}

/// Collection responses arrive as a bare array, an `items` page or an OData `value` envelope.
///
/// An envelope whose list is missing or null holds no items.
#[derive(Debug)]
pub struct ListEnvelope<T>(Vec<T>);

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ListEnvelope<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = match Value::deserialize(deserializer)? {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut fields) => match fields.remove("items").or_else(|| fields.remove("value")) {
                Some(Value::Null) | None => return Ok(ListEnvelope(Vec::new())),
                Some(list) => list,
            },
            other => {
                return Err(D::Error::custom(format!(
                    "expected a list or an items/value envelope, got {other}"
                )))
            }
        };

        let Value::Array(items) = list else {
            return Err(D::Error::custom("envelope list is not an array"));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item)
                    .map_err(|e| D::Error::custom(format!("item {index}: {e}")))
            })
            .collect::<Result<Vec<T>, _>>()
            .map(ListEnvelope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Successful,
    Failed,
    Pending,
    Running,
    Stopped,
    Stopping,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Successful,
        JobStatus::Failed,
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Stopped,
        JobStatus::Stopping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Successful => "Successful",
            JobStatus::Failed => "Failed",
            JobStatus::Pending => "Pending",
            JobStatus::Running => "Running",
            JobStatus::Stopped => "Stopped",
            JobStatus::Stopping => "Stopping",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown job status: {s}"))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
