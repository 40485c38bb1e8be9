use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::SourceError;

/// Job header as the system of record returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub name: Option<String>,
}

/// A scheduled activity on a job ("Install", "Digitize", ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl Activity {
    pub fn new(kind: &str, start_date: Option<NaiveDate>) -> Self {
        Self {
            kind: kind.to_string(),
            start_date,
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind.trim().eq_ignore_ascii_case(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Form {
    pub name: String,
}

/// Read-only access to the job-tracking system of record.
///
/// Every lookup is independent of the others, so a scanner may run many at once.
#[allow(async_fn_in_trait)]
pub trait JobSource {
    /// `None` when no job has this identifier.
    async fn get_job(&self, id: u32) -> Result<Option<JobRecord>, SourceError>;

    async fn get_activities(&self, id: u32) -> Result<Vec<Activity>, SourceError>;

    async fn get_forms(&self, id: u32) -> Result<Vec<Form>, SourceError>;

    async fn job_exists(&self, id: u32) -> Result<bool, SourceError> {
        Ok(self.get_job(id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_deserializes_wire_names() {
        let json = r#"[{"type":"Install","startDate":"2024-05-20"},{"type":"Template"}]"#;
        let activities: Vec<Activity> = serde_json::from_str(json).unwrap();
        assert_eq!(
            activities[0],
            Activity::new("Install", NaiveDate::from_ymd_opt(2024, 5, 20))
        );
        assert_eq!(activities[1].start_date, None);
    }

    #[test]
    fn activity_kind_ignores_case() {
        assert!(Activity::new("digitize", None).is("Digitize"));
        assert!(!Activity::new("Install", None).is("Digitize"));
    }

    #[test]
    fn job_record_name_is_optional() {
        let job: JobRecord = serde_json::from_str(r#"{"id": 19001}"#).unwrap();
        assert_eq!(job.name, None);
    }
}
