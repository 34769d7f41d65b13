use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::period::Period;

/// Server-side predicates shared by aggregate and raw analytics queries.
///
/// Every field is optional; anything left unset is omitted from the JSON
/// body and the server applies no constraint for it. Values are not
/// validated locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub escalation_policy_ids: Vec<String>,
}

impl AnalyticsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_at_start(mut self, ts: &str) -> Self {
        self.created_at_start = Some(ts.to_string());
        self
    }

    pub fn created_at_end(mut self, ts: &str) -> Self {
        self.created_at_end = Some(ts.to_string());
        self
    }

    pub fn created_between(self, start: &str, end: &str) -> Self {
        self.created_at_start(start).created_at_end(end)
    }

    /// Bound `created_at` to the UTC range covered by `period`.
    pub fn period(self, period: &Period) -> Result<Self> {
        let (start, end) = period.bounds()?;
        Ok(self.created_between(&start, &end))
    }

    pub fn urgency(mut self, urgency: &str) -> Self {
        self.urgency = Some(urgency.to_string());
        self
    }

    pub fn major(mut self, val: bool) -> Self {
        self.major = Some(val);
        self
    }

    pub fn service(mut self, id: &str) -> Self {
        self.service_ids.push(id.to_string());
        self
    }

    pub fn team(mut self, id: &str) -> Self {
        self.team_ids.push(id.to_string());
        self
    }

    pub fn escalation_policy(mut self, id: &str) -> Self {
        self.escalation_policy_ids.push(id.to_string());
        self
    }

    pub fn priority_id(mut self, id: &str) -> Self {
        self.priority_ids.push(id.to_string());
        self
    }

    pub fn priority_name(mut self, name: &str) -> Self {
        self.priority_names.push(name.to_string());
        self
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_filter_serializes_to_empty_object() {
        let filter = AnalyticsFilter::new();
        assert!(filter.is_empty());
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({}));
    }

    #[test]
    fn test_builder_sets_wire_fields() {
        let filter = AnalyticsFilter::new()
            .created_between("2021-01-01T15:00:32Z", "2021-01-08T15:00:32Z")
            .team("PCDYDX0")
            .team("PTEAM02")
            .service("PSEJLIN")
            .escalation_policy("PEP0001")
            .priority_name("P1")
            .urgency("high")
            .major(true);

        assert!(!filter.is_empty());
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({
                "created_at_start": "2021-01-01T15:00:32Z",
                "created_at_end": "2021-01-08T15:00:32Z",
                "urgency": "high",
                "major": true,
                "service_ids": ["PSEJLIN"],
                "team_ids": ["PCDYDX0", "PTEAM02"],
                "priority_names": ["P1"],
                "escalation_policy_ids": ["PEP0001"]
            })
        );
    }

    #[test]
    fn test_major_false_is_sent() {
        // An explicit `false` is a constraint, unlike an absent flag.
        let filter = AnalyticsFilter::new().major(false);
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({"major": false}));
    }

    #[test]
    fn test_period_sets_created_bounds() {
        let filter = AnalyticsFilter::new()
            .period(&Period::Month(2021, 1))
            .unwrap();
        assert_eq!(filter.created_at_start.as_deref(), Some("2021-01-01T00:00:00Z"));
        assert_eq!(filter.created_at_end.as_deref(), Some("2021-02-01T00:00:00Z"));
    }

    #[test]
    fn test_decode_tolerates_missing_lists() {
        let filter: AnalyticsFilter = serde_json::from_value(json!({
            "created_at_start": "2021-01-06T09:21:41Z",
            "team_ids": ["PCDYDX0"]
        }))
        .unwrap();
        assert_eq!(filter.team_ids, vec!["PCDYDX0"]);
        assert!(filter.service_ids.is_empty());
        assert_eq!(filter.created_at_end, None);
    }
}
