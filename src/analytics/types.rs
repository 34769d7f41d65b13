use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::filter::AnalyticsFilter;

/// Bucket size for aggregate metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateUnit {
    Day,
    Week,
    Month,
}

impl AggregateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateUnit::Day => "day",
            AggregateUnit::Week => "week",
            AggregateUnit::Month => "month",
        }
    }
}

impl fmt::Display for AggregateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(AggregateUnit::Day),
            "week" => Ok(AggregateUnit::Week),
            "month" => Ok(AggregateUnit::Month),
            other => Err(format!(
                "unknown aggregate unit '{other}' (expected day, week or month)"
            )),
        }
    }
}

/// Sort direction for raw incident pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

/// Body of an aggregate metrics query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<AnalyticsFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_unit: Option<AggregateUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl AnalyticsRequest {
    pub fn new(filters: AnalyticsFilter) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }

    pub fn aggregate_unit(mut self, unit: AggregateUnit) -> Self {
        self.aggregate_unit = Some(unit);
        self
    }

    pub fn time_zone(mut self, tz: &str) -> Self {
        self.time_zone = Some(tz.to_string());
        self
    }
}

/// One row of aggregate metrics.
///
/// Which dimension fields are populated depends on the endpoint: service
/// aggregates carry `service_*` (and the owning team), team aggregates carry
/// `team_*`, escalation-policy aggregates carry `escalation_policy_*`.
/// `None` means the server did not send the field; `Some(0)` is a real zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_assignment_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_engaged_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_engaged_user_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_seconds_to_engage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_seconds_to_first_ack: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_seconds_to_mobilize: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_seconds_to_resolve: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_business_hour_interruptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_engaged_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_escalation_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_incident_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_incidents_acknowledged: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_incidents_auto_resolved: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_incidents_manual_escalated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_incidents_reassigned: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_incidents_timeout_escalated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_interruptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_major_incidents: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_notifications: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_off_hour_interruptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sleep_hour_interruptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_snoozed_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_time_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined_effort_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_policy_name: Option<String>,
}

/// Aggregate metrics plus the query parameters the server applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    /// Rows in server order.
    #[serde(default)]
    pub data: Vec<AnalyticsData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<AnalyticsFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_unit: Option<AggregateUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Raw metrics for a single incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRawIncident {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engaged_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engaged_user_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hour_interruptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_hour_interruptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hour_interruptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_to_engage: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_to_first_ack: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_to_mobilize: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_to_resolve: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snoozed_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined_effort_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_policy_name: Option<String>,
}

/// Body of a paginated raw-incident query.
///
/// `starting_after` / `ending_before` are opaque cursors copied from a
/// previous response's `last` / `first`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRawIncidentsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<AnalyticsFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl AnalyticsRawIncidentsRequest {
    pub fn new(filters: AnalyticsFilter) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }

    pub fn starting_after(mut self, cursor: &str) -> Self {
        self.starting_after = Some(cursor.to_string());
        self
    }

    pub fn ending_before(mut self, cursor: &str) -> Self {
        self.ending_before = Some(cursor.to_string());
        self
    }

    pub fn time_zone(mut self, tz: &str) -> Self {
        self.time_zone = Some(tz.to_string());
        self
    }
}

/// One page of raw incidents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRawIncidentsResponse {
    #[serde(default)]
    pub data: Vec<AnalyticsRawIncident>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<AnalyticsFilter>,
    /// Cursor of the first record on this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    /// Cursor of the last record on this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_aggregate_unit_parse() {
        assert_eq!("day".parse::<AggregateUnit>().unwrap(), AggregateUnit::Day);
        assert_eq!("Week".parse::<AggregateUnit>().unwrap(), AggregateUnit::Week);
        assert_eq!(" month ".parse::<AggregateUnit>().unwrap(), AggregateUnit::Month);
        assert!("year".parse::<AggregateUnit>().is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_request_encoding() {
        let request = AnalyticsRequest::new(
            AnalyticsFilter::new()
                .created_between("2021-01-01T15:00:32Z", "2021-01-08T15:00:32Z")
                .team("PCDYDX0"),
        )
        .aggregate_unit(AggregateUnit::Day)
        .time_zone("Etc/UTC");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "filters": {
                    "created_at_start": "2021-01-01T15:00:32Z",
                    "created_at_end": "2021-01-08T15:00:32Z",
                    "team_ids": ["PCDYDX0"]
                },
                "aggregate_unit": "day",
                "time_zone": "Etc/UTC"
            })
        );
    }

    #[test]
    fn test_zero_metric_is_kept() {
        let data = AnalyticsData {
            mean_engaged_user_count: Some(0.0),
            total_snoozed_seconds: Some(0),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&data).unwrap();
        assert_eq!(
            encoded,
            json!({"mean_engaged_user_count": 0.0, "total_snoozed_seconds": 0})
        );

        let decoded: AnalyticsData = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.mean_engaged_user_count, Some(0.0));
        assert_eq!(decoded.total_snoozed_seconds, Some(0));
        assert_eq!(decoded.total_incident_count, None);
    }

    #[test]
    fn test_data_decodes_integer_means_and_ignores_unknown_fields() {
        let data: AnalyticsData = serde_json::from_value(json!({
            "mean_seconds_to_resolve": 34550,
            "total_incident_count": 5,
            "up_time_pct": 89.86111111111111,
            "some_future_metric": 12
        }))
        .unwrap();
        assert_eq!(data.mean_seconds_to_resolve, Some(34550.0));
        assert_eq!(data.total_incident_count, Some(5));
        assert_eq!(data.up_time_pct, Some(89.86111111111111));
    }

    #[test]
    fn test_response_without_data_is_empty() {
        let response: AnalyticsResponse = serde_json::from_value(json!({
            "aggregate_unit": "week",
            "time_zone": "Etc/UTC"
        }))
        .unwrap();
        assert!(response.data.is_empty());
        assert_eq!(response.aggregate_unit, Some(AggregateUnit::Week));
        assert_eq!(response.filters, None);
    }

    #[test]
    fn test_raw_request_encoding() {
        let request = AnalyticsRawIncidentsRequest::new(AnalyticsFilter::new().team("PCDYDX0"))
            .limit(100)
            .order(SortOrder::Asc)
            .order_by("created_at")
            .starting_after("abc=")
            .time_zone("Etc/UTC");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "filters": {"team_ids": ["PCDYDX0"]},
                "starting_after": "abc=",
                "limit": 100,
                "order": "asc",
                "order_by": "created_at",
                "time_zone": "Etc/UTC"
            })
        );
    }

    #[test]
    fn test_raw_response_more_defaults_false() {
        let response: AnalyticsRawIncidentsResponse =
            serde_json::from_value(json!({"data": []})).unwrap();
        assert!(!response.more);
        assert_eq!(response.last, None);
    }
}
