pub mod analytics;
pub mod client;
pub mod date_util;
pub mod error;
pub mod period;
pub mod url;

pub use analytics::{
    AggregateDimension, AggregateUnit, Analytics, AnalyticsData, AnalyticsFilter,
    AnalyticsRawIncident, AnalyticsRawIncidentsRequest, AnalyticsRawIncidentsResponse,
    AnalyticsRequest, AnalyticsResponse, SortOrder,
};
pub use client::{Client, ClientConfig};
pub use error::{Error, Result};
pub use period::Period;
pub use crate::url::{
    generate_pagerduty_url, parse_pagerduty_url, resolve_id, PagerDutyUrlInfo, ResourceKind,
};
