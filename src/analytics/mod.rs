//! PagerDuty Analytics API: aggregate incident metrics and raw incident data.
//!
//! Every call is a single request/response exchange. Nothing is cached,
//! retried or followed automatically; pagination is driven by the caller
//! through [`AnalyticsRawIncidentsResponse::next_page`].

pub mod filter;
pub mod pagination;
pub mod types;

pub use filter::AnalyticsFilter;
pub use types::{
    AggregateUnit, AnalyticsData, AnalyticsRawIncident, AnalyticsRawIncidentsRequest,
    AnalyticsRawIncidentsResponse, AnalyticsRequest, AnalyticsResponse, SortOrder,
};

use crate::client::Client;
use crate::error::{Error, Result};

const RAW_INCIDENTS: [&str; 3] = ["analytics", "raw", "incidents"];

/// Which breakdown an aggregate metrics query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateDimension {
    /// One series across all matching incidents.
    Incidents,
    Services,
    Teams,
    EscalationPolicies,
}

impl AggregateDimension {
    fn path(&self) -> [&'static str; 4] {
        let last = match self {
            AggregateDimension::Incidents => "all",
            AggregateDimension::Services => "services",
            AggregateDimension::Teams => "teams",
            AggregateDimension::EscalationPolicies => "escalation_policies",
        };
        ["analytics", "metrics", "incidents", last]
    }
}

/// Analytics endpoints, borrowed from a [`Client`] via [`Client::analytics`].
#[derive(Debug, Clone, Copy)]
pub struct Analytics<'a> {
    client: &'a Client,
}

impl<'a> Analytics<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST an aggregate query for the given breakdown.
    pub async fn aggregated(
        &self,
        dimension: AggregateDimension,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse> {
        self.client.post(&dimension.path(), request).await
    }

    pub async fn aggregated_incident_data(
        &self,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse> {
        self.aggregated(AggregateDimension::Incidents, request).await
    }

    pub async fn aggregated_service_data(
        &self,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse> {
        self.aggregated(AggregateDimension::Services, request).await
    }

    pub async fn aggregated_team_data(
        &self,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse> {
        self.aggregated(AggregateDimension::Teams, request).await
    }

    pub async fn aggregated_escalation_policy_data(
        &self,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse> {
        self.aggregated(AggregateDimension::EscalationPolicies, request)
            .await
    }

    /// GET raw metrics for one incident.
    pub async fn raw_incident(&self, id: &str) -> Result<AnalyticsRawIncident> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidIdentifier("incident id is empty".into()));
        }
        let [a, b, c] = RAW_INCIDENTS;
        self.client.get(&[a, b, c, id]).await
    }

    /// POST a raw-incident query and return one page.
    pub async fn raw_incidents(
        &self,
        request: &AnalyticsRawIncidentsRequest,
    ) -> Result<AnalyticsRawIncidentsResponse> {
        self.client.post(&RAW_INCIDENTS, request).await
    }
}
