use std::fmt;

use crate::error::{Error, Result};

/// Resource types that have a web URL in the PagerDuty app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Incident,
    Service,
    Team,
    EscalationPolicy,
}

impl ResourceKind {
    fn path_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Incident => "incidents",
            ResourceKind::Service => "service-directory",
            ResourceKind::Team => "teams",
            ResourceKind::EscalationPolicy => "escalation_policies",
        }
    }

    fn from_path_prefix(s: &str) -> Option<Self> {
        match s {
            "incidents" => Some(ResourceKind::Incident),
            "service-directory" | "services" => Some(ResourceKind::Service),
            "teams" => Some(ResourceKind::Team),
            "escalation_policies" => Some(ResourceKind::EscalationPolicy),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Incident => "incident",
            ResourceKind::Service => "service",
            ResourceKind::Team => "team",
            ResourceKind::EscalationPolicy => "escalation policy",
        };
        f.write_str(name)
    }
}

/// Parsed information from a PagerDuty web URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerDutyUrlInfo {
    /// Account subdomain, e.g. `acme` for `acme.pagerduty.com`.
    pub subdomain: String,
    pub kind: ResourceKind,
    pub id: String,
}

/// Parse a PagerDuty web URL into its account and resource ID.
///
/// Supported URL patterns:
/// - `https://<subdomain>.pagerduty.com/incidents/<id>[/...]`
/// - `https://<subdomain>.pagerduty.com/service-directory/<id>[/...]`
/// - `https://<subdomain>.pagerduty.com/teams/<id>[/...]`
/// - `https://<subdomain>.pagerduty.com/escalation_policies/<id>`
/// - `https://<subdomain>.pagerduty.com/escalation_policies#<id>`
///
/// EU accounts (`<subdomain>.eu.pagerduty.com`) are accepted too.
pub fn parse_pagerduty_url(input: &str) -> Result<PagerDutyUrlInfo> {
    let url = url::Url::parse(input).map_err(|e| Error::UrlParse(e.to_string()))?;

    let host = url.host_str().unwrap_or("");
    let subdomain = host
        .strip_suffix(".eu.pagerduty.com")
        .or_else(|| host.strip_suffix(".pagerduty.com"))
        .filter(|s| !s.is_empty() && !s.contains('.'))
        .ok_or_else(|| Error::UrlParse(format!("not a PagerDuty account URL: {input}")))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let prefix = segments.first().copied().unwrap_or("");
    let kind = ResourceKind::from_path_prefix(prefix)
        .ok_or_else(|| Error::UrlParse(format!("unsupported PagerDuty URL: {input}")))?;

    // Older escalation policy links put the ID in the fragment.
    let id = segments
        .get(1)
        .copied()
        .or_else(|| url.fragment())
        .filter(|s| is_pagerduty_id(s))
        .ok_or_else(|| Error::UrlParse(format!("missing {kind} ID in URL: {input}")))?;

    Ok(PagerDutyUrlInfo {
        subdomain: subdomain.to_string(),
        kind,
        id: id.to_string(),
    })
}

/// Generate the web URL for a resource in the given account.
pub fn generate_pagerduty_url(subdomain: &str, kind: ResourceKind, id: &str) -> String {
    format!("https://{subdomain}.pagerduty.com/{}/{id}", kind.path_prefix())
}

/// Check if a string looks like a PagerDuty object ID (e.g. `PFGEDX0`).
pub fn is_pagerduty_id(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Extract an ID of the expected kind from either a raw ID or a PagerDuty URL.
///
/// Anything that isn't a URL is passed through trimmed; the API is the
/// authority on whether an ID exists. A URL pointing at a different kind of
/// resource is rejected.
pub fn resolve_id(input: &str, expected: ResourceKind) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidIdentifier("empty identifier".into()));
    }
    if is_pagerduty_id(input) || !input.contains("pagerduty.com") {
        return Ok(input.to_string());
    }
    let info = parse_pagerduty_url(input)?;
    if info.kind != expected {
        return Err(Error::InvalidIdentifier(format!(
            "expected a {expected} URL, got a {} URL: {input}",
            info.kind
        )));
    }
    Ok(info.id)
}
