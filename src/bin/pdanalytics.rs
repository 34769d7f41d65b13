use clap::{Args, Parser, Subcommand};

use pagerduty_analytics::date_util::parse_timestamp;
use pagerduty_analytics::url::{generate_pagerduty_url, resolve_id, ResourceKind};
use pagerduty_analytics::{
    AggregateDimension, AggregateUnit, AnalyticsData, AnalyticsFilter, AnalyticsRawIncident,
    AnalyticsRawIncidentsRequest, AnalyticsRawIncidentsResponse, AnalyticsRequest,
    AnalyticsResponse, Client, ClientConfig, Period, SortOrder,
};

#[derive(Parser)]
#[command(name = "pdanalytics", about = "PagerDuty Analytics CLI")]
struct Cli {
    /// API base URL (default: $PAGERDUTY_API_URL or https://api.pagerduty.com)
    #[arg(long)]
    api_url: Option<String>,

    /// Account subdomain, used to print incident links (e.g. "acme")
    #[arg(long)]
    subdomain: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregated incident metrics
    Aggregate {
        #[command(subcommand)]
        target: AggregateTarget,
    },
    /// Raw per-incident metrics
    Raw {
        #[command(subcommand)]
        action: RawAction,
    },
}

#[derive(Subcommand)]
enum AggregateTarget {
    /// Metrics across all matching incidents
    Incidents(AggregateArgs),
    /// Metrics broken down by service
    Services(AggregateArgs),
    /// Metrics broken down by team
    Teams(AggregateArgs),
    /// Metrics broken down by escalation policy
    EscalationPolicies(AggregateArgs),
}

#[derive(Subcommand)]
enum RawAction {
    /// Raw metrics for one incident
    Get {
        /// Incident ID or PagerDuty incident URL
        #[arg(value_name = "INCIDENT_ID_OR_URL")]
        incident: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List raw incident metrics, one page at a time
    List(RawListArgs),
}

/// Filters shared by every query.
#[derive(Args)]
struct FilterArgs {
    /// Period (e.g. 2024-Q1, 2024-03, 2024-W05, 30d, qtd)
    #[arg(long, conflicts_with_all = ["since", "until"])]
    period: Option<String>,
    /// Created at or after (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    since: Option<String>,
    /// Created before (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    until: Option<String>,
    /// Team ID or URL (repeatable)
    #[arg(long = "team", value_name = "TEAM_ID_OR_URL")]
    teams: Vec<String>,
    /// Service ID or URL (repeatable)
    #[arg(long = "service", value_name = "SERVICE_ID_OR_URL")]
    services: Vec<String>,
    /// Escalation policy ID or URL (repeatable)
    #[arg(long = "escalation-policy", value_name = "POLICY_ID_OR_URL")]
    escalation_policies: Vec<String>,
    /// Priority ID (repeatable)
    #[arg(long = "priority-id")]
    priority_ids: Vec<String>,
    /// Priority name, e.g. P1 (repeatable)
    #[arg(long = "priority")]
    priority_names: Vec<String>,
    /// Urgency: high or low
    #[arg(long)]
    urgency: Option<String>,
    /// Major incidents only
    #[arg(long)]
    major: bool,
}

#[derive(Args)]
struct AggregateArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Aggregation bucket: day, week or month
    #[arg(long, default_value = "day")]
    unit: AggregateUnit,
    /// IANA time zone for bucketing (e.g. Etc/UTC)
    #[arg(long)]
    time_zone: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RawListArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Records per page
    #[arg(long)]
    limit: Option<u32>,
    /// Sort direction: asc or desc
    #[arg(long)]
    order: Option<SortOrder>,
    /// Sort field (e.g. created_at)
    #[arg(long)]
    order_by: Option<String>,
    /// Resume after this cursor
    #[arg(long, conflicts_with = "ending_before")]
    starting_after: Option<String>,
    /// Page backwards from this cursor
    #[arg(long)]
    ending_before: Option<String>,
    /// IANA time zone for timestamps
    #[arg(long)]
    time_zone: Option<String>,
    /// Maximum number of pages to fetch
    #[arg(long, default_value = "1")]
    pages: u32,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> anyhow::Result<AnalyticsFilter> {
        let mut filter = AnalyticsFilter::new();

        if let Some(ref p) = self.period {
            filter = filter.period(&Period::parse(p)?)?;
        }
        if let Some(ref since) = self.since {
            filter = filter.created_at_start(&parse_timestamp(since)?);
        }
        if let Some(ref until) = self.until {
            filter = filter.created_at_end(&parse_timestamp(until)?);
        }
        for t in &self.teams {
            filter = filter.team(&resolve_id(t, ResourceKind::Team)?);
        }
        for s in &self.services {
            filter = filter.service(&resolve_id(s, ResourceKind::Service)?);
        }
        for ep in &self.escalation_policies {
            filter = filter.escalation_policy(&resolve_id(ep, ResourceKind::EscalationPolicy)?);
        }
        for id in &self.priority_ids {
            filter = filter.priority_id(id);
        }
        for name in &self.priority_names {
            filter = filter.priority_name(name);
        }
        if let Some(ref u) = self.urgency {
            filter = filter.urgency(u);
        }
        if self.major {
            filter = filter.major(true);
        }
        Ok(filter)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    let client = Client::from_config(config)?;
    log::info!("Using PagerDuty API at {}", client.base_url());

    match cli.command {
        Commands::Aggregate { target } => {
            handle_aggregate(&client, target).await?;
        }
        Commands::Raw { action } => {
            handle_raw(&client, action, cli.subdomain.as_deref()).await?;
        }
    }

    Ok(())
}

async fn handle_aggregate(client: &Client, target: AggregateTarget) -> anyhow::Result<()> {
    let (dimension, args) = match target {
        AggregateTarget::Incidents(a) => (AggregateDimension::Incidents, a),
        AggregateTarget::Services(a) => (AggregateDimension::Services, a),
        AggregateTarget::Teams(a) => (AggregateDimension::Teams, a),
        AggregateTarget::EscalationPolicies(a) => (AggregateDimension::EscalationPolicies, a),
    };

    let mut request = AnalyticsRequest::new(args.filter.to_filter()?).aggregate_unit(args.unit);
    if let Some(ref tz) = args.time_zone {
        request = request.time_zone(tz);
    }

    let response = client.analytics().aggregated(dimension, &request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_aggregate(dimension, &response);
    }
    Ok(())
}

async fn handle_raw(
    client: &Client,
    action: RawAction,
    subdomain: Option<&str>,
) -> anyhow::Result<()> {
    match action {
        RawAction::Get { incident, json } => {
            let id = resolve_id(&incident, ResourceKind::Incident)?;
            let raw = client.analytics().raw_incident(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&raw)?);
            } else {
                print_raw_incident(&raw, subdomain);
            }
        }
        RawAction::List(args) => {
            let mut request = AnalyticsRawIncidentsRequest::new(args.filter.to_filter()?);
            request.limit = args.limit;
            request.order = args.order;
            request.order_by = args.order_by;
            request.starting_after = args.starting_after;
            request.ending_before = args.ending_before;
            request.time_zone = args.time_zone;
            let backward = request.ending_before.is_some();

            let pages = fetch_pages(client, request, args.pages.max(1)).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&pages)?);
            } else {
                print_raw_pages(&pages, backward, subdomain);
            }
        }
    }
    Ok(())
}

/// Follow cursors until the server reports no more data or `max_pages` is reached.
///
/// A query started from `ending_before` walks backwards on `first` cursors;
/// anything else walks forwards on `last`.
async fn fetch_pages(
    client: &Client,
    mut request: AnalyticsRawIncidentsRequest,
    max_pages: u32,
) -> anyhow::Result<Vec<AnalyticsRawIncidentsResponse>> {
    let analytics = client.analytics();
    let mut pages = Vec::new();
    loop {
        let page = analytics.raw_incidents(&request).await?;
        let next = following_page(&page, &request);
        pages.push(page);
        match next {
            Some(next) if (pages.len() as u32) < max_pages => {
                log::info!("Fetching page {}", pages.len() + 1);
                request = next;
            }
            _ => break,
        }
    }
    Ok(pages)
}

fn following_page(
    page: &AnalyticsRawIncidentsResponse,
    request: &AnalyticsRawIncidentsRequest,
) -> Option<AnalyticsRawIncidentsRequest> {
    if request.ending_before.is_none() {
        return page.next_page(request);
    }
    if !page.more {
        return None;
    }
    page.previous_page(request)
}

fn print_aggregate(dimension: AggregateDimension, response: &AnalyticsResponse) {
    let unit = response.aggregate_unit.map(|u| u.to_string()).unwrap_or_else(|| "-".into());
    let tz = response.time_zone.as_deref().unwrap_or("UTC");
    println!("Aggregate: {:?} (unit: {unit}, tz: {tz})", dimension);
    if let Some(ref f) = response.filters {
        println!(
            "  Range: {} .. {}",
            f.created_at_start.as_deref().unwrap_or("*"),
            f.created_at_end.as_deref().unwrap_or("*")
        );
    }
    if response.data.is_empty() {
        println!("  No data.");
        return;
    }
    for row in &response.data {
        println!();
        print_data_row(dimension, row);
    }
}

fn print_data_row(dimension: AggregateDimension, row: &AnalyticsData) {
    let label = match dimension {
        AggregateDimension::Incidents => None,
        AggregateDimension::Services => row.service_name.as_ref().or(row.service_id.as_ref()),
        AggregateDimension::Teams => row.team_name.as_ref().or(row.team_id.as_ref()),
        AggregateDimension::EscalationPolicies => row
            .escalation_policy_name
            .as_ref()
            .or(row.escalation_policy_id.as_ref()),
    };
    let start = row.range_start.as_deref().unwrap_or("all time");
    match label {
        Some(l) => println!("  [{start}] {l}"),
        None => println!("  [{start}]"),
    }
    println!("    Incidents:       {}", fmt_count(row.total_incident_count));
    println!("    Major:           {}", fmt_count(row.total_major_incidents));
    println!(
        "    Interruptions:   {} (business {}, off-hour {}, sleep {})",
        fmt_count(row.total_interruptions),
        fmt_count(row.total_business_hour_interruptions),
        fmt_count(row.total_off_hour_interruptions),
        fmt_count(row.total_sleep_hour_interruptions),
    );
    println!("    Mean to ack:     {}", fmt_secs(row.mean_seconds_to_first_ack));
    println!("    Mean to resolve: {}", fmt_secs(row.mean_seconds_to_resolve));
    println!("    Mean engaged:    {}", fmt_secs(row.mean_engaged_seconds));
    println!(
        "    Engaged total:   {}",
        fmt_secs(row.total_engaged_seconds.map(|s| s as f64))
    );
    if let Some(pct) = row.up_time_pct {
        println!("    Uptime:          {pct:.2}%");
    }
}

fn print_raw_incident(raw: &AnalyticsRawIncident, subdomain: Option<&str>) {
    let id = raw.id.as_deref().unwrap_or("?");
    let number = raw.incident_number.map(|n| format!("#{n}")).unwrap_or_default();
    println!("Incident {id} {number}");
    if let Some(ref d) = raw.description {
        println!("  {d}");
    }
    if let (Some(sub), Some(id)) = (subdomain, raw.id.as_deref()) {
        println!("  {}", generate_pagerduty_url(sub, ResourceKind::Incident, id));
    }
    println!("  Service:    {}", raw.service_name.as_deref().unwrap_or("-"));
    println!("  Team:       {}", raw.team_name.as_deref().unwrap_or("-"));
    println!(
        "  Priority:   {} | Urgency: {} | Major: {}",
        raw.priority_name.as_deref().unwrap_or("-"),
        raw.urgency.as_deref().unwrap_or("-"),
        if raw.major.unwrap_or(false) { "yes" } else { "no" }
    );
    println!(
        "  Created:    {} | Resolved: {}",
        raw.created_at.as_deref().unwrap_or("-"),
        raw.resolved_at.as_deref().unwrap_or("open")
    );
    println!("  To ack:     {}", fmt_secs(raw.seconds_to_first_ack.map(|s| s as f64)));
    println!("  To resolve: {}", fmt_secs(raw.seconds_to_resolve.map(|s| s as f64)));
    println!(
        "  Escalations: {} | Assignments: {} | Engaged users: {}",
        fmt_count(raw.escalation_count),
        fmt_count(raw.assignment_count),
        fmt_count(raw.engaged_user_count)
    );
}

fn print_raw_pages(
    pages: &[AnalyticsRawIncidentsResponse],
    backward: bool,
    subdomain: Option<&str>,
) {
    let mut total = 0;
    for page in pages {
        for raw in &page.data {
            let id = raw.id.as_deref().unwrap_or("?");
            let created = raw.created_at.as_deref().unwrap_or("-");
            let service = raw.service_name.as_deref().unwrap_or("-");
            let resolve = fmt_secs(raw.seconds_to_resolve.map(|s| s as f64));
            let major = if raw.major.unwrap_or(false) { " [major]" } else { "" };
            println!("{id} {created} {service} | resolve: {resolve}{major}");
            if let Some(sub) = subdomain {
                println!("    {}", generate_pagerduty_url(sub, ResourceKind::Incident, id));
            }
            total += 1;
        }
    }
    if total == 0 {
        println!("No incidents found.");
    } else {
        println!("\n{total} incidents");
    }
    let Some(page) = pages.last().filter(|p| p.more) else {
        return;
    };
    if backward {
        if let Some(ref cursor) = page.first {
            println!("Earlier results: --ending-before {cursor}");
        }
    } else if let Some(ref cursor) = page.last {
        println!("More results: --starting-after {cursor}");
    }
}

fn fmt_count(n: Option<u64>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "-".into())
}

fn fmt_secs(secs: Option<f64>) -> String {
    let Some(secs) = secs else {
        return "-".into();
    };
    let total = secs.round() as u64;
    let (d, h, m, s) = (total / 86_400, total % 86_400 / 3600, total % 3600 / 60, total % 60);
    if d > 0 {
        format!("{d}d {h}h {m}m")
    } else if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
