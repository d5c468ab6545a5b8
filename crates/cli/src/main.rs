//! niceboard CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse arguments** with `clap` and read `NICEBOARD_*` configuration
//!    from the environment.
//! 2. **Wire observability**: a `tracing-subscriber` stack writing to stderr,
//!    plus an OpenTelemetry OTLP exporter when one is configured.
//! 3. **Construct infrastructure**: the reqwest [`client::HttpTransport`]
//!    wrapped in the default retry policy, injected into
//!    [`service::SearchService`].
//! 4. **Run the command** and print its result as pretty JSON on stdout.

mod observability;

use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use client::{ClientConfig, HttpTransport};
use search::{DisplayMode, Registry, ResourceType, SearchOptions, SearchRequest};
use serde_json::{json, Value};
use service::{RetryPolicy, SearchService, ServiceConfig};

/// Search jobs, companies, and taxonomies on a Niceboard job board.
#[derive(Debug, Parser)]
#[command(name = "niceboard", version)]
struct Cli {
    /// Log format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "NICEBOARD_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one search and print the result envelope.
    Search(SearchArgs),
    /// List searchable resources with their filters and fields.
    Resources,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// jobs, companies, locations, categories, or jobtypes.
    resource: ResourceType,

    /// Field to include (dot paths allowed). Repeat for more; omit for all.
    #[arg(short, long = "field")]
    fields: Vec<String>,

    /// Filter as KEY=VALUE. JSON values (`true`, `["a","b"]`) are accepted.
    #[arg(short = 'F', long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, Value)>,

    /// summary, show_n, or all.
    #[arg(short, long, default_value = "summary")]
    display: DisplayMode,

    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    limit: Option<u32>,

    /// Entries returned by show_n.
    #[arg(long)]
    sample_size: Option<usize>,

    /// Overall deadline including retries.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl SearchArgs {
    fn request(&self) -> SearchRequest {
        let mut options = SearchOptions::new().fields(&self.fields).display(self.display);
        for (key, value) in &self.filters {
            options = options.filter(key.as_str(), value.clone());
        }
        options.pagination.page = self.page;
        options.pagination.limit = self.limit;
        options.sample_size = self.sample_size;
        SearchRequest::new(self.resource, options)
    }
}

/// `KEY=VALUE`; the value is JSON if it parses as JSON, a string otherwise.
fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing filter name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

fn describe_resources(registry: &Registry) -> Value {
    registry
        .resources()
        .map(|def| {
            json!({
                "resource": def.resource,
                "endpoint": def.endpoint,
                "filters": def.filters.keys().collect::<Vec<_>>(),
                "fields": def.fields.paths().iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                "default_limit": def.default_limit,
                "max_limit": def.max_limit,
            })
        })
        .collect()
}

async fn search(args: &SearchArgs) -> anyhow::Result<Value> {
    let config = ServiceConfig::from_env()?;
    let transport = HttpTransport::new(ClientConfig::new(config.base_url.clone()))?;
    let service = SearchService::new(config, Registry::builtin(), transport, RetryPolicy::default());

    let request = args.request();
    let result = match args.timeout_secs {
        Some(secs) => {
            service
                .search_with_deadline(&request, Duration::from_secs(secs))
                .await?
        }
        None => service.search(&request).await?,
    };
    Ok(serde_json::to_value(result)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry = observability::init(cli.log_format == LogFormat::Json)?;

    let output = match &cli.command {
        Command::Search(args) => search(args).await?,
        Command::Resources => describe_resources(&Registry::builtin()),
    };

    let rendered = serde_json::to_string_pretty(&output).context("failed to render result")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filters_parse_json_or_fall_back_to_strings() {
        assert_eq!(parse_filter("remote_ok=true").unwrap(), ("remote_ok".into(), json!(true)));
        assert_eq!(parse_filter("tags=[\"a\",\"b\"]").unwrap(), ("tags".into(), json!(["a", "b"])));
        assert_eq!(parse_filter("company=acme").unwrap(), ("company".into(), json!("acme")));
        assert_eq!(parse_filter("keyword=a=b").unwrap(), ("keyword".into(), json!("a=b")));
        assert!(parse_filter("acme").is_err());
        assert!(parse_filter("=acme").is_err());
    }

    #[test]
    fn search_arguments_become_a_request() {
        let cli = Cli::try_parse_from([
            "niceboard", "search", "jobs", "-f", "title", "--field", "company.name", "-F", "remote_ok=true",
            "--display", "show_n", "--limit", "50", "--sample-size", "3",
        ])
        .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };

        let request = args.request();
        assert_eq!(request.resource, ResourceType::Job);
        assert_eq!(request.options.fields, vec!["title", "company.name"]);
        assert_eq!(request.options.filters.get("remote_ok"), Some(&json!(true)));
        assert_eq!(request.options.display, DisplayMode::ShowN);
        assert_eq!(request.options.pagination.limit, Some(50));
        assert_eq!(request.options.pagination.page, None);
        assert_eq!(request.options.sample_size, Some(3));
    }

    #[test]
    fn log_format_is_global_and_defaults_to_text() {
        let cli = Cli::try_parse_from(["niceboard", "resources"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Text);

        let cli = Cli::try_parse_from(["niceboard", "resources", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_resource_and_display_are_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["niceboard", "search", "salaries"]).is_err());
        assert!(Cli::try_parse_from(["niceboard", "search", "jobs", "--display", "everything"]).is_err());
    }

    #[test]
    fn resources_listing_covers_the_builtin_registry() {
        let listing = describe_resources(&Registry::builtin());
        let names: Vec<&str> = listing
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["resource"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["job", "company", "location", "category", "jobtype"]);
        assert_eq!(listing[1]["filters"], json!(["keyword"]));
    }
}
