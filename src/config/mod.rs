//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "canastra";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SITE_BASE_URL: &str = "https://cafecanastra.com.br/";
const DEFAULT_GENERATOR_PRODUCTION_URL: &str =
    "https://autopilot.cafecanastra.com.br/webhook/gerar-post";
const DEFAULT_GENERATOR_TEST_URL: &str =
    "https://autopilot.cafecanastra.com.br/webhook-test/gerar-post";
const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECONCILE_CADENCE_SECS: u64 = 300;
const DEFAULT_UPLOAD_BUCKET: &str = "imagens-blog";

/// Command-line arguments for the Canastra binary.
#[derive(Debug, Parser)]
#[command(name = "canastra", version, about = "Canastra content service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CANASTRA_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the managed store base URL.
    #[arg(long = "store-url", env = "CANASTRA_STORE_URL", value_name = "URL")]
    pub store_url: Option<String>,

    /// Override the managed store service key.
    #[arg(long = "store-key", env = "CANASTRA_STORE_KEY", value_name = "KEY")]
    pub store_key: Option<String>,

    /// Override the production generator endpoint.
    #[arg(long = "generator-production-url", value_name = "URL")]
    pub generator_production_url: Option<String>,

    /// Override the test generator endpoint.
    #[arg(long = "generator-test-url", value_name = "URL")]
    pub generator_test_url: Option<String>,

    /// Override the upstream request timeout in seconds.
    #[arg(long = "generator-timeout-seconds", value_name = "SECONDS")]
    pub generator_timeout_seconds: Option<u64>,

    /// Override the schedule-config reconciliation cadence.
    #[arg(long = "schedule-reconcile-seconds", value_name = "SECONDS")]
    pub schedule_reconcile_seconds: Option<u64>,

    /// Override the public site base URL used for canonical links.
    #[arg(long = "site-base-url", value_name = "URL")]
    pub site_base_url: Option<String>,

    /// Override the admin bearer token.
    #[arg(long = "admin-token", env = "CANASTRA_ADMIN_TOKEN", value_name = "TOKEN")]
    pub admin_token: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
    pub generators: GeneratorSettings,
    pub schedule: ScheduleSettings,
    pub site: SiteSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Managed-store credentials. Both absent → the store runs degraded:
/// every operation becomes a logged no-op so local development works
/// without a configured backend.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub url: Option<Url>,
    pub key: Option<String>,
    pub upload_bucket: String,
}

impl StoreSettings {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub production_url: Url,
    pub test_url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub reconcile_cadence: Duration,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_url: Url,
}

#[derive(Debug, Clone)]
pub struct AdminSettings {
    pub token: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("CANASTRA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
    generators: RawGeneratorSettings,
    schedule: RawScheduleSettings,
    site: RawSiteSettings,
    admin: RawAdminSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.store_url.as_ref() {
            self.store.url = Some(url.clone());
        }
        if let Some(key) = overrides.store_key.as_ref() {
            self.store.key = Some(key.clone());
        }
        if let Some(url) = overrides.generator_production_url.as_ref() {
            self.generators.production_url = Some(url.clone());
        }
        if let Some(url) = overrides.generator_test_url.as_ref() {
            self.generators.test_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.generator_timeout_seconds {
            self.generators.request_timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.schedule_reconcile_seconds {
            self.schedule.reconcile_cadence_seconds = Some(seconds);
        }
        if let Some(url) = overrides.site_base_url.as_ref() {
            self.site.base_url = Some(url.clone());
        }
        if let Some(token) = overrides.admin_token.as_ref() {
            self.admin.token = Some(token.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            store,
            generators,
            schedule,
            site,
            admin,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            store: build_store_settings(store)?,
            generators: build_generator_settings(generators)?,
            schedule: build_schedule_settings(schedule)?,
            site: build_site_settings(site)?,
            admin: build_admin_settings(admin),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let candidate = format!("{host}:{port}");
    let addr = candidate
        .parse()
        .map_err(|err| LoadError::invalid("server.addr", format!("invalid `{candidate}`: {err}")))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let url = match non_empty(store.url) {
        Some(value) => Some(
            Url::parse(&value)
                .map_err(|err| LoadError::invalid("store.url", format!("invalid URL: {err}")))?,
        ),
        None => None,
    };

    Ok(StoreSettings {
        url,
        key: non_empty(store.key),
        upload_bucket: store
            .upload_bucket
            .unwrap_or_else(|| DEFAULT_UPLOAD_BUCKET.to_string()),
    })
}

fn build_generator_settings(
    generators: RawGeneratorSettings,
) -> Result<GeneratorSettings, LoadError> {
    let production_url = generators
        .production_url
        .unwrap_or_else(|| DEFAULT_GENERATOR_PRODUCTION_URL.to_string());
    let production_url = Url::parse(&production_url).map_err(|err| {
        LoadError::invalid("generators.production_url", format!("invalid URL: {err}"))
    })?;

    let test_url = generators
        .test_url
        .unwrap_or_else(|| DEFAULT_GENERATOR_TEST_URL.to_string());
    let test_url = Url::parse(&test_url)
        .map_err(|err| LoadError::invalid("generators.test_url", format!("invalid URL: {err}")))?;

    let timeout_secs = generators
        .request_timeout_seconds
        .unwrap_or(DEFAULT_GENERATOR_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "generators.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(GeneratorSettings {
        production_url,
        test_url,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_schedule_settings(schedule: RawScheduleSettings) -> Result<ScheduleSettings, LoadError> {
    let cadence_seconds = schedule
        .reconcile_cadence_seconds
        .unwrap_or(DEFAULT_RECONCILE_CADENCE_SECS);
    if cadence_seconds == 0 {
        return Err(LoadError::invalid(
            "schedule.reconcile_cadence_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ScheduleSettings {
        reconcile_cadence: Duration::from_secs(cadence_seconds),
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let base_url = site
        .base_url
        .unwrap_or_else(|| DEFAULT_SITE_BASE_URL.to_string());
    let base_url = Url::parse(&base_url)
        .map_err(|err| LoadError::invalid("site.base_url", format!("invalid URL: {err}")))?;

    Ok(SiteSettings { base_url })
}

fn build_admin_settings(admin: RawAdminSettings) -> AdminSettings {
    AdminSettings {
        token: non_empty(admin.token),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    url: Option<String>,
    key: Option<String>,
    upload_bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGeneratorSettings {
    production_url: Option<String>,
    test_url: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawScheduleSettings {
    reconcile_cadence_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdminSettings {
    token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn missing_store_credentials_mean_degraded_mode() {
        let raw = RawSettings::default();
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(!settings.store.is_configured());
    }

    #[test]
    fn blank_store_key_reads_as_absent() {
        let mut raw = RawSettings::default();
        raw.store.url = Some("https://abc.supabase.co".to_string());
        raw.store.key = Some("   ".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.store.url.is_some());
        assert!(settings.store.key.is_none());
        assert!(!settings.store.is_configured());
    }

    #[test]
    fn generator_endpoints_default_to_the_fixed_urls() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(
            settings.generators.production_url.as_str(),
            DEFAULT_GENERATOR_PRODUCTION_URL
        );
        assert_eq!(
            settings.generators.test_url.as_str(),
            DEFAULT_GENERATOR_TEST_URL
        );
        assert_eq!(
            settings.generators.request_timeout,
            Duration::from_secs(DEFAULT_GENERATOR_TIMEOUT_SECS)
        );
    }

    #[test]
    fn zero_reconcile_cadence_is_rejected() {
        let mut raw = RawSettings::default();
        raw.schedule.reconcile_cadence_seconds = Some(0);

        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key, .. }) if key == "schedule.reconcile_cadence_seconds"
        ));
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "canastra",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--store-url",
            "https://abc.supabase.co",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.store_url.as_deref(),
                    Some("https://abc.supabase.co")
                );
            }
        }
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["canastra"]);
        assert!(args.command.is_none());
    }
}
