use anyhow::{Context, Result, anyhow};
use clap::Parser;
use clap::builder::BoolishValueParser;
use datacite::runtime::{RealRuntime, Runtime};
use datacite::{ClientConfig, DataCiteClient, Metadata};
use log::warn;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// datacite - DataCite REST API client
///
/// Create, publish, register, hide and resolve DOIs.
///
/// Credentials are read from the DATACITE_USER and DATACITE_PW environment variables.
///
/// Examples:
///   datacite --test-mode draft          # Create a draft DOI with a random suffix
///   datacite resolve 10.5072/abc        # Print the URL a DOI resolves to
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// DataCite API URL (defaults to https://api.datacite.org/; also via DATACITE_URL)
    #[arg(long = "api-url", env = "DATACITE_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Use the DataCite test endpoint (also via DATACITE_TEST_MODE)
    #[arg(
        long = "test-mode",
        env = "DATACITE_TEST_MODE",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub test_mode: bool,

    /// DOI prefix owned by the account (also via DATACITE_PREFIX)
    #[arg(long, env = "DATACITE_PREFIX", value_name = "PREFIX", global = true)]
    pub prefix: Option<String>,

    /// Request timeout in seconds (also via DATACITE_TIMEOUT)
    #[arg(long, env = "DATACITE_TIMEOUT", value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the URL a DOI resolves to
    Resolve(DoiArgs),

    /// Print the full DOI record as JSON
    Show(DoiArgs),

    /// Create a draft DOI (random suffix when none is given)
    Draft(OptionalDoiArgs),

    /// Change the URL a DOI resolves to
    SetUrl(SetUrlArgs),

    /// Publish a findable DOI
    Publish(MetadataArgs),

    /// Register a DOI that is not listed in DataCite Search
    Register(MetadataArgs),

    /// Hide a findable DOI from DataCite Search
    Hide(DoiArgs),

    /// Check a DOI against the configured prefix and print its normalized form
    Validate(DoiArgs),
}

#[derive(clap::Args, Debug)]
pub struct DoiArgs {
    /// DOI, e.g. "10.5072/abc" or a bare suffix
    #[arg(value_name = "DOI")]
    pub doi: String,
}

#[derive(clap::Args, Debug)]
pub struct OptionalDoiArgs {
    #[arg(value_name = "DOI")]
    pub doi: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetUrlArgs {
    #[arg(value_name = "DOI")]
    pub doi: String,

    #[arg(value_name = "URL")]
    pub url: String,
}

#[derive(clap::Args, Debug)]
pub struct MetadataArgs {
    /// JSON file with DataCite metadata attributes
    #[arg(long, short = 'm', value_name = "FILE")]
    pub metadata: PathBuf,

    #[arg(value_name = "DOI")]
    pub doi: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    if let Some(output) = run(&runtime, cli).await? {
        println!("{}", output);
    }
    Ok(())
}

/// Executes one command and returns what should be printed, if anything.
async fn run<R: Runtime>(runtime: &R, cli: Cli) -> Result<Option<String>> {
    // Validation is local, so it works without credentials
    let needs_credentials = !matches!(cli.command, Commands::Validate(_));
    let client = DataCiteClient::new(build_config(runtime, &cli, needs_credentials)?)?;

    let output = match cli.command {
        Commands::Resolve(args) => {
            let url = client.resolve(&args.doi).await?;
            if url.is_none() {
                warn!("{} has no URL yet", args.doi);
            }
            return Ok(url);
        }
        Commands::Show(args) => {
            let record = client.get_doi(&args.doi).await?;
            serde_json::to_string_pretty(&record)?
        }
        Commands::Draft(args) => client.create_draft(args.doi.as_deref()).await?.to_string(),
        Commands::SetUrl(args) => client.set_url(&args.doi, &args.url).await?,
        Commands::Publish(args) => {
            let metadata = load_metadata(runtime, &args.metadata)?;
            client
                .publish(metadata, args.doi.as_deref())
                .await?
                .to_string()
        }
        Commands::Register(args) => {
            let metadata = load_metadata(runtime, &args.metadata)?;
            client
                .register_private(metadata, args.doi.as_deref())
                .await?
                .to_string()
        }
        Commands::Hide(args) => client.hide(&args.doi).await?.to_string(),
        Commands::Validate(args) => client.validate_identifier(&args.doi)?,
    };

    Ok(Some(output))
}

fn build_config<R: Runtime>(
    runtime: &R,
    cli: &Cli,
    needs_credentials: bool,
) -> Result<ClientConfig> {
    let credential = |key: &str| -> Result<String> {
        match runtime.env_var(key) {
            Ok(value) => Ok(value),
            Err(_) if !needs_credentials => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("{} is not set", key)),
        }
    };

    let prefix = cli
        .prefix
        .clone()
        .ok_or_else(|| anyhow!("No DOI prefix given. Use --prefix or set DATACITE_PREFIX."))?;

    let mut config = ClientConfig::new(
        credential("DATACITE_USER")?,
        credential("DATACITE_PW")?,
        prefix,
    );
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.clone());
    }
    config = config.with_test_mode(cli.test_mode);
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

fn load_metadata<R: Runtime>(runtime: &R, path: &Path) -> Result<Metadata> {
    let content = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read metadata file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Metadata file {} is not a JSON object", path.display()))
}
