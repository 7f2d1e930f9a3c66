use clap::{Parser, Subcommand};
use snapsite::config::{self, CONFIG_FILE, SiteConfig};
use snapsite::output;
use snapsite::storage::OsStorage;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::LazyLock;
use tracing_subscriber::EnvFilter;

/// `1.2.0` on a release tag, `1.2.0-dev+<hash>` otherwise.
static VERSION: LazyLock<String> = LazyLock::new(|| {
    let version = env!("CARGO_PKG_VERSION");
    match (env!("SNAPSITE_RELEASE_TAG"), env!("SNAPSITE_GIT_HASH")) {
        ("true", _) => version.to_string(),
        (_, "") => format!("{version}-dev"),
        (_, hash) => format!("{version}-dev+{hash}"),
    }
});

#[derive(Parser)]
#[command(name = "snapsite")]
#[command(about = "Static content build pipeline")]
#[command(long_about = "\
Static content build pipeline

Reads a source tree into memory, passes it through an ordered list of
stages, and writes the result to a destination tree.

  source/                       public/
  ├── index.html           →    ├── index.html
  ├── about.md             →    ├── about.html      (markdown + layout)
  ├── drafts/wip.md             │                   (draft: true → dropped)
  └── css/site.css         →    └── css/site.css    (minified, same permissions)

Any file may start with a YAML frontmatter block:

  ---
  title: About
  draft: false
  ---
  # About this site

Run 'snapsite gen-config' to generate a documented snapsite.toml.")]
#[command(version = VERSION.as_str())]
struct Cli {
    /// Config file
    #[arg(long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Source directory (overrides config)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Destination directory (overrides config)
    #[arg(long, global = true)]
    destination: Option<PathBuf>,

    /// Log per-file detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: read → stages → write
    Build {
        /// Empty the destination before writing
        #[arg(long)]
        clean: bool,
    },
    /// Read and run stages without writing, then list the result
    Check {
        /// Print the collection as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock snapsite.toml with all options documented
    GenConfig,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "snapsite=debug" } else { "snapsite=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut config = config::load_config(&cli.config)?;
    if let Some(source) = &cli.source {
        config.source = source.clone();
    }
    if let Some(destination) = &cli.destination {
        config.destination = destination.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Command::Build { clean } => {
            let mut config = load(cli)?;
            config.clean |= *clean;
            let mut pipeline = config.pipeline(OsStorage)?;

            println!(
                "==> Building {} → {}",
                config.source.display(),
                config.destination.display()
            );
            let report = pipeline.build()?;
            output::print_build_report(&report, &config.destination);
        }
        Command::Check { json } => {
            let config = load(cli)?;
            let mut pipeline = config.pipeline(OsStorage)?;

            pipeline.read()?;
            pipeline.run_stages()?;
            if *json {
                println!("{}", output::format_collection_json(pipeline.files())?);
            } else {
                println!("==> Checking {}", config.source.display());
                output::print_collection(pipeline.files());
                println!("==> Content is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut cause = err.source();
            while let Some(inner) = cause {
                eprintln!("  caused by: {inner}");
                cause = inner.source();
            }
            ExitCode::FAILURE
        }
    }
}
