//! Plugin Registry - plugin lookup service
//!
//! Serves repository URLs, manifests and READMEs for registered plugins.

use clap::{Parser, Subcommand};
use plugin_registry::config::{self, AppConfig, CONFIG_DIR};
use plugin_registry::fetcher::{BranchFetcher, HttpTransport};
use plugin_registry::registry::Registry;
use plugin_registry::repo::classify;
use plugin_registry::resolver::{ManifestLookup, Resolver};
use plugin_registry::server;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plugin-registry")]
#[command(author, version, about = "Plugin registry lookup service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration, registry and page templates
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Start the registry server
    Start {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Registry JSON file (overrides config)
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Show current configuration
    Config,

    /// Check configuration, registry and page templates
    Doctor,

    /// Resolve a single plugin and print its manifest (or README)
    Lookup {
        /// Plugin id
        plugin: String,

        /// Print the README instead of the manifest
        #[arg(long)]
        readme: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "plugin_registry=debug,tower_http=debug"
    } else {
        "plugin_registry=info,tower_http=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Init { force } => cmd_init(force),
        Commands::Start {
            port,
            host,
            registry,
        } => cmd_start(port, host, registry).await,
        Commands::Config => cmd_config(),
        Commands::Doctor => cmd_doctor(),
        Commands::Lookup { plugin, readme } => cmd_lookup(&plugin, readme).await,
    }
}

const DEFAULT_CONFIG: &str = r#"# Plugin Registry Configuration

server:
  port: 8080
  host: "0.0.0.0"

registry:
  path: registry.json

pages:
  index: index.html
  plugin: plugin.html  # "{plugin_name}" is replaced with the requested plugin

fetch:
  github_raw_base: https://raw.githubusercontent.com
"#;

const EXAMPLE_REGISTRY: &str = r#"{
  "hello-world": "https://github.com/acme/hello-world"
}
"#;

const EXAMPLE_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><title>Plugins</title></head>
<body>
  <h1>Plugins</h1>
  <input id="q" placeholder="Search plugins">
  <ul id="results"></ul>
  <script>
    document.getElementById("q").addEventListener("input", async (e) => {
      const ids = await (await fetch("/api/search/" + encodeURIComponent(e.target.value))).json();
      document.getElementById("results").innerHTML =
        ids.map((id) => `<li><a href="/plugin/${id}">${id}</a></li>`).join("");
    });
  </script>
</body>
</html>
"#;

const EXAMPLE_PLUGIN: &str = r#"<!DOCTYPE html>
<html>
<head><title>Plugin</title></head>
<body>
  <h1 id="name"></h1>
  <pre id="info"></pre>
  <pre id="readme"></pre>
  <script>
    const plugin = "{plugin_name}";
    document.getElementById("name").textContent = plugin;
    fetch("/api/info/" + plugin).then((r) => r.text()).then((t) => {
      document.getElementById("info").textContent = t;
    });
    fetch("/api/readme/" + plugin).then((r) => r.text()).then((t) => {
      document.getElementById("readme").textContent = t;
    });
  </script>
</body>
</html>
"#;

/// Write `content` to `path` unless it exists (or `force` is set)
fn write_file(path: &Path, content: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        info!("Keeping existing {}", path.display());
        return Ok(());
    }
    fs::write(path, content)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Initialize configuration and example files
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_dir = PathBuf::from(CONFIG_DIR);
    let config_file = config_dir.join("config.yaml");

    if config_file.exists() && !force {
        error!("Configuration already exists. Use --force to overwrite.");
        return Ok(());
    }

    fs::create_dir_all(&config_dir)?;
    write_file(&config_file, DEFAULT_CONFIG, force)?;
    write_file(Path::new("registry.json"), EXAMPLE_REGISTRY, force)?;
    write_file(Path::new("index.html"), EXAMPLE_INDEX, force)?;
    write_file(Path::new("plugin.html"), EXAMPLE_PLUGIN, force)?;

    println!("Plugin registry initialized.");
    println!("  Edit registry.json to register plugins, then run: plugin-registry start");
    Ok(())
}

async fn cmd_start(
    port: Option<u16>,
    host: Option<String>,
    registry: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = config::load_config()?;

    // Apply command-line overrides
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(r) = registry {
        config.registry.path = r;
    }

    info!("Plugin registry v{} starting...", env!("CARGO_PKG_VERSION"));
    server::start_server(config).await
}

/// Show current configuration
fn cmd_config() -> anyhow::Result<()> {
    match config::load_config() {
        Ok(config) => {
            println!("Plugin Registry Configuration\n");
            print!("{}", serde_yaml::to_string(&config)?);
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            info!("Run 'plugin-registry init' to create a configuration file.");
        }
    }
    Ok(())
}

/// Check that everything the server needs at startup is in place
fn cmd_doctor() -> anyhow::Result<()> {
    println!("Plugin Registry Doctor\n");

    print!("Configuration... ");
    let config = match config::load_config() {
        Ok(config) => {
            println!("OK");
            config
        }
        Err(e) => {
            println!("FAILED: {}", e);
            println!("\nRun 'plugin-registry init' to create a configuration file.");
            return Ok(());
        }
    };

    print!("Index page ({})... ", config.pages.index.display());
    check_page(&config.pages.index);
    print!("Plugin page ({})... ", config.pages.plugin.display());
    check_page(&config.pages.plugin);

    print!("Registry ({})... ", config.registry.path.display());
    match Registry::load(&config.registry.path) {
        Ok(registry) => {
            println!("OK ({} plugins)", registry.len());
            let mut invalid = 0;
            for (id, url) in registry.iter() {
                if let Err(e) = classify(url) {
                    invalid += 1;
                    println!("  {}: {}", id, e);
                }
            }
            if invalid == 0 {
                println!("  All repository URLs are valid");
            } else {
                println!("  {} invalid repository URL(s)", invalid);
            }
        }
        Err(e) => println!("FAILED: {}", e),
    }

    Ok(())
}

fn check_page(path: &Path) {
    if path.is_file() {
        println!("OK");
    } else {
        println!("NOT FOUND");
    }
}

/// Resolve one plugin from the command line
async fn cmd_lookup(plugin: &str, readme: bool) -> anyhow::Result<()> {
    let config = config::load_config()?;
    let resolver = build_resolver(&config)?;

    if readme {
        println!("{}", resolver.resolve_readme(plugin).await);
        return Ok(());
    }

    match resolver.resolve_manifest(plugin).await {
        ManifestLookup::Manifest(manifest) => {
            println!("{}", serde_json::to_string_pretty(&manifest)?)
        }
        ManifestLookup::Message(message) => println!("{}", message),
    }
    Ok(())
}

fn build_resolver(config: &AppConfig) -> anyhow::Result<Resolver> {
    let registry = Arc::new(Registry::load(&config.registry.path)?);
    let transport = Arc::new(HttpTransport::new(&config.fetch.user_agent)?);
    let fetcher = BranchFetcher::new(transport).with_github_raw_base(&config.fetch.github_raw_base);
    Ok(Resolver::new(registry, fetcher))
}
