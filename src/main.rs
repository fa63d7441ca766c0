//! Darkroom CLI
//!
//! Renders vault images through the filters named in an alt-text string and
//! manages the cache directory.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use darkroom::core::descriptor::is_remote_location;
use darkroom::prelude::*;
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "darkroom", version, about = "Alt-text driven image filters with a disk cache")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Vault root (overrides the configuration)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Cache directory relative to the vault root (overrides the configuration)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Render images (vault-relative glob patterns or http(s) URLs)
    Render {
        /// Images to render
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Annotation text containing the directives
        #[arg(long)]
        alt: String,
        /// Target theme: dark or light
        #[arg(long)]
        theme: Option<Theme>,
    },
    /// Show how an annotation is parsed
    Parse {
        /// Annotation text
        text: String,
    },
    /// List registered filters
    Filters,
    /// Remove cache entries
    Clear {
        /// Only remove entries for this source
        #[arg(long)]
        file: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Save it to the --config file
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    init_logging(config.debug);
    log::debug!("[cli] {:?}", config);

    match cli.command {
        Cmd::Render {
            patterns,
            alt,
            theme,
        } => cmd_render(&config, &patterns, &alt, theme),
        Cmd::Parse { text } => cmd_parse(&text),
        Cmd::Filters => {
            cmd_filters();
            Ok(())
        }
        Cmd::Clear { file } => cmd_clear(&config, file.as_deref()),
        Cmd::Config { write } => cmd_config(&config, cli.config.as_ref(), write),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => TomlConfigStore::new(path)
            .load()
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(vault) = &cli.vault {
        config.vault_root = vault.clone();
    }
    if let Some(cache_dir) = &cli.cache_dir {
        config.cache_dir = cache_dir.clone();
    }
    config.debug |= cli.debug;
    Ok(config)
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn renderer(config: &Config) -> Renderer<VaultProvider> {
    Renderer::new(
        FilterRegistry::with_builtins(),
        ImageCache::new(&config.vault_root, &config.cache_dir),
        VaultProvider::new(&config.vault_root),
    )
}

/// Expand patterns into descriptors. Local patterns are globbed relative to
/// the vault root.
fn resolve_sources(config: &Config, patterns: &[String]) -> Result<Vec<SourceDescriptor>> {
    let mut sources = Vec::new();
    for pattern in patterns {
        if is_remote_location(pattern) {
            sources.push(SourceDescriptor::remote(pattern));
            continue;
        }

        let full = config.vault_root.join(pattern);
        let full = full.to_str().context("pattern is not valid UTF-8")?;
        let mut matched = false;
        for entry in glob::glob(full).with_context(|| format!("bad pattern '{}'", pattern))? {
            let path = entry?;
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(&config.vault_root).unwrap_or(&path);
            let relative = relative.to_str().context("path is not valid UTF-8")?;
            sources.push(SourceDescriptor::local(&config.vault_root, relative)?);
            matched = true;
        }
        if !matched {
            log::warn!("[cli] no files match '{}'", pattern);
        }
    }
    Ok(sources)
}

fn cmd_render(config: &Config, patterns: &[String], alt: &str, theme: Option<Theme>) -> Result<()> {
    let sources = resolve_sources(config, patterns)?;
    if sources.is_empty() {
        bail!("nothing to render");
    }

    let renderer = renderer(config);
    let results: Vec<_> = sources
        .par_iter()
        .map(|source| (source, renderer.render(source, alt, theme)))
        .collect();

    let mut failed = 0;
    for (source, result) in results {
        match result {
            Ok(Rendered::NoFilters) => println!("{} -> (no filters)", source),
            Ok(Rendered::Cached(path)) => println!("{} -> {} (cached)", source, path.display()),
            Ok(Rendered::Created(path)) => println!("{} -> {}", source, path.display()),
            Err(e) => {
                let hint = if e.is_transient() { " (may succeed on retry)" } else { "" };
                eprintln!("{} -> failed: {}{}", source, e, hint);
                failed += 1;
            }
        }
    }

    let stats = renderer.cache().stats();
    log::debug!("[cli] cache hit ratio {:.2}", stats.hit_ratio());

    if failed > 0 {
        bail!("{} of {} renders failed", failed, sources.len());
    }
    Ok(())
}

fn cmd_parse(text: &str) -> Result<()> {
    let parser = DirectiveParser::new();
    let output = parser.parse_with_diagnostics(text);
    println!("{}", serde_json::to_string_pretty(&output.specs)?);

    for diagnostic in &output.diagnostics {
        eprintln!("skipped: {}", diagnostic);
    }

    let registry = FilterRegistry::with_builtins();
    for signature in parser.resolve(&output.specs, &registry).signatures() {
        println!("{}", signature);
    }
    Ok(())
}

fn cmd_filters() {
    let registry = FilterRegistry::with_builtins();
    println!("Available filters ({} total):", registry.len());
    for name in registry.names() {
        println!("  {}", name);
    }
    for (alias, target) in registry.aliases() {
        println!("  {} (alias of {})", alias, target);
    }
}

fn cmd_clear(config: &Config, file: Option<&str>) -> Result<()> {
    let renderer = renderer(config);
    let removed = match file {
        Some(location) if is_remote_location(location) => {
            renderer.invalidate(&SourceDescriptor::remote(location))
        }
        // The source may already be gone; only its identity matters here.
        Some(location) => renderer.invalidate(&SourceDescriptor::new(location, location, location, 0)),
        None => renderer.clear_entire_cache(),
    };
    println!("Removed {} cache entries", removed);
    Ok(())
}

fn cmd_config(config: &Config, path: Option<&PathBuf>, write: bool) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    if write {
        let Some(path) = path else {
            bail!("--write needs --config <FILE>");
        };
        TomlConfigStore::new(path).save(config)?;
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}
