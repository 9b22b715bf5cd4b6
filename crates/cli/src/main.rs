use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use precis_core::{
    Capture, CaptureSource, CaptureStore, Document, FetchConfig, IgnoreRules, OllamaClient, Settings, SettingsStore,
    capture, fetch_file, fetch_stdin, fetch_url, truncate,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extract the visible text of web pages and summarize it with a local model
#[derive(Parser, Debug)]
#[command(name = "precis")]
#[command(author = "Precis Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Extract visible page text and summarize it with Ollama", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Capture file holding the latest extracted text (default: platform data directory)
    #[arg(long, global = true, value_name = "FILE")]
    capture: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the visible text of a page and store it as the latest capture
    Extract(ExtractArgs),
    /// Summarize a page, or the latest capture, with a system prompt
    Summarize(SummarizeArgs),
    /// Manage saved system prompts
    Prompts {
        #[command(subcommand)]
        action: PromptsCommand,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: Option<String>,

    /// Use this text verbatim instead of extracting the page
    #[arg(long, value_name = "TEXT")]
    selection: Option<String>,

    /// Extra tag to ignore, on top of the configured ones
    #[arg(long = "ignore-tag", value_name = "TAG")]
    ignore_tags: Vec<String>,

    /// Extra CSS selector to ignore, on top of the configured ones
    #[arg(long = "ignore-selector", value_name = "SELECTOR")]
    ignore_selectors: Vec<String>,

    /// HTTP timeout in seconds when fetching a URL
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,
}

impl CaptureArgs {
    fn is_empty(&self) -> bool {
        self.input.is_none() && self.selection.is_none()
    }
}

#[derive(Args, Debug)]
struct ExtractArgs {
    #[command(flatten)]
    source: CaptureArgs,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Do not store the result as the latest capture
    #[arg(long)]
    no_save: bool,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    #[command(flatten)]
    source: CaptureArgs,

    /// Prompt id (default: the default prompt, else the first one)
    #[arg(long, value_name = "ID")]
    prompt: Option<String>,

    /// Ollama host for this run
    #[arg(long, value_name = "URL")]
    host: Option<String>,

    /// Ollama model for this run
    #[arg(long, value_name = "NAME")]
    model: Option<String>,
}

#[derive(Subcommand, Debug)]
enum PromptsCommand {
    /// List saved prompts; the default is marked with *
    List,
    /// Save a new prompt and print its id
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Also make it the default prompt
        #[arg(long)]
        default: bool,
    },
    /// Delete a prompt
    Remove { id: String },
    /// Make a prompt the default
    Default { id: String },
    /// Unset the default prompt
    ClearDefault,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the current settings
    Show,
    /// Set one of: host, model, ignore-tags, ignore-selectors
    Set { key: String, value: String },
    /// Restore default host, model and ignore lists (prompts are kept)
    Reset,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "precis=debug,precis_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn settings_store(cli: &Cli) -> anyhow::Result<SettingsStore> {
    match &cli.settings {
        Some(path) => Ok(SettingsStore::new(path.clone())),
        None => SettingsStore::default_location().context("Failed to locate settings file"),
    }
}

fn capture_store(cli: &Cli) -> anyhow::Result<CaptureStore> {
    match &cli.capture {
        Some(path) => Ok(CaptureStore::new(path.clone())),
        None => CaptureStore::default_location().context("Failed to locate capture file"),
    }
}

fn web_url(input: &str) -> Option<Url> {
    Url::parse(input).ok().filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Reads the page named by `input` and returns it with the URL it came from.
async fn read_page(input: &str, timeout: u64, verbose: bool) -> anyhow::Result<(String, Option<String>)> {
    if input == "-" {
        if verbose {
            echo::print_step(1, 3, "Reading from stdin");
        }
        let html = fetch_stdin().context("Failed to read from stdin")?;
        return Ok((html, None));
    }

    if let Some(url) = web_url(input) {
        if verbose {
            echo::print_step(1, 3, &format!("Fetching from {}", input.bright_white().underline()));
        }
        debug!(url = %url, timeout, "fetching page");
        let config = FetchConfig { timeout, ..Default::default() };
        let html = fetch_url(url.as_str(), &config).await.context("Failed to fetch URL")?;
        return Ok((html, Some(url.to_string())));
    }

    if verbose {
        echo::print_step(1, 3, &format!("Reading from file {}", input.bright_white()));
    }
    let html = fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?;
    let source_url = fs::canonicalize(input).ok().and_then(|path| Url::from_file_path(path).ok()).map(String::from);
    Ok((html, source_url))
}

async fn run_capture(args: &CaptureArgs, settings: &Settings, verbose: bool) -> anyhow::Result<Capture> {
    let rules = args.ignore_tags.iter().fold(settings.ignore_rules(), |rules, tag| rules.with_tag(tag));
    let rules: IgnoreRules = args.ignore_selectors.iter().fold(rules, |rules, selector| rules.with_selector(selector));

    if let Some(text) = &args.selection {
        if verbose {
            echo::print_step(1, 3, "Using selected text");
        }
        let url = args.input.as_deref().and_then(web_url).map(String::from);
        return Ok(capture(CaptureSource::Selection { text: text.clone(), url, title: None }, &rules));
    }

    let input = args.input.as_deref().context("INPUT or --selection is required")?;
    let (html, url) = read_page(input, args.timeout, verbose).await?;

    if verbose {
        echo::print_detail("Size", &echo::format_size(html.len()));
        echo::print_step(2, 3, "Extracting visible text");
        echo::print_detail("Ignored tags", &rules.tags().join(", "));
        if !rules.selectors().is_empty() {
            echo::print_detail("Ignored selectors", &rules.selectors().join(", "));
        }
    }

    let doc = Document::parse(&html);
    debug!(bytes = html.len(), rules = doc.stylesheet().len(), "parsed page");
    let captured = capture(CaptureSource::Page { document: &doc, url }, &rules);
    info!(chars = captured.extracted_text.chars().count(), placeholder = captured.is_placeholder(), "captured text");

    if verbose {
        if let Some(title) = &captured.source_title {
            echo::print_detail("Title", title);
        }
        echo::print_detail("Characters", &captured.extracted_text.chars().count().to_string());
    }

    Ok(captured)
}

async fn extract(cli: &Cli, args: &ExtractArgs) -> anyhow::Result<()> {
    let settings = settings_store(cli)?.load().context("Failed to load settings")?;
    let captured = run_capture(&args.source, &settings, cli.verbose).await?;

    if captured.is_placeholder() {
        echo::print_warning("No visible text found on this page");
    }

    if args.no_save {
        if cli.verbose {
            echo::print_step(3, 3, "Skipping capture store");
        }
    } else {
        let store = capture_store(cli)?;
        if cli.verbose {
            echo::print_step(3, 3, &format!("Saving capture to {}", store.path().display()));
        }
        store.save(&captured).context("Failed to save capture")?;
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &captured.extracted_text)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", captured.extracted_text),
    }

    Ok(())
}

async fn summarize(cli: &Cli, args: &SummarizeArgs) -> anyhow::Result<()> {
    let settings = settings_store(cli)?.load().context("Failed to load settings")?;
    let prompt = settings.prompts.resolve(args.prompt.as_deref()).context("No system prompt to summarize with")?;

    let store = capture_store(cli)?;
    let captured = if args.source.is_empty() {
        store.load().context("Failed to read capture")?.unwrap_or_default()
    } else {
        let captured = run_capture(&args.source, &settings, cli.verbose).await?;
        store.save(&captured).context("Failed to save capture")?;
        captured
    };

    if captured.extracted_text.trim().is_empty() {
        echo::print_warning("No capture stored; summarizing the placeholder text");
    }

    let host = args.host.as_deref().unwrap_or(&settings.ollama_host);
    let model = args.model.as_deref().unwrap_or(&settings.ollama_model);
    let client = OllamaClient::new(host, model).context("Failed to create Ollama client")?;

    if cli.verbose {
        echo::print_step(3, 3, &format!("Summarizing with {}", client.model().bright_white()));
        echo::print_detail("Prompt", &prompt.title);
        echo::print_detail("Host", client.host());
    }

    info!(model = client.model(), host = client.host(), prompt = %prompt.id, "summarizing capture");
    let summary = tokio::select! {
        result = client.generate(captured.text_or_placeholder(), &prompt.content) => {
            result.context("Summarization failed")?
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("summarization interrupted");
            echo::print_warning("Stopped.");
            std::process::exit(130);
        }
    };

    println!("{}", summary);
    Ok(())
}

fn prompts(cli: &Cli, action: &PromptsCommand) -> anyhow::Result<()> {
    let store = settings_store(cli)?;
    let mut settings = store.load().context("Failed to load settings")?;

    match action {
        PromptsCommand::List => {
            if settings.prompts.is_empty() {
                echo::print_info("No prompts saved. Add one with `precis prompts add`.");
                return Ok(());
            }
            let default_id = settings.prompts.default_id();
            for prompt in settings.prompts.prompts() {
                let marker = if Some(prompt.id.as_str()) == default_id { "*" } else { " " };
                println!(
                    "{} {}  {}  {}",
                    marker.green(),
                    prompt.id.dimmed(),
                    prompt.title.bold(),
                    truncate(&prompt.content, 60)
                );
            }
            return Ok(());
        }
        PromptsCommand::Add { title, content, default } => {
            let id = settings.prompts.add(title, content)?.id.clone();
            if *default {
                settings.prompts.set_default(&id)?;
            }
            println!("{}", id);
        }
        PromptsCommand::Remove { id } => {
            let removed = settings.prompts.remove(id)?;
            echo::print_success(&format!("Removed prompt \"{}\"", removed.title));
        }
        PromptsCommand::Default { id } => {
            settings.prompts.set_default(id)?;
            echo::print_success(&format!("Default prompt set to {}", id));
        }
        PromptsCommand::ClearDefault => {
            settings.prompts.clear_default();
            echo::print_success("Default prompt cleared");
        }
    }

    store.save(&settings).context("Failed to save settings")
}

fn config(cli: &Cli, action: &ConfigCommand) -> anyhow::Result<()> {
    let store = settings_store(cli)?;
    let mut settings = store.load().context("Failed to load settings")?;

    match action {
        ConfigCommand::Show => {
            println!("settings: {}", store.path().display());
            println!("host: {}", settings.ollama_host);
            println!("model: {}", settings.ollama_model);
            println!("ignore-tags: {}", settings.ignore_tags.join(", "));
            println!("ignore-selectors: {}", settings.ignore_selectors.join(", "));
            println!("prompts: {}", settings.prompts.len());
            return Ok(());
        }
        ConfigCommand::Set { key, value } => {
            settings.set(key, value)?;
            echo::print_success(&format!("Set {}", key));
        }
        ConfigCommand::Reset => {
            settings = Settings { prompts: settings.prompts, ..Settings::default() };
            echo::print_success("Settings restored to defaults");
        }
    }

    store.save(&settings).context("Failed to save settings")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let result = match &cli.command {
        Command::Extract(args) => extract(&cli, args).await,
        Command::Summarize(args) => summarize(&cli, args).await,
        Command::Prompts { action } => prompts(&cli, action),
        Command::Config { action } => config(&cli, action),
        Command::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "precis", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(err) = result {
        echo::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}
