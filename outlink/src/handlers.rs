use anyhow::{Context, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use outlink_core::config::{self, CrawlConfig, DATABASE_FILE, derive_self_domain};
use outlink_core::crawl::{CrawlOptions, execute_crawl, load_blocklist};
use outlink_core::data::Database;
use outlink_core::report::{
    ReportFormat, gather_report_data, generate_json_report, generate_text_report, save_report,
};
use outlink_scanner::{
    Frontier, FrontierStats, HttpFetcher, MatchPolicy, PageOutcome, StopHandle,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

// Helper functions for crawl handler

/// Load seeds from either a file or the `--url` arguments
pub fn load_urls_from_source(
    urls: &[Url],
    seeds_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(seeds_file_path) = seeds_file {
        load_urls_from_file(seeds_file_path)
    } else if !urls.is_empty() {
        Ok(urls.iter().map(|url| url.as_str().to_string()).collect())
    } else {
        Err("Either --url or --seeds-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read seeds file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && url.host_str().is_some()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some_and(|host| !host.contains(' '))
    {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

fn data_dir(args: &ArgMatches) -> PathBuf {
    let raw = args
        .get_one::<String>("data-dir")
        .map(String::as_str)
        .unwrap_or(config::DEFAULT_CONFIG_DIR);
    config::expand_path(Path::new(raw))
}

/// Build the crawl configuration from an optional JSON file overlaid with
/// command-line flags.
pub fn build_crawl_config(args: &ArgMatches) -> anyhow::Result<CrawlConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => CrawlConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CrawlConfig::default(),
    };

    // An explicit data dir wins over the file; the default only fills in
    // when the file did not name its own paths.
    if args.value_source("data-dir") == Some(clap::parser::ValueSource::CommandLine)
        || args.get_one::<PathBuf>("config").is_none()
    {
        config = config.with_data_dir(&data_dir(args));
    }

    let urls: Vec<Url> = args
        .get_many::<Url>("url")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let seeds_file = args.get_one::<PathBuf>("seeds-file");
    if !urls.is_empty() || seeds_file.is_some() {
        config.seeds = load_urls_from_source(&urls, seeds_file).map_err(|e| anyhow!(e))?;
        if let Some(domain) = config.seeds.first().and_then(|seed| derive_self_domain(seed)) {
            config.self_domain = domain;
        }
    }

    if let Some(domain) = args.get_one::<String>("self-domain") {
        config.self_domain = domain.clone();
    }
    if let Some(threads) = args.get_one::<usize>("threads") {
        config.workers = *threads;
    }
    if let Some(retries) = args.get_one::<u32>("max-retries") {
        config.max_retries = *retries;
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        config.fetch_timeout_secs = *timeout;
    }
    if args.get_flag("no-refresh-blocklist") {
        config.refresh_blocklist = false;
    }
    if let Some(url) = args.get_one::<String>("blocklist-url") {
        config.blocklist_url = url.clone();
    }
    if let Some(policy) = args.get_one::<String>("match-policy") {
        config.match_policy = policy.parse::<MatchPolicy>()?;
    }

    config.validate()?;
    Ok(config)
}

fn open_database(dir: &Path) -> anyhow::Result<Database> {
    let db_path = dir.join(DATABASE_FILE);
    if !Database::exists(&db_path) {
        bail!(
            "No database at {}. Run `outlink init` or `outlink crawl` first.",
            db_path.display()
        );
    }
    Database::new(&db_path).with_context(|| format!("Failed to open {}", db_path.display()))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> anyhow::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn print_frontier_stats(stats: &FrontierStats) {
    println!("  {} {}", "Pending:  ".blue(), stats.pending.to_string().bright_white());
    println!("  {} {}", "In flight:".blue(), stats.in_flight.to_string().bright_white());
    println!("  {} {}", "Done:     ".green(), stats.done.to_string().bright_white());
    println!("  {} {}", "Failed:   ".red(), stats.failed.to_string().bright_white());
}

pub fn handle_init(args: &ArgMatches) -> anyhow::Result<()> {
    print_divider();
    println!("{}", "  OUTLINK INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(config::DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let config_dir = config::expand_path(Path::new(raw_path));
    let db_loc = config_dir.join(DATABASE_FILE);
    let db_path = db_loc.as_path();

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    if Database::exists(db_path) {
        let overwrite = if force {
            true
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("Database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
            println!(
                "{}",
                "Overwriting discards the frontier and every recorded link.".yellow()
            );
            println!();

            let response = print_prompt("Would you like to overwrite it? [y/N]:")?;
            println!();
            response == "y" || response == "yes"
        };

        if overwrite {
            Database::drop(db_path)?;
            println!("{} Existing database removed", "✓".green().bold());
        } else {
            println!("{} Keeping existing database", "→".blue());
        }
        println!();
    }

    if !Database::exists(db_path) {
        println!("{} Creating database...", "→".blue());
        Database::new(db_path).context("Failed to create database")?;
        println!(
            "{} Database initialized: {}",
            "✓".green().bold(),
            db_path.display().to_string().bright_white()
        );
    }

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

/// Wait for interrupts from `signal`.
///
/// The first one raises `stop`. Returns `true` if a second one arrives,
/// meaning the caller should exit without waiting for the crawl to drain.
pub async fn watch_interrupts<S, Fut>(stop: StopHandle, mut signal: S) -> bool
where
    S: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal().await {
        warn!("Unable to listen for interrupts: {}", e);
        return false;
    }
    info!("Interrupt received, stopping after in-flight pages (press Ctrl-C again to exit now)");
    stop.stop();

    signal().await.is_ok()
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = build_crawl_config(sub_matches)?;

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let db = Database::new(&db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;

    let blocklist = load_blocklist(&config)
        .await
        .context("Could not load the blocklist")?;

    let fetcher = HttpFetcher::with_options(config.fetch_timeout_secs, &config.user_agent)?;

    if !quiet {
        println!("\n🕷️  Crawling for links outside {}", config.self_domain.bright_white());
        println!("Seeds: {}", config.seeds.join(", "));
        println!("Workers: {}", config.workers);
        println!("Max retries: {}", config.max_retries);
        println!(
            "Blocklist: {} domains ({})\n",
            blocklist.len(),
            blocklist.policy().as_str()
        );
    }

    // Ctrl-C finishes in-flight pages and leaves the rest queued; a second
    // Ctrl-C exits at once
    let stop = StopHandle::default();
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        if watch_interrupts(signal_stop, tokio::signal::ctrl_c).await {
            warn!("Second interrupt received, exiting without waiting for in-flight pages");
            std::process::exit(130);
        }
    });

    let options = CrawlOptions {
        config,
        blocklist,
        show_progress_bars: !quiet,
        stop: Some(stop),
    };

    let result_callback = Arc::new(|outcome: PageOutcome| {
        if outcome.recorded > 0 {
            debug!(
                "{} new outbound links from {} ({} ms)",
                outcome.recorded,
                outcome.url,
                outcome.response_time.as_millis()
            );
        }
    });

    let run = execute_crawl(&db, Arc::new(fetcher), options, Some(result_callback))
        .await
        .context("Crawl failed")?;

    let summary = &run.summary;
    if summary.stopped {
        println!("\n{} Crawl stopped; run again to resume\n", "⏸".yellow().bold());
    } else {
        println!("\n{} Crawl complete!\n", "✓".green().bold());
    }

    print_divider();
    println!("{} {}", "Session:".blue(), run.session_id.bright_white());
    println!("  Pages crawled:     {}", summary.pages_crawled);
    println!("  Fetch failures:    {}", summary.fetch_failures);
    println!("  Links found:       {}", summary.links_found);
    println!(
        "  Links recorded:    {}",
        summary.links_recorded.to_string().green().bold()
    );
    println!("  Links enqueued:    {}", summary.links_enqueued);
    println!("  Blocked links:     {}", summary.links_blocked);
    println!("  Malformed links:   {}", summary.links_malformed);
    if summary.store_errors > 0 {
        println!(
            "  Store errors:      {}",
            summary.store_errors.to_string().red().bold()
        );
    }
    println!();
    println!("{}", "Frontier".bright_white().bold());
    print_frontier_stats(&run.frontier);
    print_divider();

    Ok(())
}

pub fn handle_report(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let db = open_database(&data_dir(sub_matches))?;

    let format = sub_matches
        .get_one::<String>("format")
        .map(|f| f.parse::<ReportFormat>())
        .transpose()?
        .unwrap_or(ReportFormat::Text);
    let session_id = sub_matches.get_one::<String>("session").map(String::as_str);

    let data = gather_report_data(&db, session_id)?;
    if let Some(id) = session_id
        && data.session.is_none()
    {
        bail!("No crawl session with id {}", id);
    }

    let content = match format {
        ReportFormat::Text => generate_text_report(&data),
        ReportFormat::Json => generate_json_report(&data)?,
    };

    match sub_matches.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn handle_frontier_status(args: &ArgMatches) -> anyhow::Result<()> {
    let db = open_database(&data_dir(args))?;
    let stats = db.frontier().stats()?;

    println!("{}", "Frontier".bright_white().bold());
    print_frontier_stats(&stats);
    println!("  {} {}", "Total:    ".bright_white(), stats.total());
    Ok(())
}

pub fn handle_frontier_requeue(args: &ArgMatches) -> anyhow::Result<()> {
    let db = open_database(&data_dir(args))?;
    let requeued = db.frontier().requeue_failed()?;

    if requeued == 0 {
        println!("{} No failed URLs to requeue", "→".blue());
    } else {
        println!(
            "{} Requeued {} failed URL(s); the next crawl retries them",
            "✓".green().bold(),
            requeued.to_string().bright_white()
        );
    }
    Ok(())
}
