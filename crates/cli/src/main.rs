//! FireRisk CLI - wildfire risk analysis around a point

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use firerisk_analysis::config::{DEFAULT_DOWNLOAD_DIR, DEFAULT_FOLDER, DEFAULT_PROJECT};
use firerisk_analysis::{
    find_province, plan_exports, run, AnalysisConfig, ExportOutcome, PollPolicy, Province,
    RetrievalScope, RunReport, WaitPolicy, IRAN_MAP, PROVINCES,
};
use firerisk_cloud::auth::oauth::{DRIVE_READONLY_SCOPE, EARTH_ENGINE_SCOPE};
use firerisk_cloud::{
    ClientSecrets, ComputeClient, ComputeClientOptions, DriveClient, DriveClientOptions,
    InstalledFlow,
};
use firerisk_core::Coordinate;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "firerisk")]
#[command(author, version, about = "Wildfire risk analysis around a point", long_about = None)]
#[command(after_help = "Without coordinates a province picker is shown instead.")]
struct Cli {
    /// Longitude in decimal degrees
    #[arg(value_parser = parse_lon, allow_negative_numbers = true, requires = "lat")]
    lon: Option<f64>,

    /// Latitude in decimal degrees
    #[arg(value_parser = parse_lat, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Root URL of the compute service accepting export requests
    #[arg(long, value_name = "URL", required_unless_present = "dry_run")]
    compute_url: Option<String>,

    /// Cloud project billed for the exports
    #[arg(long, default_value = DEFAULT_PROJECT)]
    project: String,

    /// Storage folder receiving the exports
    #[arg(long, default_value = DEFAULT_FOLDER)]
    folder: String,

    /// Local directory for downloaded files
    #[arg(long, default_value = DEFAULT_DOWNLOAD_DIR)]
    download_dir: PathBuf,

    /// OAuth client secrets of an installed application
    #[arg(long, default_value = "client_secrets.json")]
    client_secrets: PathBuf,

    /// Sleep this many seconds instead of polling export status
    #[arg(long, value_name = "SECS", conflicts_with = "deadline")]
    fixed_wait: Option<u64>,

    /// Stop polling after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,

    /// Download everything in the folder, not only this run's files
    #[arg(long)]
    all_files: bool,

    /// Print the export requests as JSON and exit
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> AnalysisConfig {
        let wait = match (self.fixed_wait, self.deadline) {
            (Some(secs), _) => WaitPolicy::Fixed(Duration::from_secs(secs)),
            (None, Some(secs)) => WaitPolicy::Poll(PollPolicy {
                deadline: Duration::from_secs(secs),
                ..Default::default()
            }),
            (None, None) => WaitPolicy::default(),
        };
        AnalysisConfig {
            project: self.project.clone(),
            folder: self.folder.clone(),
            download_dir: self.download_dir.clone(),
            wait,
            scope: if self.all_files {
                RetrievalScope::AllFiles
            } else {
                RetrievalScope::RunOnly
            },
            ..Default::default()
        }
    }
}

fn parse_degrees(s: &str, limit: f64) -> std::result::Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if !v.is_finite() || v.abs() > limit {
        return Err(format!("{v} is outside -{limit}..={limit}"));
    }
    Ok(v)
}

fn parse_lon(s: &str) -> std::result::Result<f64, String> {
    parse_degrees(s, 180.0)
}

fn parse_lat(s: &str) -> std::result::Result<f64, String> {
    parse_degrees(s, 90.0)
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Resolve one line typed at the picker: a province name or number, or an
/// `x,y` pixel on the map canvas.
fn resolve_selection(input: &str) -> Result<&'static Province> {
    if let Some((x, y)) = input.split_once(',') {
        let x: f64 = x.trim().parse().with_context(|| format!("invalid x pixel '{x}'"))?;
        let y: f64 = y.trim().parse().with_context(|| format!("invalid y pixel '{y}'"))?;
        if !(0.0..=IRAN_MAP.width as f64).contains(&x) || !(0.0..=IRAN_MAP.height as f64).contains(&y) {
            bail!("pixel ({x}, {y}) is outside the {}x{} map", IRAN_MAP.width, IRAN_MAP.height);
        }
        return Ok(IRAN_MAP.click(x, y));
    }
    Ok(find_province(input)?)
}

/// Terminal province picker. `None` when the input ends without a choice.
fn pick_province() -> Result<Option<&'static Province>> {
    println!("Provinces (map pixel x,y on the {}x{} canvas):", IRAN_MAP.width, IRAN_MAP.height);
    for (i, p) in PROVINCES.iter().enumerate() {
        let (x, y) = IRAN_MAP.geo_to_pixel(p.lat, p.lon);
        println!("  {:>2}. {:<28} {:>8.4} {:>8.4}   ({x},{y})", i + 1, p.name, p.lat, p.lon);
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("Province name, number or x,y (empty to quit): ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let input = line.trim();
        if input.is_empty() {
            return Ok(None);
        }
        match resolve_selection(input) {
            Ok(p) => return Ok(Some(p)),
            Err(e) => eprintln!("{e:#}"),
        }
    }
}

fn describe(outcome: &ExportOutcome) -> String {
    match outcome {
        ExportOutcome::Succeeded => "succeeded".to_string(),
        ExportOutcome::Failed(reason) => format!("failed: {reason}"),
        ExportOutcome::Cancelled => "cancelled".to_string(),
        ExportOutcome::Pending => "still running".to_string(),
        ExportOutcome::Unknown => "not checked".to_string(),
    }
}

fn print_summary(report: &RunReport, elapsed: Duration) {
    println!("\nExports:");
    for (export, outcome) in &report.wait.exports {
        println!("  {:<40} {}", export.name, describe(outcome));
    }
    if report.wait.interrupted {
        println!("Waiting was interrupted.");
    } else if report.wait.timed_out {
        println!("Deadline reached before every export finished.");
    }

    match &report.retrieval {
        Some(r) => {
            println!(
                "Downloaded {} file(s), {} bytes, from {}'s storage",
                r.downloaded.len(),
                r.bytes,
                r.account
            );
            for path in &r.downloaded {
                println!("  {}", path.display());
            }
            for name in &r.skipped {
                println!("  skipped: {name}");
            }
            for prefix in &r.missing {
                println!("  missing: {prefix}");
            }
        }
        None if report.retrieval_interrupted => println!("Download interrupted."),
        None => println!("Nothing downloaded."),
    }
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Run ────────────────────────────────────────────────────────────────

async fn analyse(cli: &Cli, coord: Coordinate, config: &AnalysisConfig) -> Result<()> {
    let start = Instant::now();

    let secrets = ClientSecrets::from_file(&cli.client_secrets)
        .await
        .with_context(|| format!("Failed to read {}", cli.client_secrets.display()))?;
    let flow = InstalledFlow::new(secrets, &[EARTH_ENGINE_SCOPE, DRIVE_READONLY_SCOPE])?;
    let token = flow.run().await.context("Authorization failed")?;

    let compute_url = cli.compute_url.as_deref().context("--compute-url is required")?;
    let compute = ComputeClient::new(
        compute_url,
        &config.project,
        Box::new(token.clone()),
        ComputeClientOptions::default(),
    )?;
    let drive = DriveClient::new(Box::new(token), DriveClientOptions::default())?;

    // A fresh listener per stage: the first Ctrl-C ends the wait, the next
    // one stops the downloads.
    let cancel = || async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Ctrl-C handler unavailable, this stage cannot be interrupted");
            std::future::pending::<()>().await
        }
    };

    let pb = spinner("Exporting, waiting and downloading (Ctrl-C stops the current stage)...");
    let report = run(&compute, &drive, coord, config, cancel).await;
    pb.finish_and_clear();
    let report = report.context("Analysis failed")?;

    print_summary(&report, start.elapsed());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let coord = match (cli.lon, cli.lat) {
        (Some(lon), Some(lat)) => Coordinate::new(lon, lat),
        _ => match pick_province()? {
            Some(p) => {
                info!("Selected {} ({}, {})", p.name, p.lat, p.lon);
                p.coordinate()
            }
            None => return Ok(()),
        },
    };
    let config = cli.config();

    if cli.dry_run {
        let requests = plan_exports(coord, &config).context("Failed to build export requests")?;
        println!("{}", serde_json::to_string_pretty(&requests)?);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(analyse(&cli, coord, &config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    const URL: &str = "http://127.0.0.1:8080/v1";

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("firerisk").chain(args.iter().copied()))
    }

    #[test]
    fn two_positionals_are_lon_then_lat() {
        let cli = parse(&["51.389", "35.6892", "--compute-url", URL]).unwrap();
        assert_eq!((cli.lon, cli.lat), (Some(51.389), Some(35.6892)));

        let cli = parse(&["-70.5", "-33.4", "--compute-url", URL]).unwrap();
        assert_eq!((cli.lon, cli.lat), (Some(-70.5), Some(-33.4)));
    }

    #[test]
    fn no_positionals_selects_interactively() {
        let cli = parse(&["--compute-url", URL]).unwrap();
        assert_eq!((cli.lon, cli.lat), (None, None));
    }

    #[test]
    fn bad_coordinates_are_usage_errors() {
        let err = parse(&["51.389", "--compute-url", URL]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);

        for [lon, lat] in [["abc", "35.0"], ["51.0", "95.0"], ["NaN", "35.0"]] {
            let args = [lon, lat, "--compute-url", URL];
            let err = parse(&args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "{args:?}");
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn defaults_reproduce_built_in_config() {
        let config = parse(&["51.0", "35.0", "--compute-url", URL]).unwrap().config();
        assert_eq!(config.project, DEFAULT_PROJECT);
        assert_eq!(config.folder, DEFAULT_FOLDER);
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.wait, WaitPolicy::default());
        assert_eq!(config.scope, RetrievalScope::RunOnly);
    }

    #[test]
    fn wait_and_scope_flags() {
        let config = parse(&["51.0", "35.0", "--compute-url", URL, "--fixed-wait", "300", "--all-files"])
            .unwrap()
            .config();
        assert_eq!(config.wait, WaitPolicy::Fixed(Duration::from_secs(300)));
        assert_eq!(config.scope, RetrievalScope::AllFiles);

        let WaitPolicy::Poll(poll) = parse(&["--dry-run", "--deadline", "90"]).unwrap().config().wait else {
            panic!("deadline should keep polling");
        };
        assert_eq!(poll.deadline, Duration::from_secs(90));

        let err = parse(&["--dry-run", "--fixed-wait", "1", "--deadline", "2"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn compute_url_is_required_unless_dry_run() {
        let err = parse(&["51.0", "35.0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);

        let cli = parse(&["51.0", "35.0", "--dry-run"]).unwrap();
        assert!(cli.compute_url.is_none());
    }

    #[test]
    fn picker_accepts_names_numbers_and_pixels() {
        assert_eq!(resolve_selection("Fars").unwrap().name, "Fars");
        assert_eq!(resolve_selection("1").unwrap().name, "Tehran");

        let kerman = PROVINCES.iter().find(|p| p.name == "Kerman").unwrap();
        let (x, y) = IRAN_MAP.geo_to_pixel(kerman.lat, kerman.lon);
        assert_eq!(resolve_selection(&format!("{x}, {y}")).unwrap().name, "Kerman");

        assert!(resolve_selection("900,10").is_err());
        assert!(resolve_selection("a,b").is_err());
    }
}
