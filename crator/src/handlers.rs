use clap::ArgMatches;
use crator_core::{PageSaver, PageVerifier, SaverConfig, StatsSnapshot, Verdict};
use crator_scanner::{FetchOptions, Fetcher};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::report::generate_summary_report;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Bare onion addresses are served over plain HTTP
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub save_dir: PathBuf,
    pub workers: usize,
    pub login_url: Option<String>,
    pub fetch: FetchOptions,
    pub poll_interval: Duration,
    pub submit_interval: Duration,
    pub show_progress_bars: bool,
}

/// What happened to one requested URL
#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    pub url: String,
    pub verdict: Option<Verdict>,
    /// File stem the page was saved under, when accepted
    pub identifier: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CrawlSummary {
    pub pages: Vec<PageOutcome>,
    pub fetch_errors: usize,
    pub contract_violations: usize,
    pub saver: StatsSnapshot,
}

impl CrawlSummary {
    pub fn verdict_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for verdict in self.pages.iter().filter_map(|p| p.verdict) {
            *counts.entry(verdict.as_str()).or_insert(0) += 1;
        }
        counts
    }

    fn record(
        &mut self,
        url: &str,
        verdict: Option<Verdict>,
        identifier: Option<usize>,
        error: Option<String>,
    ) {
        self.pages.push(PageOutcome {
            url: url.to_string(),
            verdict,
            identifier,
            error,
        });
    }
}

/// Fetch every URL, verify it and persist the accepted pages.
/// Each accepted page is saved under its position in `urls`.
pub async fn execute_crawl(options: CrawlOptions) -> Result<CrawlSummary, String> {
    let CrawlOptions {
        urls,
        save_dir,
        workers,
        login_url,
        fetch,
        poll_interval,
        submit_interval,
        show_progress_bars,
    } = options;

    let fetcher =
        Fetcher::with_options(fetch).map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let mut verifier = PageVerifier::new();
    if let Some(login_url) = login_url {
        match fetcher.fetch(&login_url).await {
            Ok(login_page) => {
                info!("Using {} as login page reference", login_page.url);
                verifier = verifier.with_login_page(login_page);
            }
            Err(e) => warn!("Could not fetch login page {}: {}", login_url, e),
        }
    }

    let saver = PageSaver::with_fs(
        SaverConfig::new(save_dir)
            .with_workers(workers)
            .with_poll_interval(poll_interval)
            .with_submit_interval(submit_interval),
    );
    saver.start().map_err(|e| e.to_string())?;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| e.to_string())?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut summary = CrawlSummary::default();

    for (idx, url) in urls.iter().enumerate() {
        if let Some(ref pb) = progress_bar {
            pb.set_message(format!("[{}/{}] {}", idx + 1, urls.len(), url));
        }

        let response = match fetcher.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Fetch error for {}: {}", url, e);
                summary.fetch_errors += 1;
                summary.record(url, None, None, Some(e.to_string()));
                continue;
            }
        };

        match verifier.check(url, &response) {
            Ok(verdict) if verdict.is_accepted() => match saver.enqueue(response, idx) {
                Ok(()) => summary.record(url, Some(verdict), Some(idx), None),
                Err(e) => {
                    warn!("Could not queue {}: {}", url, e);
                    summary.record(url, Some(verdict), None, Some(e.to_string()));
                }
            },
            Ok(verdict) => {
                info!("Rejected {}: {}", url, verdict.as_str());
                summary.record(url, Some(verdict), None, None);
            }
            Err(e) => {
                warn!("Cannot compare {} with accepted pages: {}", url, e);
                summary.contract_violations += 1;
                summary.record(url, None, None, Some(e.to_string()));
            }
        }
    }

    if let Some(ref pb) = progress_bar {
        pb.set_message("Waiting for page writers...");
    }
    saver.finish().await;
    summary.saver = saver.stats();

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Crawl complete! {} page(s) saved",
            summary.saver.saved
        ));
    }

    Ok(summary)
}

pub async fn handle_crawl(sub_matches: &ArgMatches) {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let output = sub_matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or("~/.local/share/crator/pages");
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&1);
    let login_url = sub_matches.get_one::<Url>("login-url").map(|u| u.to_string());
    let proxy = sub_matches.get_one::<String>("proxy").cloned();
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&30);
    let poll_ms = *sub_matches.get_one::<u64>("poll-ms").unwrap_or(&100);
    let pace_ms = *sub_matches.get_one::<u64>("pace-ms").unwrap_or(&100);
    let json = sub_matches.get_flag("json");

    let urls = match load_urls_from_source(url, hosts_file) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let save_dir = PathBuf::from(shellexpand::tilde(output).into_owned());

    if !json {
        println!("\n🧅 Verifying {} URL(s)", urls.len());
        println!("Writers: {}", threads);
        println!("Saving to: {}", save_dir.display());
        if let Some(ref proxy) = proxy {
            println!("Proxy: {}", proxy);
        }
        println!();
    }

    let options = CrawlOptions {
        urls,
        save_dir,
        workers: threads,
        login_url,
        fetch: FetchOptions {
            timeout_secs: timeout,
            proxy,
            ..FetchOptions::default()
        },
        poll_interval: Duration::from_millis(poll_ms),
        submit_interval: Duration::from_millis(pace_ms),
        show_progress_bars: !json,
    };

    let summary = match execute_crawl(options).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("✗ Crawl failed: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("✗ Failed to serialize summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", generate_summary_report(&summary));
    }
}
