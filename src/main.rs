use clap::Parser;
use eco_scan::analyzer::{GeminiClient, JsonFileStore};
use eco_scan::pipeline::{self, SavePolicy, ScanOutcome};
use eco_scan::product_lookup::OpenFoodFactsClient;
use eco_scan::store::{average_score, validate_user_id, ScanStore};
use eco_scan::{cli, config, error, export, scanner};
use cli::{Cli, Commands};
use config::Config;
use eco_scan_common::{rating_label, share_message, KeyValueStore, ScoringEngine};
use error::{EcoScanError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = Config::load()?;
    let user_id = cli.user.clone().unwrap_or_else(|| config.user_id.clone());

    match cli.command {
        Commands::Scan { image, save, no_save, tips, no_cache, json } => {
            validate_user_id(&user_id)?;
            let engine = config.build_engine(cli.catalog.as_deref(), cli.aliases.as_deref())?;
            let data_dir = config.data_dir()?;
            let store = ScanStore::new(&data_dir);

            if !json {
                println!("🌱 eco-scan - receipt scan\n");
                println!("[1/3] Preparing image...");
            }
            let image = scanner::receipt_image(&image)?;
            let prepared = scanner::prepare_image(&image.path, config.max_image_size)?;

            if !json {
                println!("[2/3] Reading receipt...");
            }
            let client = GeminiClient::from_config(&config)?;
            let mut cache = (!no_cache).then(|| JsonFileStore::open(&data_dir));
            let previous = store.latest(&user_id)?.map(|s| s.total_score);
            let mut outcome = pipeline::process_receipt(
                &engine,
                &client,
                cache.as_mut().map(|c| c as &mut dyn KeyValueStore),
                &image,
                &prepared,
                &user_id,
                previous,
            )
            .await?;

            if tips {
                pipeline::append_tips(&mut outcome, &client).await;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.scan)?);
            } else {
                println!("[3/3] Scoring...\n");
                print_outcome(&outcome);
            }

            if let Some(id) =
                pipeline::save_with_policy(&store, &outcome.scan, SavePolicy::from_flags(save, no_save))?
            {
                println!("\n✔ Saved scan {}", id);
            }
        }

        Commands::Batch { folder, recursive, save, no_cache, output } => {
            validate_user_id(&user_id)?;
            let engine = config.build_engine(cli.catalog.as_deref(), cli.aliases.as_deref())?;
            let data_dir = config.data_dir()?;
            let store = ScanStore::new(&data_dir);

            println!("🌱 eco-scan - batch scan\n");

            println!("[1/2] Scanning folder...");
            let images = scanner::scan_folder(&folder, recursive)?;
            if images.is_empty() {
                return Err(EcoScanError::NoImagesFound(folder.display().to_string()));
            }
            println!("✔ Found {} receipt image(s)\n", images.len());

            println!("[2/2] Analyzing receipts...");
            let client = GeminiClient::from_config(&config)?;
            let mut cache = (!no_cache).then(|| JsonFileStore::open(&data_dir));
            let entries = pipeline::run_batch(
                &engine,
                &client,
                cache.as_mut().map(|c| c as &mut dyn KeyValueStore),
                &images,
                config.max_image_size,
                &user_id,
            )
            .await;

            let mut scans = Vec::new();
            for entry in entries {
                match entry.result {
                    Ok(outcome) => {
                        println!(
                            "  ✔ {}: {}/100 ({}), {} item(s)",
                            entry.image.file_name,
                            outcome.scan.total_score,
                            rating_label(outcome.scan.total_score),
                            outcome.scan.items.len()
                        );
                        scans.push(outcome.scan);
                    }
                    Err(e) => println!("  ✖ {}: {}", entry.image.file_name, e),
                }
            }

            if save {
                for scan in &scans {
                    store.save(scan)?;
                }
                println!("\n✔ Saved {} scan(s)", scans.len());
            }

            if let Some(output) = output {
                std::fs::write(&output, serde_json::to_string_pretty(&scans)?)?;
                println!("✔ Results written to {}", output.display());
            }

            println!(
                "\n✅ {} of {} receipt(s) scored, average {}/100",
                scans.len(),
                images.len(),
                average_score(&scans)
            );
        }

        Commands::Barcode { code, kind, save, no_save, tips, no_cache } => {
            validate_user_id(&user_id)?;
            let engine = config.build_engine(cli.catalog.as_deref(), cli.aliases.as_deref())?;
            let data_dir = config.data_dir()?;
            let store = ScanStore::new(&data_dir);

            let off = OpenFoodFactsClient::new(Duration::from_secs(config.timeout_seconds))?;
            let gemini = match GeminiClient::from_config(&config) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!(error = %e, "Gemini unavailable, barcode lookup limited to Open Food Facts");
                    None
                }
            };
            let mut cache = (!no_cache).then(|| JsonFileStore::open(&data_dir));
            let previous = store.latest(&user_id)?.map(|s| s.total_score);

            let (lookup, mut outcome) = pipeline::process_barcode(
                &engine,
                &code,
                kind.as_deref(),
                cache.as_mut().map(|c| c as &mut dyn KeyValueStore),
                &off,
                gemini.as_ref(),
                &user_id,
                previous,
            )
            .await;
            tracing::debug!(source = %lookup.source, "barcode lookup finished");

            if tips {
                if let Some(client) = &gemini {
                    pipeline::append_tips(&mut outcome, client).await;
                }
            }

            print_outcome(&outcome);

            if let Some(id) =
                pipeline::save_with_policy(&store, &outcome.scan, SavePolicy::from_flags(save, no_save))?
            {
                println!("\n✔ Saved scan {}", id);
            }
        }

        Commands::Score { items, table_only, json } => {
            let engine = config.build_engine(cli.catalog.as_deref(), cli.aliases.as_deref())?;
            score_items(&engine, &user_id, &items, table_only, json)?;
        }

        Commands::History { limit, id, share, json } => {
            let store = ScanStore::new(&config.data_dir()?);
            show_history(&store, &user_id, limit, id.as_deref(), share, json)?;
        }

        Commands::Export { output, format, title } => {
            let store = ScanStore::new(&config.data_dir()?);
            let history = store.history(&user_id)?;
            if history.is_empty() {
                println!("No scans recorded for user {}", user_id);
                return Ok(());
            }

            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            for path in export::export_history(&history, &format, &output_dir, &title)? {
                println!("✔ Exported: {}", path.display());
            }
        }

        Commands::Config { set_api_key, set_user, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key saved");
            }

            if let Some(user) = set_user {
                validate_user_id(&user)?;
                config.user_id = user;
                config.save()?;
                println!("✔ Default user set to {}", config.user_id);
            }

            if show {
                println!("Configuration ({}):", Config::config_path()?.display());
                println!("  Model: {}", config.model);
                println!("  Max image size: {}px", config.max_image_size);
                println!("  Timeout: {}s", config.timeout_seconds);
                println!("  User: {}", config.user_id);
                println!("  Data dir: {}", config.data_dir()?.display());
                println!(
                    "  Catalog: {}",
                    display_or(config.catalog_path.as_deref(), "built-in")
                );
                println!(
                    "  Alias preset: {}",
                    config.alias_preset.as_deref().unwrap_or("none")
                );
                println!(
                    "  Alias file: {}",
                    display_or(config.alias_path.as_deref(), "none")
                );
                println!(
                    "  API key: {}",
                    if config.get_api_key().is_ok() { "set" } else { "not set" }
                );
            }
        }

        Commands::Cache { clear, info } => {
            let data_dir = config.data_dir()?;
            let cache_path = JsonFileStore::cache_path(&data_dir);

            if info || !clear {
                if cache_path.exists() {
                    let cache = JsonFileStore::open(&data_dir);
                    println!("Cache:");
                    println!("  Path: {}", cache_path.display());
                    println!("  Entries: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  Size: {} bytes", meta.len());
                    }
                } else {
                    println!("No cache file: {}", cache_path.display());
                }
            }

            if clear {
                match JsonFileStore::clear(&data_dir) {
                    Ok(true) => println!("✔ Cache removed: {}", cache_path.display()),
                    Ok(false) => println!("No cache file to remove"),
                    Err(e) => println!("Failed to remove cache: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn display_or(path: Option<&Path>, fallback: &str) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn print_outcome(outcome: &ScanOutcome) {
    if let Some(store_name) = &outcome.store_name {
        println!("Store: {}", store_name);
    }
    println!("Items:");
    for item in &outcome.scan.items {
        println!("  - {} ({}/100, {} impact)", item.name, item.score, item.impact);
    }
    println!();
    if let Some(feedback) = &outcome.scan.feedback {
        println!("{}", feedback);
    }
}

fn score_items(
    engine: &ScoringEngine,
    user_id: &str,
    items: &[String],
    table_only: bool,
    json: bool,
) -> Result<()> {
    if table_only {
        let table = engine.score_table(items);
        if json {
            println!("{}", serde_json::to_string_pretty(&table)?);
            return Ok(());
        }
        println!("Matched {} of {} item(s)", table.matched_items.len(), items.len());
        for item in &table.matched_items {
            println!("  - {} ({}/100, {} impact)", item.name, item.score, item.impact);
        }
        println!(
            "Total score: {}/100 ({})",
            table.total_score,
            rating_label(table.total_score)
        );
        return Ok(());
    }

    let outcome = pipeline::assemble_scan(engine, user_id, items, None);
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.metrics)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn show_history(
    store: &ScanStore,
    user_id: &str,
    limit: Option<usize>,
    id: Option<&str>,
    share: bool,
    json: bool,
) -> Result<()> {
    if share || id.is_some() {
        let scan = match id {
            Some(id) => store.get(user_id, id)?,
            None => store
                .latest(user_id)?
                .ok_or_else(|| EcoScanError::ScanNotFound(format!("no scans for {}", user_id)))?,
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&scan)?);
        } else if share {
            println!("{}", share_message(&scan));
        } else {
            println!("{} ({})", scan.id, scan.created_at.format("%Y-%m-%d %H:%M"));
            println!("{}", scan.feedback.as_deref().unwrap_or(""));
        }
        return Ok(());
    }

    let history = store.history(user_id)?;
    let shown: Vec<_> = history
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No scans recorded for user {}", user_id);
        return Ok(());
    }

    println!("Scan history for {} ({} scan(s)):", user_id, history.len());
    for scan in shown {
        println!(
            "  {}  {}  {:>3}/100 ({})  {} item(s)",
            scan.created_at.format("%Y-%m-%d %H:%M"),
            scan.id,
            scan.total_score,
            rating_label(scan.total_score),
            scan.items.len()
        );
    }
    println!("Average score: {}/100", average_score(&history));
    Ok(())
}
