use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use queue_display::console::Console;
use queue_display::logging;
use queue_display::platform::ConsolePlatform;
use queue_display::speech::HostSpeech;
use queue_display_core::cache::{CacheStore, FileCacheStore, MemoryCacheStore, OfflineCache};
use queue_display_core::clock::SystemClock;
use queue_display_core::config::{EngineConfig, EngineConfigExt};
use queue_display_core::connectivity::PlatformFlag;
use queue_display_core::{AudioService, DisplayEngine, DisplayService, create_audio_channel};
use queue_display_types::Scope;

#[derive(Parser)]
#[command(version, about = "Hospital queue display console")]
struct Args {
    /// Configuration file, platform config dir when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Department to display, overrides the configured scope ("all" for every department)
    #[arg(short, long)]
    scope: Option<String>,

    /// Start as if the network were down
    #[arg(long)]
    offline: bool,

    /// Write the effective configuration back to the config file and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_from(path).map_err(|e| e.to_string())?,
        None => EngineConfig::load(),
    };
    config.validate().map_err(|e| e.to_string())?;

    if args.write_config {
        let mut config = config;
        if let Some(scope) = &args.scope {
            config.scope = scope.clone();
        }
        let saved = match &args.config {
            Some(path) => config.save_to(path),
            None => config.save(),
        };
        saved.map_err(|e| e.to_string())?;
        tracing::info!(scope = %config.scope, "Configuration written");
        return Ok(());
    }

    let scope = args
        .scope
        .as_deref()
        .map(Scope::parse)
        .unwrap_or_else(|| config.scope());

    let store: Arc<dyn CacheStore> = match config.cache_dir.clone() {
        Some(dir) => Arc::new(FileCacheStore::new(dir)),
        None => match FileCacheStore::default_location() {
            Some(store) => Arc::new(store),
            None => {
                tracing::warn!("No cache directory available, offline snapshots kept in memory");
                Arc::new(MemoryCacheStore::new())
            }
        },
    };
    let cache = OfflineCache::new(store, Arc::new(SystemClock));

    let online = !args.offline;
    let engine = DisplayEngine::new(
        scope,
        &config,
        cache,
        online,
        config.platform_allows_audio,
    )
    .map_err(|e| e.to_string())?;

    let (audio_tx, audio_rx) = create_audio_channel();
    tokio::spawn(AudioService::new(audio_rx, Box::new(HostSpeech::new())).run());

    let network = PlatformFlag::new(online);
    let (service, handle) = DisplayService::new(
        engine,
        audio_tx,
        Box::new(ConsolePlatform::new(true)),
        Arc::new(network.clone()),
        config.cache_refresh(),
    );
    let service_task = tokio::spawn(service.run());

    let console = Console::new(handle, network);
    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match console.respond(line).await {
            Ok(true) => break,
            Ok(false) => {}
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    service_task.await.map_err(|e| e.to_string())?;
    Ok(())
}

fn readline() -> Result<String, String> {
    write!(std::io::stdout(), "> ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    let mut buffer = String::new();
    let read = std::io::stdin()
        .read_line(&mut buffer)
        .map_err(|e| e.to_string())?;
    if read == 0 {
        // EOF behaves like `exit`
        return Ok("exit".to_string());
    }
    Ok(buffer)
}
