/// Cadence - headless music player
use anyhow::Context;
use cadence_core::{
    MediaLocator, NewTrack, PlaylistKind, PlaylistStore, TrackId, TrackStore, TrackUpdate,
};
use cadence_playback::{LocalFocus, PlaybackEvent, PlaybackManager, PlaybackState};
use cadence_player::{ClockEngine, PlayerConfig, PlayerService, RefreshScheduler};
use cadence_playlists::{ensure_default_playlists, Materializer, RefreshOutcome};
use cadence_storage::LocalStore;
use clap::{ArgGroup, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence headless music player", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./cadence.toml if present)
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a playlist (or the whole library) until it ends
    Run {
        /// Playlist name; plays every track when omitted
        #[arg(short, long)]
        playlist: Option<String>,
        /// Queue index to start from
        #[arg(short, long, default_value_t = 0)]
        start: usize,
        /// Shuffle the queue
        #[arg(long)]
        shuffle: bool,
        /// Stop after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Regenerate smart playlists
    Refresh {
        /// Playlist name; refreshes every smart playlist when omitted
        name: Option<String>,
    },
    /// List playlists
    Playlists,
    /// Add a track to the library
    #[command(group(ArgGroup::new("source").required(true).args(["path", "url"])))]
    AddTrack {
        title: String,
        /// Local file path
        #[arg(long)]
        path: Option<PathBuf>,
        /// Stream URL
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        /// Length in milliseconds (0 = unknown)
        #[arg(long, default_value_t = 0)]
        duration_ms: u64,
    },
    /// Mark a track as favorite
    Favorite {
        id: i64,
        /// Remove the mark instead
        #[arg(long)]
        off: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence_player=info,cadence_playback=info,cadence_playlists=info,cadence_storage=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = PlayerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            playlist,
            start,
            shuffle,
            duration_secs,
        } => {
            run(
                config,
                playlist.as_deref(),
                start,
                shuffle,
                duration_secs.map(Duration::from_secs),
            )
            .await?;
        }
        Commands::Refresh { name } => {
            refresh(&config, name.as_deref()).await?;
        }
        Commands::Playlists => {
            list_playlists(&config).await?;
        }
        Commands::AddTrack {
            title,
            path,
            url,
            artist,
            album,
            genre,
            duration_ms,
        } => {
            let locator = match (path, url) {
                (Some(path), _) => MediaLocator::local(path),
                (None, Some(url)) => MediaLocator::stream(url),
                (None, None) => anyhow::bail!("either --path or --url is required"),
            };
            let mut track = NewTrack::new(title, locator).with_duration_ms(duration_ms);
            if let Some(artist) = artist {
                track = track.with_artist(artist);
            }
            if let Some(album) = album {
                track = track.with_album(album);
            }
            if let Some(genre) = genre {
                track = track.with_genre(genre);
            }
            add_track(&config, track).await?;
        }
        Commands::Favorite { id, off } => {
            set_favorite(&config, TrackId::new(id), !off).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

async fn open_store(config: &PlayerConfig) -> anyhow::Result<LocalStore> {
    let store = cadence_storage::open(&config.storage.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.storage.database_url))?;
    tracing::info!("Database connected");

    if config.smart_playlists.create_defaults {
        ensure_default_playlists(&store).await?;
    }
    Ok(store)
}

fn materializer(config: &PlayerConfig, store: &LocalStore) -> Materializer {
    Materializer::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        config.to_materializer_config(),
    )
}

async fn run(
    config: PlayerConfig,
    playlist: Option<&str>,
    start: usize,
    shuffle: bool,
    limit: Option<Duration>,
) -> anyhow::Result<()> {
    tracing::info!("Starting Cadence player");

    let store = open_store(&config).await?;
    let materializer = Arc::new(materializer(&config, &store));

    let scheduler = RefreshScheduler::new(Arc::clone(&materializer), config.refresh_check_interval())
        .start();

    // Resolve the queue before spawning anything that plays
    let tracks = match playlist {
        Some(name) => {
            let playlist = store
                .find_by_name(name)
                .await?
                .with_context(|| format!("no playlist named '{}'", name))?;
            if playlist.is_smart() {
                materializer.refresh(playlist.id).await?;
            }
            cadence_playlists::playlist_snapshot(&store, playlist.id).await?
        }
        None => store.all_tracks().await?,
    };

    if tracks.is_empty() {
        println!("Nothing to play");
        scheduler.shutdown().await;
        return Ok(());
    }

    let library = store.all_tracks().await?;
    let engine = ClockEngine::for_tracks(&library);
    let mut playback = config.to_playback_config();
    playback.shuffle = playback.shuffle || shuffle;
    let manager = PlaybackManager::new(Box::new(engine), Box::new(LocalFocus::new()), playback);

    let (player, task) = PlayerService::spawn(
        manager,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        config.position_tick(),
    );
    let mut events = player.subscribe();

    player.play_tracks(tracks, start).await?;

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if print_event(&event) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event consumer lagged");
                }
                Err(RecvError::Closed) => break,
            },
            () = &mut deadline => {
                tracing::info!("Time limit reached");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    player.shutdown().await?;
    task.await?;
    scheduler.shutdown().await;
    Ok(())
}

/// Print an event; returns true once playback has stopped
fn print_event(event: &PlaybackEvent) -> bool {
    match event {
        PlaybackEvent::Update(snapshot) => {
            if let Some(track) = &snapshot.track {
                tracing::debug!(state = ?snapshot.state, track = %track.title, "Player update");
            }
            snapshot.state == PlaybackState::Stopped
        }
        PlaybackEvent::TrackChanged { index, .. } => {
            println!("Track {}", index + 1);
            false
        }
        PlaybackEvent::TrackFinished { track_id } => {
            tracing::info!(track_id = track_id.get(), "Track finished");
            false
        }
        PlaybackEvent::PositionUpdate {
            position_ms,
            duration_ms,
        } => {
            println!("  {} / {}", format_ms(*position_ms), format_ms(*duration_ms));
            false
        }
        PlaybackEvent::Error { message } => {
            eprintln!("Error: {}", message);
            false
        }
        _ => false,
    }
}

fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

async fn refresh(config: &PlayerConfig, name: Option<&str>) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let materializer = materializer(config, &store);

    match name {
        Some(name) => {
            let playlist = store
                .find_by_name(name)
                .await?
                .with_context(|| format!("no playlist named '{}'", name))?;
            match materializer.refresh(playlist.id).await? {
                RefreshOutcome::Refreshed(totals) => {
                    println!("{}: {} tracks", playlist.name, totals.track_count);
                }
                RefreshOutcome::Skipped => println!("{} is not a smart playlist", playlist.name),
            }
        }
        None => {
            for report in materializer.refresh_all().await? {
                match report.result {
                    Ok(RefreshOutcome::Refreshed(totals)) => {
                        println!("{}: {} tracks", report.name, totals.track_count);
                    }
                    Ok(RefreshOutcome::Skipped) => {}
                    Err(e) => println!("{}: failed ({})", report.name, e),
                }
            }
        }
    }

    Ok(())
}

async fn list_playlists(config: &PlayerConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let playlists = store.list_playlists(PlaylistKind::All).await?;

    println!("Playlists:");
    for playlist in playlists {
        let kind = playlist
            .smart_type()
            .map_or("manual", |smart_type| smart_type.as_str());
        println!(
            "  {} - {} [{}] {} tracks, {}",
            playlist.id,
            playlist.name,
            kind,
            playlist.track_count,
            format_ms(playlist.duration_ms)
        );
    }

    Ok(())
}

async fn add_track(config: &PlayerConfig, track: NewTrack) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let track = store.create_track(track).await?;
    println!("Added {} - {}", track.id, track.title);
    Ok(())
}

async fn set_favorite(config: &PlayerConfig, id: TrackId, favorite: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    store.update_field(id, TrackUpdate::Favorite(favorite)).await?;
    println!(
        "Track {} {}",
        id,
        if favorite { "marked favorite" } else { "unmarked" }
    );
    Ok(())
}
