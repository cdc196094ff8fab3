use std::{error::Error, path::PathBuf, process};

use clap::{command, Parser, Subcommand, ValueHint};
use log::{debug, error, info, trace, warn, LevelFilter};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use kkstream::{
    config::{Config, ProviderOptions, Secrets},
    device::DeviceId,
    gateway::Gateway,
    image::ImageFormat,
    link::MediaKind,
    metadata::Download,
    provider::Provider,
    quality::AudioQuality,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, PartialEq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Secrets file
    ///
    /// Ensure that this file is kept secure and not shared publicly, as it
    /// contains the credentials of your KKBOX account.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value = "secrets.toml", env = "KKSTREAM_SECRETS")]
    secrets_file: PathBuf,

    /// State file
    ///
    /// Holds the device id, created on first run. Keep it between runs so
    /// that every start does not count as a new device.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value = "state.toml", env = "KKSTREAM_STATE")]
    state_file: PathBuf,

    /// Audio quality
    #[arg(long, value_enum, default_value_t = AudioQuality::Tier320)]
    quality: AudioQuality,

    /// Skip the check whether the subscription allows the audio quality
    #[arg(long, default_value_t = false)]
    no_subscription_check: bool,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, PartialEq, Subcommand)]
enum Command {
    /// Log in and show the audio qualities of the subscription
    Login,

    /// Show metadata of a track, album, artist or playlist link
    Info {
        #[arg(value_hint = ValueHint::Url)]
        link: String,
    },

    /// Download the tracks of a track, album or playlist link
    Download {
        #[arg(value_hint = ValueHint::Url)]
        link: String,

        /// Directory to write decrypted files to
        #[arg(short, long, value_hint = ValueHint::DirPath, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show the lyrics of a track link
    Lyrics {
        #[arg(value_hint = ValueHint::Url)]
        link: String,

        /// Print synced lyrics with time tags
        #[arg(long, default_value_t = false)]
        synced: bool,
    },

    /// Show the cover URL of a track link
    Cover {
        #[arg(value_hint = ValueHint::Url)]
        link: String,

        /// Edge length in pixels; above 2048 gets the original image
        #[arg(long, default_value_t = 1400)]
        size: u32,

        #[arg(long, value_enum, default_value_t = ImageFormat::Jpg)]
        format: ImageFormat,
    },

    /// Search the catalogue
    Search {
        #[arg(value_enum)]
        kind: SearchKind,

        query: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
enum SearchKind {
    Track,
    Album,
    Artist,
    Playlist,
}

impl From<SearchKind> for MediaKind {
    fn from(kind: SearchKind) -> Self {
        match kind {
            SearchKind::Track => Self::Track,
            SearchKind::Album => Self::Album,
            SearchKind::Artist => Self::Artist,
            SearchKind::Playlist => Self::Playlist,
        }
    }
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(args: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if args.quiet || args.verbose > 0 {
        let level = match args.verbose {
            // Quiet and verbose are mutually exclusive.
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Loads the secrets file, with a hint when it does not exist.
fn load_secrets(args: &Args) -> Result<Secrets, Box<dyn Error>> {
    let secrets = Secrets::from_file(&args.secrets_file);

    if let Err(ref e) = secrets {
        if e.kind == kkstream::error::ErrorKind::Io {
            info!(
                "copy secrets.toml.example to {} and fill in your credentials",
                args.secrets_file.display()
            );
        }
    }

    Ok(secrets?)
}

/// Track ids of a link that can be downloaded.
async fn track_ids(provider: &Provider, link: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let media = Provider::parse_link(link)?;
    let ids = match media.kind {
        MediaKind::Track => vec![media.id],
        MediaKind::Album => provider
            .album_info(&media.id, None)
            .await?
            .tracks
            .into_iter()
            .map(|track| track.id)
            .collect(),
        MediaKind::Playlist => provider
            .playlist_info(&media.id)
            .await?
            .tracks
            .into_iter()
            .map(|track| track.id)
            .collect(),
        MediaKind::Artist => {
            return Err(format!("cannot download artist {}, pick an album", media.id).into())
        }
    };

    Ok(ids)
}

async fn download(
    provider: &mut Provider,
    link: &str,
    output_dir: PathBuf,
) -> Result<(), Box<dyn Error>> {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("cancelling download");
                cancel.cancel();
            }
        }
    });

    let quality = provider.options().quality;
    for id in track_ids(provider, link).await? {
        let track = provider.track_info(&id, quality).await?;
        if let Some(e) = &track.error {
            warn!("skipping {}: {e}", track.name);
            continue;
        }

        info!("downloading {} - {} ({})", track.album_artist, track.name, track.quality);
        let progress = |written: u64, total: Option<u64>| {
            trace!("{id}: {written} of {} bytes", total.unwrap_or_default());
        };

        match provider
            .track_download(&id, track.quality, &output_dir, progress, &cancel)
            .await?
        {
            Download::Url(url) => println!("{url}"),
            Download::File(temp_path) => {
                let path = output_dir.join(format!("{id}.{}", track.codec.extension()));
                tokio::fs::rename(&temp_path, &path).await?;
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

/// Main application logic.
///
/// # Errors
///
/// This function returns an error when login fails, a link is invalid, or a
/// request cannot be completed.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let secrets = load_secrets(&args)?;
    let device_id = DeviceId::load_or_create(&args.state_file)?;

    let mut config = Config::new(secrets.kc1_key.clone(), device_id);
    if let Some(hosts) = secrets.hosts.clone() {
        config = config.with_hosts(hosts);
    }

    let mut gateway = Gateway::new(&config)?;
    let session = gateway.login(&secrets.email, &secrets.password).await?;

    let options = ProviderOptions {
        quality: args.quality,
        check_subscription: !args.no_subscription_check,
        ..ProviderOptions::default()
    };
    let mut provider = Provider::new(gateway, options);

    match args.command {
        Command::Login => print_json(session.qualities()),
        Command::Info { link } => {
            let media = Provider::parse_link(&link)?;
            match media.kind {
                MediaKind::Track => print_json(&provider.track_info(&media.id, args.quality).await?),
                MediaKind::Album => print_json(&provider.album_info(&media.id, None).await?),
                MediaKind::Artist => print_json(&provider.artist_info(&media.id).await?),
                MediaKind::Playlist => print_json(&provider.playlist_info(&media.id).await?),
            }
        }
        Command::Download { link, output_dir } => download(&mut provider, &link, output_dir).await,
        Command::Lyrics { link, synced } => {
            let media = Provider::parse_link(&link)?;
            let lyrics = provider.track_lyrics(&media.id).await?;
            let text = if synced { lyrics.synced } else { lyrics.plain };
            match text {
                Some(text) => print!("{text}"),
                None => info!("no lyrics for track {}", media.id),
            }
            Ok(())
        }
        Command::Cover { link, size, format } => {
            let media = Provider::parse_link(&link)?;
            print_json(&provider.track_cover(&media.id, size, format).await?)
        }
        Command::Search { kind, query, limit } => {
            print_json(&provider.search(kind.into(), &query, limit).await?)
        }
    }
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and runs the requested command.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
