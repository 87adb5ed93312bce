// vocalize - Speak text with Amazon Polly voices from the terminal

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use speech_client::provider::DEFAULT_TEXT;
use speech_client::{ApiGatewayClient, ClientConfig, Voice};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use vocalize::audio::{CommandPlayer, PlaybackStatus, ResourceBuilder};
use vocalize::config::VocalizeConfig;
use vocalize::coordinator::Coordinator;
use vocalize::interactive;

#[derive(Parser, Debug)]
#[command(name = "vocalize")]
#[command(about = "Speak text with Amazon Polly voices", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Speak text once and wait for playback to finish
    Speak {
        /// Text to speak (read from stdin when omitted)
        text: Vec<String>,

        /// Voice to use (Joanna, Matthew, Nicole, Russell)
        #[arg(short, long)]
        voice: Option<Voice>,

        /// Also save the audio to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not play the audio
        #[arg(long)]
        no_play: bool,
    },
    /// Interactive session (default)
    Interactive {
        /// Voice to start with
        #[arg(short, long)]
        voice: Option<Voice>,
    },
    /// List available voices
    Voices,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the API gateway URL
    SetEndpoint {
        /// Root URL, e.g. https://abc123.execute-api.us-east-2.amazonaws.com/dev
        url: String,
    },
    /// Set default voice
    SetVoice {
        /// Voice name
        voice: Voice,
    },
    /// Set the audio player command (empty string to auto-detect)
    SetPlayer {
        /// Player command line; the audio file is appended as the last argument
        command: String,
    },
    /// Set request timeout
    SetTimeout {
        /// Timeout in seconds
        seconds: u64,
    },
    /// Set the environment variable that holds the API key (empty string to disable)
    SetApiKeyEnv {
        /// Variable name
        var: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Some(Commands::Config { action }) => handle_config_command(action),
        Some(Commands::Voices) => list_voices(),
        Some(Commands::Speak {
            text,
            voice,
            output,
            no_play,
        }) => speak_once(text, voice, output, no_play).await,
        Some(Commands::Interactive { voice }) => run_interactive(voice).await,
        None => run_interactive(None).await,
    }
}

/// Load config and build the speech client it describes
fn init_client(config: &VocalizeConfig) -> Result<ApiGatewayClient> {
    let client_config = config.client_config()?;
    let client = ApiGatewayClient::from_config(&client_config)
        .context("Failed to initialize speech client")?;
    log::debug!("Speech client: {:?}", client);
    Ok(client)
}

fn read_text(words: Vec<String>) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(DEFAULT_TEXT.to_string());
    }

    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(text.trim().to_string())
}

async fn speak_once(
    words: Vec<String>,
    voice: Option<Voice>,
    output: Option<PathBuf>,
    no_play: bool,
) -> Result<()> {
    if no_play && output.is_none() {
        bail!("--no-play needs --output, otherwise the audio goes nowhere");
    }

    let text = read_text(words)?;
    if text.is_empty() {
        bail!("Nothing to speak");
    }

    let config = VocalizeConfig::load().context("Failed to load configuration")?;
    let client = init_client(&config)?;
    let player = CommandPlayer::detect(config.player.as_deref());

    let mut coordinator =
        Coordinator::new(client, player, ResourceBuilder::new()).with_autoplay(!no_play);
    coordinator.set_voice(voice.unwrap_or(config.voice));
    coordinator.set_text(text);

    eprintln!("Generating audio ({})...", coordinator.state().voice.label());

    let result = match coordinator.speak().await {
        Some(result) => result,
        None => bail!("A request is already in flight"),
    };

    // The audio is kept even when playing it failed
    if let (Some(handle), Some(path)) = (coordinator.handle(), &output) {
        handle
            .save_to(path)
            .with_context(|| format!("Failed to save audio to {}", path.display()))?;
        eprintln!("Saved {} ({} bytes)", path.display(), handle.len());
    }
    result?;

    if coordinator.state().playback == PlaybackStatus::Playing {
        eprintln!("Playing... (Ctrl-C to stop)");
        let interrupted = tokio::select! {
            result = coordinator.wait_playback() => {
                result?;
                false
            }
            _ = tokio::signal::ctrl_c() => true,
        };

        if interrupted {
            coordinator.stop();
            eprintln!();
            eprintln!("Stopped");
        }
    }

    Ok(())
}

async fn run_interactive(voice: Option<Voice>) -> Result<()> {
    let config = VocalizeConfig::load().context("Failed to load configuration")?;
    let client = init_client(&config)?;
    let player = CommandPlayer::detect(config.player.as_deref());

    let mut coordinator = Coordinator::new(client, player, ResourceBuilder::new());
    coordinator.subscribe(interactive::terminal_observer());
    coordinator.set_voice(voice.unwrap_or(config.voice));

    interactive::run(&mut coordinator).await
}

fn list_voices() -> Result<()> {
    let config = VocalizeConfig::load()?;

    println!("Available voices:");
    println!();
    for voice in Voice::ALL {
        if voice == config.voice {
            println!("  {} (default)", voice.label());
        } else {
            println!("  {}", voice.label());
        }
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = VocalizeConfig::load()?;
            println!("Configuration file: {:?}", VocalizeConfig::config_path()?);
            println!();
            if config.endpoint.is_empty() {
                println!("endpoint = (not set)");
            } else {
                println!("endpoint = \"{}\"", config.endpoint);
            }
            println!("path = \"{}\"", config.path);
            println!("voice = \"{}\"", config.voice);
            match &config.api_key_env {
                Some(var) => println!("api_key_env = \"{}\"", var),
                None => println!("api_key_env = (none)"),
            }
            match &config.player {
                Some(player) => println!("player = \"{}\"", player),
                None => println!("player = (auto-detect)"),
            }
            println!("timeout_secs = {}", config.timeout_secs);
        }
        ConfigAction::SetEndpoint { url } => {
            // Validate before saving
            ClientConfig::new(&url).url()?;
            let mut config = VocalizeConfig::load()?;
            config.endpoint = url.trim().trim_end_matches('/').to_string();
            config.save()?;
            println!("Endpoint set to: {}", config.endpoint);
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = VocalizeConfig::load()?;
            config.voice = voice;
            config.save()?;
            println!("Default voice set to: {}", voice.label());
        }
        ConfigAction::SetPlayer { command } => {
            let mut config = VocalizeConfig::load()?;
            let command = command.trim();
            config.player = (!command.is_empty()).then(|| command.to_string());
            config.save()?;
            match &config.player {
                Some(player) => println!("Player set to: {}", player),
                None => println!("Player will be auto-detected"),
            }
        }
        ConfigAction::SetTimeout { seconds } => {
            if seconds == 0 {
                bail!("Timeout must be at least 1 second");
            }
            let mut config = VocalizeConfig::load()?;
            config.timeout_secs = seconds;
            config.save()?;
            println!("Request timeout set to: {}s", seconds);
        }
        ConfigAction::SetApiKeyEnv { var } => {
            let mut config = VocalizeConfig::load()?;
            let var = var.trim();
            config.api_key_env = (!var.is_empty()).then(|| var.to_string());
            config.save()?;
            match &config.api_key_env {
                Some(var) => println!("API key will be read from: {}", var),
                None => println!("API key disabled"),
            }
        }
    }
    Ok(())
}
