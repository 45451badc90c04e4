use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nova_assistant::voice::{AudioPlayback, FrameSource, TextToSpeech, rms_energy};
use nova_assistant::{Config, Daemon, Overrides};

/// Nova - voice-triggered local command assistant
#[derive(Parser)]
#[command(name = "nova", version, about)]
struct Cli {
    /// Credential for the speech-to-text service
    #[arg(long, env = "NOVA_STT_API_KEY", hide_env_values = true)]
    stt_api_key: Option<String>,

    /// Wake phrase (e.g. "hey nova")
    #[arg(short, long, env = "NOVA_WAKE_PHRASE")]
    wake_phrase: Option<String>,

    /// Wake detection sensitivity, 0.0 to 1.0
    #[arg(long, env = "NOVA_SENSITIVITY")]
    sensitivity: Option<f32>,

    /// Optional keyword model file for the wake engine
    #[arg(long, env = "NOVA_KEYWORD_MODEL")]
    keyword_model: Option<PathBuf>,

    /// Root directory for executable search (repeatable)
    #[arg(long = "search-root", env = "NOVA_SEARCH_ROOTS", value_delimiter = ':')]
    search_roots: Vec<PathBuf>,

    /// Maximum directory depth for executable search
    #[arg(long, env = "NOVA_SEARCH_DEPTH")]
    search_depth: Option<usize>,

    /// Data directory for state files
    #[arg(long, env = "NOVA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log utterances instead of speaking them
    #[arg(long, env = "NOVA_MUTE")]
    mute: bool,

    /// Disable the daily announcement scheduler
    #[arg(long)]
    no_schedule: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Print the built-in and custom command tables
    ListCommands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,nova_assistant=info",
        1 => "info,nova_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(mut cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command.take() {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(cli.stt_api_key.clone(), text).await,
            Command::ListCommands => list_commands(&cli),
        };
    }

    let config = Config::load(overrides_from(&cli))?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        mute = config.mute,
        "starting nova"
    );

    let daemon = Daemon::new(config);
    daemon.run().await?;

    Ok(())
}

fn overrides_from(cli: &Cli) -> Overrides {
    Overrides {
        stt_api_key: cli.stt_api_key.clone(),
        keyword_model: cli.keyword_model.clone(),
        search_roots: cli.search_roots.clone(),
        search_depth: cli.search_depth,
        data_dir: cli.data_dir.clone(),
        wake_phrase: cli.wake_phrase.clone(),
        sensitivity: cli.sensitivity,
        mute: cli.mute,
        no_schedule: cli.no_schedule,
    }
}

/// Test microphone input with a live level meter
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut source = FrameSource::new()?;
    source.start()?;

    println!("Sample rate: {} Hz", source.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = source.take_buffer();
        let energy = rms_energy(&samples);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 200.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | [{meter}]", i + 1);
    }

    source.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working.");
    Ok(())
}

/// Test speaker output with a 440Hz tone
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = 24_000_f32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    playback.play_samples(&samples)?;

    println!("If you heard the tone, your speakers are working.");
    Ok(())
}

/// Test TTS synthesis and playback
///
/// The blocking TTS client must be created and driven off the runtime.
async fn test_tts(api_key: Option<String>, text: String) -> anyhow::Result<()> {
    let api_key = api_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| anyhow::anyhow!("NOVA_STT_API_KEY required for TTS test"))?;

    println!("Testing TTS with text: \"{text}\"\n");

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let tts = TextToSpeech::new(api_key, "tts-1".to_string(), "alloy".to_string(), 1.0)?;

        println!("Synthesizing speech...");
        let mp3_data = tts.synthesize(&text)?;
        println!("Got {} bytes of audio data", mp3_data.len());

        println!("Playing audio...");
        let playback = AudioPlayback::new()?;
        playback.play_mp3(&mp3_data)?;
        Ok(())
    })
    .await??;

    println!("\nIf you heard the speech, TTS is working.");
    Ok(())
}

/// Print the dispatch tables
fn list_commands(cli: &Cli) -> anyhow::Result<()> {
    use nova_assistant::command::{Dispatcher, load_custom_commands};

    let mut overrides = overrides_from(cli);
    // The tables don't need a credential
    overrides.stt_api_key = overrides.stt_api_key.or_else(|| Some("-".to_string()));
    let config = Config::load(overrides)?;

    let custom = load_custom_commands(&config.custom_commands_path)?;
    let dispatcher = Dispatcher::new(custom, config.search.default_suffix);

    println!("Built-in commands:");
    for phrase in dispatcher.builtin_phrases() {
        println!("  {phrase}");
    }

    let custom = dispatcher.custom_commands();
    if custom.is_empty() {
        println!("\nNo custom commands ({})", config.custom_commands_path.display());
    } else {
        println!("\nCustom commands:");
        for cmd in custom {
            println!("  {} -> {:?}", cmd.phrase, cmd.action);
        }
    }

    Ok(())
}
