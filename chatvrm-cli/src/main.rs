// ChatVRM Command Line Interface
// Segment, script, rehearse and voice avatar replies from the terminal

mod console;
mod rehearsal;

use anyhow::{bail, Context};
use chatvrm_core::{ChatVrmConfig, VoiceParams};
use chatvrm_llm::{collect_reply, ChatProvider, GeminiClient, Message};
use chatvrm_script::{text_to_screenplay, Segmenter};
use chatvrm_spk::{synthesize_voice, KoeiromapClient};
use clap::{Parser, Subcommand};
use console::{InteractiveConsole, SYSTEM_PROMPT};
use rehearsal::{rehearse, RehearsalOptions};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatvrm")]
#[command(about = "ChatVRM Command Line Interface - scripted, voiced avatar replies", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short, global = true)]
    config: Option<String>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split text into speakable chunks
    Segment {
        /// Text to split (read from stdin when omitted)
        text: Option<String>,

        /// Maximum chunk length in UTF-16 code units, 0 disables wrapping
        #[arg(long)]
        max_length: Option<usize>,
    },

    /// Turn tagged text into screenplay JSON
    Screenplay {
        /// Tagged text (read from stdin when omitted)
        text: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        speaker_x: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        speaker_y: Option<f64>,
    },

    /// Play tagged text through the expression controller and print weight writes
    Rehearse {
        /// Tagged text (read from stdin when omitted)
        text: Option<String>,

        /// Simulated frames per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Simulated speaking time per character, in seconds
        #[arg(long, default_value = "0.1")]
        secs_per_char: f64,
    },

    /// Ask Gemini for a reply and print its screenplay
    Chat {
        /// User message
        prompt: String,

        /// Override the character prompt
        #[arg(long)]
        system: Option<String>,
    },

    /// Synthesize every chunk of tagged text to audio files
    Speak {
        /// Tagged text (read from stdin when omitted)
        text: Option<String>,

        /// Output directory
        #[arg(long, short, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Interactive multi-turn chat
    Console,
}

fn load_config(path: Option<&str>) -> anyhow::Result<ChatVrmConfig> {
    let mut config = match path {
        Some(path) => ChatVrmConfig::from_file(path)?,
        None => ChatVrmConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn read_text(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Segment { text, max_length } => {
            if let Some(max_length) = max_length {
                config.segmenter.max_length = max_length;
                config.segmenter.validate().map_err(anyhow::Error::msg)?;
            }
            let text = read_text(text)?;
            let segmenter = Segmenter::new(&config.segmenter);
            for chunk in segmenter.split(&text) {
                println!("{}", serde_json::to_string(chunk)?);
            }
        }
        Commands::Screenplay { text, speaker_x, speaker_y } => {
            let voice = VoiceParams::new(
                speaker_x.unwrap_or(config.voice.speaker_x),
                speaker_y.unwrap_or(config.voice.speaker_y),
            );
            voice.validate().map_err(anyhow::Error::msg)?;
            let text = read_text(text)?;
            let screenplays = text_to_screenplay(&text, voice, &config.segmenter);
            println!("{}", serde_json::to_string_pretty(&screenplays)?);
        }
        Commands::Rehearse { text, fps, secs_per_char } => {
            if fps == 0 || !(secs_per_char.is_finite() && secs_per_char > 0.0) {
                bail!("fps and secs-per-char must be positive");
            }
            let text = read_text(text)?;
            let screenplays = text_to_screenplay(&text, config.voice, &config.segmenter);
            let frames = rehearse(&screenplays, &config.expression, RehearsalOptions { fps, secs_per_char });
            for frame in &frames {
                println!("{:>8.3}s  {:<10} {:.3}", frame.time, frame.preset.as_str(), frame.weight);
            }
            info!("Rehearsed {} screenplays, {} writes", screenplays.len(), frames.len());
        }
        Commands::Chat { prompt, system } => {
            let client = GeminiClient::new(config.gemini.clone())?;
            let messages = vec![
                Message::system(system.unwrap_or_else(|| SYSTEM_PROMPT.to_string())),
                Message::user(prompt),
            ];
            let reply = collect_reply(client.chat_stream(&messages).await?).await?;
            debug!("Reply: {}", reply);
            let screenplays = text_to_screenplay(&reply, config.voice, &config.segmenter);
            println!("{}", serde_json::to_string_pretty(&screenplays)?);
        }
        Commands::Speak { text, out_dir } => {
            let client = KoeiromapClient::new(config.koeiromap.clone())?;
            let text = read_text(text)?;
            let screenplays = text_to_screenplay(&text, config.voice, &config.segmenter);
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;

            for (i, play) in screenplays.iter().enumerate() {
                if play.talk.message.trim().is_empty() {
                    continue;
                }
                let clip = synthesize_voice(&client, &play.talk, None).await?;
                let path = out_dir.join(format!("{:03}.{}", i, clip.extension()));
                std::fs::write(&path, &clip.data)?;
                println!("{}\t{}\t{}", path.display(), play.expression, play.talk.message.trim_end());
            }
        }
        Commands::Console => {
            let client = GeminiClient::new(config.gemini.clone())?;
            InteractiveConsole::new(&client, config.segmenter.clone(), config.voice)
                .run()
                .await?;
        }
    }

    Ok(())
}
