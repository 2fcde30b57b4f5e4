//! novavoice-cli - command line client for the NovaVoice server.
//!
//! Issues one request per invocation and keeps the session token in the
//! user's config directory between calls.

use std::error::Error;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::json;

use novavoice::api::{
    GenerateResponse, HistoryResponse, LoginResponse, SubscribeResponse, VoicesResponse,
};
use novavoice::db::{UserSummary, Voice};
use novavoice::error::ErrorResponse;

/// Command line client for the NovaVoice server
#[derive(Parser)]
#[command(name = "novavoice-cli")]
#[command(version)]
#[command(about = "Client for the NovaVoice text-to-speech server", long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "NOVAVOICE_URL", default_value = "http://127.0.0.1:8008")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// Log in and store the session token
    Login { email: String, password: String },

    /// Destroy the current session
    Logout,

    /// Show the logged-in account, tier and remaining quota
    Me,

    /// List available voices
    Voices,

    /// Generate speech from text
    Say {
        /// Text to speak
        text: String,
        /// Voice name or id (defaults to the first available voice)
        #[arg(short, long)]
        voice: Option<String>,
        /// Speed multiplier, 0.5 to 2.0
        #[arg(short, long, default_value = "1.0")]
        speed: f64,
        /// Pitch multiplier (accepted by the server, simulated)
        #[arg(short, long, default_value = "1.0")]
        pitch: f64,
        /// Emotion: neutral, happy, sad, excited, angry, serious
        #[arg(short, long, default_value = "neutral")]
        emotion: String,
        /// Where to save the WAV
        #[arg(short, long, default_value = "speech.wav")]
        output: PathBuf,
        /// Play the audio after generating it
        #[arg(long)]
        play: bool,
    },

    /// Register a cloned voice from an audio sample
    Clone {
        /// Name for the new voice
        name: String,
        /// Path to the audio sample
        sample: PathBuf,
        /// Language hint, e.g. en-us
        #[arg(short, long, default_value = "en-us")]
        language: String,
    },

    /// Delete one of your cloned voices
    DeleteVoice { id: String },

    /// Show generation history, newest first
    History,

    /// Download the audio of a past generation
    Fetch {
        id: String,
        #[arg(short, long, default_value = "speech.wav")]
        output: PathBuf,
    },

    /// Delete a past generation
    DeleteGeneration { id: String },

    /// Change subscription tier (simulated payment)
    Subscribe {
        /// basic, premium or ultimate
        tier: String,
        #[arg(long, default_value = "4242424242424242")]
        card_number: String,
        #[arg(long, default_value = "12/30")]
        expiry: String,
        #[arg(long, default_value = "123")]
        cvv: String,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let client = Client::new();
    let server = cli.server.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let response = client
                .post(format!("{}/register", server))
                .json(&json!({ "username": username, "email": email, "password": password }))
                .send()?;
            let user: UserSummary = parse(response)?;
            println!("Registered {} ({} tier). You can log in now.", user.username, user.tier);
        }

        Commands::Login { email, password } => {
            let response = client
                .post(format!("{}/login", server))
                .json(&json!({ "email": email, "password": password }))
                .send()?;
            let login: LoginResponse = parse(response)?;
            save_token(&login.token)?;
            println!(
                "Logged in as {} ({} tier, {} generations left today)",
                login.user.username, login.user.tier, login.user.remaining_today
            );
        }

        Commands::Logout => {
            let token = load_token()?;
            client
                .post(format!("{}/logout", server))
                .bearer_auth(&token)
                .send()?;
            let _ = std::fs::remove_file(token_path()?);
            println!("Logged out.");
        }

        Commands::Me => {
            let token = load_token()?;
            let response = client
                .get(format!("{}/me", server))
                .bearer_auth(&token)
                .send()?;
            let user: UserSummary = parse(response)?;
            println!(
                "{} <{}> on {} tier, {}/{} generations left today",
                user.username, user.email, user.tier, user.remaining_today, user.daily_quota
            );
        }

        Commands::Voices => {
            let token = load_token()?;
            let response = client
                .get(format!("{}/voices", server))
                .bearer_auth(&token)
                .send()?;
            let voices: VoicesResponse = parse(response)?;
            for voice in voices.voices {
                println!("{}  {:?}  {}", voice.id, voice.kind, voice.name);
            }
        }

        Commands::Say {
            text,
            voice,
            speed,
            pitch,
            emotion,
            output,
            play,
        } => {
            let token = load_token()?;
            let voice = resolve_voice(&client, &server, &token, voice.as_deref())?;
            println!("Using voice: {}", voice.name);

            let response = client
                .post(format!("{}/tts/generate", server))
                .bearer_auth(&token)
                .json(&json!({
                    "text": text,
                    "voice_id": voice.id,
                    "speed": speed,
                    "pitch": pitch,
                    "emotion": emotion,
                }))
                .send()?;
            let generated: GenerateResponse = parse(response)?;

            let audio = client
                .get(format!("{}{}", server, generated.audio_url))
                .bearer_auth(&token)
                .send()?
                .error_for_status()?
                .bytes()?;
            std::fs::write(&output, &audio)?;
            println!("Saved {} bytes to {}", audio.len(), output.display());

            if play {
                play_audio(audio.to_vec())?;
            }
        }

        Commands::Clone {
            name,
            sample,
            language,
        } => {
            let token = load_token()?;
            let bytes = std::fs::read(&sample)?;
            let response = client
                .post(format!("{}/voice/clone", server))
                .bearer_auth(&token)
                .json(&json!({
                    "name": name,
                    "sample_base64": BASE64.encode(&bytes),
                    "language": language,
                }))
                .send()?;
            let voice: Voice = parse(response)?;
            println!("Cloned voice '{}' ({})", voice.name, voice.id);
        }

        Commands::DeleteVoice { id } => {
            let token = load_token()?;
            let response = client
                .delete(format!("{}/voice/{}", server, id))
                .bearer_auth(&token)
                .send()?;
            expect_no_content(response)?;
            println!("Voice deleted.");
        }

        Commands::History => {
            let token = load_token()?;
            let response = client
                .get(format!("{}/history", server))
                .bearer_auth(&token)
                .send()?;
            let history: HistoryResponse = parse(response)?;
            if history.history.is_empty() {
                println!("No generations yet.");
            }
            for entry in history.history {
                let preview: String = entry.text.chars().take(60).collect();
                println!(
                    "{}  {}  [{}]  {}",
                    entry.id, entry.created_at, entry.voice_name, preview
                );
            }
        }

        Commands::Fetch { id, output } => {
            let token = load_token()?;
            let audio = client
                .get(format!("{}/audio/{}", server, id))
                .bearer_auth(&token)
                .send()?
                .error_for_status()?
                .bytes()?;
            std::fs::write(&output, &audio)?;
            println!("Saved {} bytes to {}", audio.len(), output.display());
        }

        Commands::DeleteGeneration { id } => {
            let token = load_token()?;
            let response = client
                .delete(format!("{}/history/{}", server, id))
                .bearer_auth(&token)
                .send()?;
            expect_no_content(response)?;
            println!("Generation deleted.");
        }

        Commands::Subscribe {
            tier,
            card_number,
            expiry,
            cvv,
        } => {
            let token = load_token()?;
            let response = client
                .post(format!("{}/subscribe", server))
                .bearer_auth(&token)
                .json(&json!({
                    "tier": capitalize(&tier),
                    "card": { "number": card_number, "expiry": expiry, "cvv": cvv },
                }))
                .send()?;
            let result: SubscribeResponse = parse(response)?;
            println!("{}", result.message);
        }
    }

    Ok(())
}

/// Match a voice by id or by (case-insensitive) name fragment.
fn resolve_voice(
    client: &Client,
    server: &str,
    token: &str,
    wanted: Option<&str>,
) -> Result<Voice, Box<dyn Error>> {
    let response = client
        .get(format!("{}/voices", server))
        .bearer_auth(token)
        .send()?;
    let voices: VoicesResponse = parse(response)?;

    let Some(wanted) = wanted else {
        return voices
            .voices
            .into_iter()
            .next()
            .ok_or_else(|| "no voices available".into());
    };

    let needle = wanted.to_lowercase();
    voices
        .voices
        .into_iter()
        .find(|v| v.id.to_string() == needle || v.name.to_lowercase().contains(&needle))
        .ok_or_else(|| format!("no voice matching '{}'", wanted).into())
}

fn parse<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<T, Box<dyn Error>> {
    if response.status().is_success() {
        Ok(response.json()?)
    } else {
        Err(server_error(response))
    }
}

fn expect_no_content(response: reqwest::blocking::Response) -> Result<(), Box<dyn Error>> {
    if response.status() == StatusCode::NO_CONTENT || response.status().is_success() {
        Ok(())
    } else {
        Err(server_error(response))
    }
}

fn server_error(response: reqwest::blocking::Response) -> Box<dyn Error> {
    let status = response.status();
    match response.json::<ErrorResponse>() {
        Ok(body) => format!("{} ({})", body.error, status).into(),
        Err(_) => format!("server returned {}", status).into(),
    }
}

fn token_path() -> Result<PathBuf, Box<dyn Error>> {
    let dir = dirs::config_dir()
        .ok_or("no config directory available")?
        .join("novavoice");
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("session"))
}

fn save_token(token: &str) -> Result<(), Box<dyn Error>> {
    std::fs::write(token_path()?, token)?;
    Ok(())
}

fn load_token() -> Result<String, Box<dyn Error>> {
    let path = token_path()?;
    std::fs::read_to_string(&path)
        .map(|t| t.trim().to_string())
        .map_err(|_| "not logged in (run `novavoice-cli login` first)".into())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(feature = "audio-playback")]
fn play_audio(wav_data: Vec<u8>) -> Result<(), Box<dyn Error>> {
    use std::io::Cursor;

    let (_stream, stream_handle) = rodio::OutputStream::try_default()?;
    let sink = rodio::Sink::try_new(&stream_handle)?;
    sink.append(rodio::Decoder::new(Cursor::new(wav_data))?);
    sink.sleep_until_end();
    Ok(())
}

#[cfg(not(feature = "audio-playback"))]
fn play_audio(_wav_data: Vec<u8>) -> Result<(), Box<dyn Error>> {
    Err("built without the audio-playback feature".into())
}
