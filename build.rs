use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
struct Config {
    application: Application,
    network: Network,
    audio: Audio,
    hello_message: HelloMessage,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Network {
    ws_url: String,
    ws_token: String,
    device_id: String,
    client_id: String,
}

#[derive(Deserialize)]
struct Audio {
    playback_device: String,
    sample_rate: u32,
    max_channels: u32,
    period_size: usize,
    buffer_periods: usize,
}

#[derive(Deserialize)]
struct HelloMessage {
    format: String,
    sample_rate: u32,
    channels: u8,
    frame_duration: u32,
}

// Read config.toml at compile time and bake it in as environment variables.
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    println!("cargo:rustc-env=WS_URL={}", config.network.ws_url);
    println!("cargo:rustc-env=WS_TOKEN={}", config.network.ws_token);
    println!("cargo:rustc-env=DEVICE_ID={}", config.network.device_id);
    println!("cargo:rustc-env=CLIENT_ID={}", config.network.client_id);

    println!(
        "cargo:rustc-env=AUDIO_PLAYBACK_DEVICE={}",
        config.audio.playback_device
    );
    println!(
        "cargo:rustc-env=AUDIO_SAMPLE_RATE={}",
        config.audio.sample_rate
    );
    println!(
        "cargo:rustc-env=AUDIO_MAX_CHANNELS={}",
        config.audio.max_channels
    );
    println!(
        "cargo:rustc-env=AUDIO_PERIOD_SIZE={}",
        config.audio.period_size
    );
    println!(
        "cargo:rustc-env=AUDIO_BUFFER_PERIODS={}",
        config.audio.buffer_periods
    );

    println!("cargo:rustc-env=HELLO_FORMAT={}", config.hello_message.format);
    println!(
        "cargo:rustc-env=HELLO_SAMPLE_RATE={}",
        config.hello_message.sample_rate
    );
    println!(
        "cargo:rustc-env=HELLO_CHANNELS={}",
        config.hello_message.channels
    );
    println!(
        "cargo:rustc-env=HELLO_FRAME_DURATION={}",
        config.hello_message.frame_duration
    );
}
