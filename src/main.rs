mod audio;
mod config;
mod controller;
mod net_link;
mod protocol;

use audio::{AudioConfig, AudioSystem};
use config::Config;
use controller::Controller;
use mac_address::get_mac_address;
use net_link::{NetCommand, NetEvent, NetLink};
use tokio::signal;
use tokio::sync::mpsc;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let mut config = Config::new().unwrap_or_default();

    // 设备id的处理：优先MAC地址，保证重启间身份一致
    if config.device_id == "unknown-device" {
        config.device_id = match get_mac_address() {
            Ok(Some(mac)) => mac.to_string().to_lowercase(),
            _ => Uuid::new_v4().to_string(),
        };
    }

    // 客户端UUID，先从本地文件读取，如果不存在则生成新的并保存
    let uuid_file_path = "voicetrack_uuid.txt";
    if config.client_id == "unknown-client" {
        if let Ok(content) = std::fs::read_to_string(uuid_file_path) {
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                config.client_id = trimmed.to_string();
            }
        }
    }
    if config.client_id == "unknown-client" {
        config.client_id = Uuid::new_v4().to_string();
        if let Err(e) = std::fs::write(uuid_file_path, &config.client_id) {
            log::warn!("Failed to save Client ID to file: {}", e);
        }
    }
    log::info!(
        "{} v{} — device {}, client {}",
        env!("APP_NAME"),
        env!("APP_VERSION"),
        config.device_id,
        config.client_id,
    );

    // 打开声卡并启动播放线程；通道表大小由实际协商的参数决定
    let audio_config = AudioConfig {
        playback_device: config.playback_device.to_string(),
        sample_rate: config.sample_rate,
        max_channels: config.max_channels,
        period_size: config.period_size,
        buffer_periods: config.buffer_periods,
    };
    let mut audio_system = AudioSystem::start(&audio_config)?;
    let table = audio_system.table();

    // 事件与命令通道
    let (tx_net_event, mut rx_net_event) = mpsc::channel::<NetEvent>(100);
    let (tx_net_cmd, rx_net_cmd) = mpsc::channel::<NetCommand>(100);

    // 启动网络链接，与会话服务器通信
    let net_link = NetLink::new(config.clone(), tx_net_event, rx_net_cmd);
    tokio::spawn(async move {
        net_link.run().await;
    });

    // 主事件循环
    let mut controller = Controller::new(table.clone(), tx_net_cmd);
    log::info!("Voicetrack Core Started ({} output channels)", table.len());

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }
            event = rx_net_event.recv() => {
                match event {
                    Some(event) => controller.handle_net_event(event).await,
                    None => {
                        log::warn!("Network event channel closed");
                        break;
                    }
                }
            }
        }
    }

    table.release_all();
    audio_system.stop();
    Ok(())
}
