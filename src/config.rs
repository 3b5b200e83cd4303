#[derive(Debug, Clone)]
pub struct Config {
    // 网络配置（静态部分）
    pub ws_url: &'static str,
    pub ws_token: &'static str,

    // 设备标识（动态部分，可在运行时修改）
    pub device_id: String,
    pub client_id: String,

    // 音频输出配置
    pub playback_device: &'static str,
    pub sample_rate: u32,
    pub max_channels: u32,
    pub period_size: usize,
    pub buffer_periods: usize,

    // Hello消息参数
    pub hello_format: &'static str,
    pub hello_sample_rate: u32,
    pub hello_channels: u8,
    pub hello_frame_duration: u32,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            ws_url: env!("WS_URL"),
            ws_token: env!("WS_TOKEN"),

            device_id: env!("DEVICE_ID").to_string(),
            client_id: env!("CLIENT_ID").to_string(),

            playback_device: env!("AUDIO_PLAYBACK_DEVICE"),
            sample_rate: env!("AUDIO_SAMPLE_RATE")
                .parse()
                .map_err(|_| "Failed to parse AUDIO_SAMPLE_RATE")?,
            max_channels: env!("AUDIO_MAX_CHANNELS")
                .parse()
                .map_err(|_| "Failed to parse AUDIO_MAX_CHANNELS")?,
            period_size: env!("AUDIO_PERIOD_SIZE")
                .parse()
                .map_err(|_| "Failed to parse AUDIO_PERIOD_SIZE")?,
            buffer_periods: env!("AUDIO_BUFFER_PERIODS")
                .parse()
                .map_err(|_| "Failed to parse AUDIO_BUFFER_PERIODS")?,

            hello_format: env!("HELLO_FORMAT"),
            hello_sample_rate: env!("HELLO_SAMPLE_RATE")
                .parse()
                .map_err(|_| "Failed to parse HELLO_SAMPLE_RATE")?,
            hello_channels: env!("HELLO_CHANNELS")
                .parse()
                .map_err(|_| "Failed to parse HELLO_CHANNELS")?,
            hello_frame_duration: env!("HELLO_FRAME_DURATION")
                .parse()
                .map_err(|_| "Failed to parse HELLO_FRAME_DURATION")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
