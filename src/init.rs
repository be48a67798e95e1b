use env_logger::Env;

/// 初始化日誌，`RUST_LOG` 會覆寫預設等級
pub fn init(default_level: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .try_init();
}
