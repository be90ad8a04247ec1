//! 可观测性：tracing 订阅器初始化
//!
//! 默认 info，可通过 RUST_LOG 覆盖。日志写到 stderr，stdout 只留给最终答案。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    init_with_level("info");
}

/// 重复初始化时静默忽略（测试中可多次调用）
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok();
}
