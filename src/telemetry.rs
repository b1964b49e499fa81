//! 结构化日志与业务指标
//! 指标走 metrics 门面，未安装导出器时计数调用为空操作

use crate::config::AppConfig;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn fmt_layer(format: &str) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer().with_target(false);
    match format {
        // 生产环境：每个请求 span 结束时输出一行，带耗时
        "json" => base.json().with_span_events(FmtSpan::CLOSE).boxed(),
        "pretty" => base.pretty().boxed(),
        _ => base.compact().boxed(),
    }
}

/// RUST_LOG 优先于配置中的级别
pub fn init_telemetry(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let format = config.logging.format.to_lowercase();

    tracing_subscriber::registry()
        .with(fmt_layer(&format).with_filter(filter))
        .init();

    tracing::info!(level = %config.logging.level, format = %format, "Telemetry initialized");
}

/// 分发器每次放行或拒绝都计一次
pub fn record_authz_decision(resource: &'static str, allowed: bool) {
    let outcome = if allowed { "allowed" } else { "denied" };
    metrics::counter!("authz_decisions_total", "resource" => resource, "outcome" => outcome)
        .increment(1);
}

/// 记录生命周期状态变更
pub fn record_transition(entity: &'static str, kind: &'static str) {
    metrics::counter!("lifecycle_transitions_total", "entity" => entity, "kind" => kind)
        .increment(1);
}
