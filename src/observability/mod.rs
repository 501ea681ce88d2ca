//! 可观测性模块
//!
//! 提供 Prometheus 指标、结构化日志和健康检查。

use axum::{Json, Router, response::IntoResponse, routing::get};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// ===== Simple Metrics (using atomics for zero-dep implementation) =====

/// 引擎运行指标
#[derive(Clone, Default)]
pub struct EngineMetrics {
    pub responses_total: Arc<AtomicU64>,
    pub response_time_ms_sum: Arc<AtomicU64>,
    pub no_match_total: Arc<AtomicU64>,
    pub srai_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
    pub categories_loaded: Arc<AtomicUsize>,
    pub predicates_cached: Arc<AtomicUsize>,
}

impl EngineMetrics {
    /// 记录一次响应及其耗时
    pub fn record_response(&self, duration_ms: u64) {
        self.responses_total.fetch_add(1, Ordering::SeqCst);
        self.response_time_ms_sum
            .fetch_add(duration_ms, Ordering::SeqCst);
    }

    /// 记录一次未命中
    pub fn record_no_match(&self) {
        self.no_match_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录一次符号归约
    pub fn record_srai(&self) {
        self.srai_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录错误
    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 更新已加载分类数
    pub fn set_categories_loaded(&self, count: usize) {
        self.categories_loaded.store(count, Ordering::SeqCst);
    }

    /// 更新缓存中的谓词值数
    pub fn set_predicates_cached(&self, count: usize) {
        self.predicates_cached.store(count, Ordering::SeqCst);
    }

    /// 平均响应耗时（毫秒）
    pub fn average_response_time_ms(&self) -> f64 {
        let count = self.responses_total.load(Ordering::SeqCst);
        if count == 0 {
            return 0.0;
        }
        self.response_time_ms_sum.load(Ordering::SeqCst) as f64 / count as f64
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP responses_total Total responses produced
# TYPE responses_total counter
responses_total {}
# HELP response_time_seconds Response time in seconds
# TYPE response_time_seconds histogram
response_time_seconds_sum {}
response_time_seconds_count {}
# HELP no_match_total Sentences with no category match
# TYPE no_match_total counter
no_match_total {}
# HELP srai_total Symbolic reductions performed
# TYPE srai_total counter
srai_total {}
# HELP errors_total Total errors
# TYPE errors_total counter
errors_total {}
# HELP categories_loaded Categories currently loaded
# TYPE categories_loaded gauge
categories_loaded {}
# HELP predicates_cached Predicate values currently cached
# TYPE predicates_cached gauge
predicates_cached {}
"#,
            self.responses_total.load(Ordering::SeqCst),
            self.response_time_ms_sum.load(Ordering::SeqCst) as f64 / 1000.0,
            self.responses_total.load(Ordering::SeqCst),
            self.no_match_total.load(Ordering::SeqCst),
            self.srai_total.load(Ordering::SeqCst),
            self.errors_total.load(Ordering::SeqCst),
            self.categories_loaded.load(Ordering::SeqCst),
            self.predicates_cached.load(Ordering::SeqCst),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
}

/// 应用状态（用于健康检查）
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<EngineMetrics>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(metrics: Arc<EngineMetrics>, version: String) -> Self {
        Self {
            metrics,
            start_time: Utc::now(),
            version,
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(
    state: axum::extract::State<Arc<ObservabilityState>>,
) -> impl IntoResponse {
    let health_status = HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    };
    (axum::http::StatusCode::OK, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// Prometheus 指标端点
pub async fn metrics(state: axum::extract::State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let output = state.metrics.gather();
    (axum::http::StatusCode::OK, output)
}

/// 版本信息端点
pub async fn version(state: axum::extract::State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化结构化日志
pub fn init_tracing(service_name: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| format!("info,{}", service_name));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}
