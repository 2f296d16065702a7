//! 曝光/传输指标收集模块
//!
//! 通过 `metrics` facade 记录调度、暂存与传输指标；
//! `RunningStats` 在内存中聚合耗时，用于运行结束后的报告。

use metrics::{counter, histogram};

/// 记录一次曝光触发
pub fn record_exposure(unit: &str) {
    counter!("camxfer_exposures_total", "unit" => unit.to_string()).increment(1);
}

/// 记录迟到的曝光 (秒)
pub fn record_exposure_late(late_secs: f64) {
    histogram!("camxfer_exposure_late_seconds").record(late_secs);
}

/// 记录暂存拷贝耗时
pub fn record_staging_copy_ms(elapsed_ms: f64) {
    histogram!("camxfer_staging_copy_ms").record(elapsed_ms);
}

/// 记录压缩耗时
pub fn record_staging_compress_ms(elapsed_ms: f64) {
    histogram!("camxfer_staging_compress_ms").record(elapsed_ms);
}

/// 记录一次传输结果
///
/// `bytes` 仅在成功时累计。
pub fn record_transfer(backend: &str, success: bool, elapsed_ms: f64, bytes: u64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "camxfer_transfers_total",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("camxfer_transfer_ms", "backend" => backend.to_string()).record(elapsed_ms);

    if success {
        counter!("camxfer_transfer_bytes_total", "backend" => backend.to_string())
            .increment(bytes);
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 合并另一组统计 (Chan et al. 并行算法)
    pub fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let total = self.count + other.count;
        let delta = other.mean - self.mean;
        let mean = self.mean + delta * other.count as f64 / total as f64;
        let m2 = self.m2
            + other.m2
            + delta * delta * self.count as f64 * other.count as f64 / total as f64;

        self.count = total;
        self.mean = mean;
        self.m2 = m2;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
