//! # Exposure
//!
//! 曝光调度与文件命名。
//!
//! 负责：
//! - 按本地挂钟时间计算每次曝光的触发时刻 (`HH:MM + index * interval`)
//! - 迟到的曝光立即执行并记录日志，不跳过
//! - 为每个单元生成唯一的序列号与目标路径
//!
//! ## 使用示例
//!
//! ```ignore
//! use exposure::{ArtifactNamer, ExposureScheduler};
//!
//! let scheduler = ExposureScheduler::new(config.schedule()?);
//! let namer = ArtifactNamer::new(scheduler.spec(), &unit, unit_count, camera, scheduler.obs_day());
//!
//! for index in 0..num_exposures {
//!     scheduler.wait_for(index).await;
//!     let path = namer.artifact_path(index);
//! }
//! ```

mod clock;
mod namer;
mod scheduler;

pub use clock::{Clock, FixedClock, OffsetClock, SystemClock};
pub use namer::{sequence_scale, ArtifactNamer};
pub use scheduler::{ExposureScheduler, WaitOutcome};
