//! 行转发与轮转指标
//!
//! 通过 `metrics` facade 记录；未安装 recorder 时调用为空操作。

use std::collections::HashMap;
use std::fmt;

use metrics::{counter, gauge};

/// 记录一行写入 sink (`bytes` 包含换行符)
pub fn record_line_relayed(bytes: usize) {
    counter!("rotator_lines_relayed_total").increment(1);
    counter!("rotator_bytes_written_total").increment(bytes as u64);
}

/// 记录一次完成的轮转
pub fn record_rotation(policy: &str, reason: &str, generation: u64) {
    counter!(
        "rotator_rotations_total",
        "policy" => policy.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
    record_sink_generation(generation);
}

/// 当前 sink 句柄的代数
pub fn record_sink_generation(generation: u64) {
    gauge!("rotator_sink_generation").set(generation as f64);
}

/// 按 (policy, reason) 聚合轮转次数
///
/// 在内存中聚合，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RotationTally {
    counts: HashMap<(String, String), u64>,
}

impl RotationTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, policy: &str, reason: &str) {
        *self
            .counts
            .entry((policy.to_string(), reason.to_string()))
            .or_insert(0) += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn count(&self, policy: &str, reason: &str) -> u64 {
        self.counts
            .get(&(policy.to_string(), reason.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl fmt::Display for RotationTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return write!(f, "no rotations");
        }
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort();
        for (i, ((policy, reason), count)) in entries.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{policy}/{reason}={count}")?;
        }
        Ok(())
    }
}
