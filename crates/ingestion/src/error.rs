//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 读取输入流失败（不可恢复）
    #[error("failed to read input: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// 连续的瞬时错误次数超过上限
    #[error("input failed {attempts} times in a row, giving up: {source}")]
    TooManyFailures {
        /// 连续失败次数
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
