//! 配置校验模块
//!
//! 校验规则：
//! - path 非空且不以 `/` 结尾
//! - channel_capacity > 0
//! - max_consecutive_read_failures > 0
//! - rotation: signal 在信号表中，size 符合大小语法

use contracts::{ContractError, RelayConfig};

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_path(config)?;
    validate_channel(config)?;
    validate_rotation(config)?;
    Ok(())
}

/// 校验输出路径
fn validate_path(config: &RelayConfig) -> Result<(), ContractError> {
    let raw = config.path.as_os_str();
    if raw.is_empty() {
        return Err(ContractError::config_validation("path", "path must not be empty"));
    }
    if config.path.file_name().is_none() || raw.to_string_lossy().ends_with('/') {
        return Err(ContractError::config_validation(
            "path",
            format!("'{}' does not name a file", config.path.display()),
        ));
    }
    Ok(())
}

/// 校验读取通道参数
fn validate_channel(config: &RelayConfig) -> Result<(), ContractError> {
    if config.channel_capacity == 0 {
        return Err(ContractError::config_validation(
            "channel_capacity",
            "channel_capacity must be > 0",
        ));
    }
    if config.max_consecutive_read_failures == 0 {
        return Err(ContractError::config_validation(
            "max_consecutive_read_failures",
            "max_consecutive_read_failures must be > 0",
        ));
    }
    Ok(())
}

/// 校验轮转策略 (信号名、大小字符串)
fn validate_rotation(config: &RelayConfig) -> Result<(), ContractError> {
    config.rotation.resolve().map(|_| ())
}
