//! # 去标识化核心模块
//!
//! 提供统一的错误定义与进程级配置管理。

pub mod config;
pub mod error;

pub use config::{AppConfig, PacsConfig, PipelineConfig, RisConfig};
pub use error::{DeidentError, Result};
