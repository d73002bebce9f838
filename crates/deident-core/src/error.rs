//! 错误定义模块

use thiserror::Error;

/// 去标识化流水线统一错误类型
///
/// Config在任何处理开始前即中止进程；Database与Pacs只对当前患者致命；
/// NotFound表示可恢复的缺失，由编排器转为跳过。
#[derive(Error, Debug)]
pub enum DeidentError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("RIS数据库错误: {0}")]
    Database(String),

    #[error("PACS请求错误: {0}")]
    Pacs(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("文档渲染错误: {0}")]
    Render(String),
}

/// 统一结果类型
pub type Result<T> = std::result::Result<T, DeidentError>;
