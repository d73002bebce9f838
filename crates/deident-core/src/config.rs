//! 配置管理
//!
//! 配置在进程启动时装载一次，随后以只读方式传入各组件，
//! 叶子组件不自行读取任何配置来源。

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{DeidentError, Result};

/// 流水线完整配置
///
/// 来源优先级：内置默认值 < 可选TOML文件 < 环境变量。
/// 环境变量使用`DEIDENT`前缀与双下划线分段，例如`DEIDENT__PACS__URL`。
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// PACS归档配置
    pub pacs: PacsConfig,
    /// RIS数据库配置
    pub ris: RisConfig,
    /// 流水线行为配置
    pub pipeline: PipelineConfig,
}

/// PACS归档配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacsConfig {
    /// REST端点URL
    pub url: String,
    /// 基本认证用户名
    pub username: String,
    /// 基本认证密码
    pub password: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

/// RIS数据库配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RisConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// 连接池上限
    pub max_connections: u32,
}

/// 流水线行为配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// RIS候选患者筛选使用的检查类型编码
    pub exam_type: i32,
    /// 检查查询返回条数上限
    pub query_limit: u32,
    /// 附加文档序列的描述文本
    pub series_description: String,
}

impl Default for PacsConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8042".to_string(),
            username: "orthanc".to_string(),
            password: "orthanc".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for RisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "ris".to_string(),
            password: String::new(),
            database: "ris".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            exam_type: 23,
            query_limit: 101,
            series_description: "Report".to_string(),
        }
    }
}

impl AppConfig {
    /// 从可选配置文件与环境变量装载配置
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("DEIDENT").separator("__"))
            .build()
            .map_err(|e| DeidentError::Config(e.to_string()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| DeidentError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 校验配置项
    pub fn validate(&self) -> Result<()> {
        if self.pacs.url.is_empty() {
            return Err(DeidentError::Config("PACS url cannot be empty".to_string()));
        }
        if self.ris.host.is_empty() {
            return Err(DeidentError::Config("RIS host cannot be empty".to_string()));
        }
        if self.ris.port == 0 {
            return Err(DeidentError::Config("RIS port cannot be 0".to_string()));
        }
        if self.ris.database.is_empty() {
            return Err(DeidentError::Config(
                "RIS database name cannot be empty".to_string(),
            ));
        }
        if self.pipeline.query_limit == 0 {
            return Err(DeidentError::Config(
                "study query limit cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ris.port, 3306);
        assert_eq!(config.pipeline.query_limit, 101);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AppConfig::default();
        config.ris.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pacs.url.clear();
        assert!(config.validate().is_err());
    }
}
