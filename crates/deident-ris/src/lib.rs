//! # RIS数据访问模块
//!
//! 以只读方式访问RIS关系库：候选患者清单与最新报告文本，
//! 并提供报告文本的规范化。

pub mod connection;
pub mod queries;
pub mod report;

pub use connection::RisPool;
pub use queries::RisQueries;
pub use report::normalize_report;
