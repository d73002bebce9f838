//! # 去标识化流水线模块
//!
//! 提供完整的检查去标识化批处理能力，包括：
//! - 标识调和：外部患者号与PACS内部患者标识的映射
//! - 检查选择：多个匹配时的确定性挑选策略
//! - 文档渲染：规范化报告文本到PDF字节流
//! - 编排器：逐患者推进各阶段并隔离单个患者的失败

pub mod identity;
pub mod render;
pub mod runner;
pub mod select;
pub mod services;
pub mod stage;

pub use identity::{build_identity_map, reconcile, IdentityMap};
pub use render::render_report;
pub use runner::Pipeline;
pub use select::newest_study;
pub use services::{OrthancArchive, PacsService, ReportService, RisReports};
pub use stage::{Outcome, RunSummary, SkipReason, Stage};
