//! 流水线阶段与运行结果

use std::fmt;

use deident_core::DeidentError;

/// 单个患者处理过程中最近完成的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Mapped,
    StudyFound,
    Anonymized,
    ReportFetched,
    Rendered,
    Published,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Mapped => "mapped",
            Stage::StudyFound => "study-found",
            Stage::Anonymized => "anonymized",
            Stage::ReportFetched => "report-fetched",
            Stage::Rendered => "rendered",
            Stage::Published => "published",
        };
        write!(f, "{}", name)
    }
}

/// 患者被跳过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 标识映射中没有对应的PACS患者
    NotMapped,
    /// 没有匹配的检查
    NoMatchingStudy,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NotMapped => "not mapped in PACS",
            SkipReason::NoMatchingStudy => "no matching study",
        };
        write!(f, "{}", reason)
    }
}

/// 单个患者的处理结果
#[derive(Debug)]
pub enum Outcome {
    /// 成功发布，携带匿名化检查的标识
    Published { anonymized_study: String },
    Skipped(SkipReason),
    /// 失败，记录最近完成的阶段以便人工跟进
    Failed { stage: Stage, error: DeidentError },
}

/// 一次运行的汇总
///
/// published中的对应关系只存在于本次运行的内存里，从不持久化，
/// 以免成为重识别通道。
#[derive(Debug, Default)]
pub struct RunSummary {
    /// 外部患者号到匿名化检查标识的对应
    pub published: Vec<(String, String)>,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.published.len() + self.skipped + self.failed
    }

    pub fn record(&mut self, external_key: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Published { anonymized_study } => self
                .published
                .push((external_key.to_string(), anonymized_study.clone())),
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }
}
