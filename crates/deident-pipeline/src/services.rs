//! 外部服务接缝
//!
//! 流水线通过这两个trait访问PACS归档与RIS报告库，
//! 测试中以内存实现替换。

use async_trait::async_trait;
use deident_core::{PipelineConfig, Result};
use deident_pacs::{OrthancClient, StudySummary};
use deident_ris::{normalize_report, RisPool, RisQueries};

/// PACS归档操作
#[async_trait]
pub trait PacsService: Send + Sync {
    /// 枚举全部患者标识
    async fn list_patients(&self) -> Result<Vec<String>>;

    /// 读取患者元数据内嵌的外部患者号
    async fn patient_external_key(&self, pacs_id: &str) -> Result<Option<String>>;

    /// 按外部患者号查询检查
    async fn find_studies(&self, external_key: &str) -> Result<Vec<StudySummary>>;

    /// 匿名化检查并返回新检查的标识
    async fn anonymize(&self, study_id: &str) -> Result<String>;

    /// 将PDF文档作为新序列附加到检查
    ///
    /// 非幂等：重复调用会产生重复的附加文档。
    async fn attach_document(&self, study_id: &str, document: &[u8]) -> Result<()>;
}

/// RIS报告访问
#[async_trait]
pub trait ReportService: Send + Sync {
    /// 候选患者号清单，按申请时间倒序
    async fn candidate_patients(&self) -> Result<Vec<String>>;

    /// 患者最近一份报告的规范化文本；无报告时为空串
    async fn latest_report(&self, external_key: &str) -> Result<String>;
}

/// 生产环境的PACS归档实现
pub struct OrthancArchive {
    client: OrthancClient,
    query_limit: u32,
    series_description: String,
}

impl OrthancArchive {
    pub fn new(client: OrthancClient, pipeline: &PipelineConfig) -> Self {
        Self {
            client,
            query_limit: pipeline.query_limit,
            series_description: pipeline.series_description.clone(),
        }
    }
}

#[async_trait]
impl PacsService for OrthancArchive {
    async fn list_patients(&self) -> Result<Vec<String>> {
        self.client.list_patients().await
    }

    async fn patient_external_key(&self, pacs_id: &str) -> Result<Option<String>> {
        let details = self.client.patient_details(pacs_id).await?;
        Ok(details.external_key().map(|key| key.to_string()))
    }

    async fn find_studies(&self, external_key: &str) -> Result<Vec<StudySummary>> {
        self.client.find_studies(external_key, self.query_limit).await
    }

    async fn anonymize(&self, study_id: &str) -> Result<String> {
        self.client.anonymize_study(study_id).await
    }

    async fn attach_document(&self, study_id: &str, document: &[u8]) -> Result<()> {
        let created = self
            .client
            .create_document(study_id, document, &self.series_description)
            .await?;

        tracing::debug!(
            "document instance {} attached under series {}",
            created.id,
            created.parent_series.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }
}

/// 生产环境的RIS报告实现
pub struct RisReports {
    pool: RisPool,
    exam_type: i32,
}

impl RisReports {
    pub fn new(pool: RisPool, pipeline: &PipelineConfig) -> Self {
        Self {
            pool,
            exam_type: pipeline.exam_type,
        }
    }
}

#[async_trait]
impl ReportService for RisReports {
    async fn candidate_patients(&self) -> Result<Vec<String>> {
        RisQueries::new(&self.pool)
            .imaging_patients(self.exam_type)
            .await
    }

    async fn latest_report(&self, external_key: &str) -> Result<String> {
        let raw = RisQueries::new(&self.pool)
            .latest_report(external_key)
            .await?;

        Ok(raw.map(|text| normalize_report(&text)).unwrap_or_default())
    }
}
