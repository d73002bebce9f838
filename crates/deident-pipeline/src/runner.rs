//! 流水线编排
//!
//! 按患者顺序推进各阶段，单个患者的失败不影响后续患者。
//! 匿名化之后不做任何回滚：撤销匿名化不是安全操作。

use std::collections::HashSet;

use deident_core::{DeidentError, Result};

use crate::identity::{build_identity_map, IdentityMap};
use crate::render::render_report;
use crate::select::newest_study;
use crate::services::{PacsService, ReportService};
use crate::stage::{Outcome, RunSummary, SkipReason, Stage};

/// 去标识化流水线
pub struct Pipeline<'a, P, R> {
    pacs: &'a P,
    reports: &'a R,
}

impl<'a, P: PacsService, R: ReportService> Pipeline<'a, P, R> {
    pub fn new(pacs: &'a P, reports: &'a R) -> Self {
        Self { pacs, reports }
    }

    /// 执行一次完整批处理
    ///
    /// 标识映射构建或候选清单查询失败会在任何变更发生前中止；
    /// 此后逐患者处理，彼此隔离。
    pub async fn run(&self) -> Result<RunSummary> {
        // 1. 构建标识映射（只读，失败即中止）
        let map = build_identity_map(self.pacs).await?;

        // 2. 候选患者清单，保序去重
        let candidates = dedup_preserving_order(self.reports.candidate_patients().await?);
        tracing::info!("{} candidate patients from RIS", candidates.len());

        // 3. 逐患者推进
        let mut summary = RunSummary::default();
        for external_key in &candidates {
            let outcome = self.process_patient(external_key, &map).await;
            match &outcome {
                Outcome::Published { anonymized_study } => {
                    tracing::info!(
                        "patient {}: published as study {}",
                        external_key,
                        anonymized_study
                    );
                }
                Outcome::Skipped(reason) => {
                    tracing::info!("patient {}: skipped ({})", external_key, reason);
                }
                Outcome::Failed { stage, error } => {
                    tracing::error!(
                        "patient {}: failed after stage {}: {}",
                        external_key,
                        stage,
                        error
                    );
                }
            }
            summary.record(external_key, &outcome);
        }

        tracing::info!(
            "run complete: {} published, {} skipped, {} failed",
            summary.published.len(),
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// 单个患者的阶段推进
    ///
    /// 匿名化成功之后的任何错误都按该患者失败处理，
    /// 已生成的匿名化检查保留在PACS中等待人工跟进。
    async fn process_patient(&self, external_key: &str, map: &IdentityMap) -> Outcome {
        if map.get(external_key).is_none() {
            return Outcome::Skipped(SkipReason::NotMapped);
        }
        let mut stage = Stage::Mapped;

        let study = match self.pacs.find_studies(external_key).await.map(newest_study) {
            Ok(Some(study)) => study,
            Ok(None) => return Outcome::Skipped(SkipReason::NoMatchingStudy),
            Err(DeidentError::NotFound(_)) => {
                return Outcome::Skipped(SkipReason::NoMatchingStudy)
            }
            Err(error) => return Outcome::Failed { stage, error },
        };
        stage = Stage::StudyFound;

        let anonymized_study = match self.pacs.anonymize(&study.id).await {
            Ok(id) => id,
            Err(error) => return Outcome::Failed { stage, error },
        };
        stage = Stage::Anonymized;

        // 空报告同样发布：渲染为零内容行的文档
        let report = match self.reports.latest_report(external_key).await {
            Ok(text) => text,
            Err(error) => return Outcome::Failed { stage, error },
        };
        stage = Stage::ReportFetched;

        let document = match render_report(&report) {
            Ok(bytes) => bytes,
            Err(error) => return Outcome::Failed { stage, error },
        };
        stage = Stage::Rendered;

        if let Err(error) = self.pacs.attach_document(&anonymized_study, &document).await {
            return Outcome::Failed { stage, error };
        }

        Outcome::Published { anonymized_study }
    }
}

/// 保序去重
fn dedup_preserving_order(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deident_pacs::{StudySummary, StudyTags};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn study(id: &str, date: &str) -> StudySummary {
        StudySummary {
            id: id.to_string(),
            main_dicom_tags: StudyTags {
                study_date: Some(date.to_string()),
                study_time: None,
                study_description: None,
            },
        }
    }

    /// 内存版PACS：记录匿名化与附加调用
    #[derive(Default)]
    struct FakePacs {
        patients: Vec<(String, Option<String>)>,
        studies: HashMap<String, Vec<StudySummary>>,
        fail_attach_containing: Option<String>,
        anonymize_counter: AtomicUsize,
        anonymized: Mutex<Vec<String>>,
        attached: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PacsService for FakePacs {
        async fn list_patients(&self) -> Result<Vec<String>> {
            Ok(self.patients.iter().map(|(id, _)| id.clone()).collect())
        }

        async fn patient_external_key(&self, pacs_id: &str) -> Result<Option<String>> {
            Ok(self
                .patients
                .iter()
                .find(|(id, _)| id == pacs_id)
                .and_then(|(_, key)| key.clone()))
        }

        async fn find_studies(&self, external_key: &str) -> Result<Vec<StudySummary>> {
            Ok(self.studies.get(external_key).cloned().unwrap_or_default())
        }

        async fn anonymize(&self, study_id: &str) -> Result<String> {
            let n = self.anonymize_counter.fetch_add(1, Ordering::SeqCst) + 1;
            self.anonymized.lock().unwrap().push(study_id.to_string());
            Ok(format!("anon-{}-{}", study_id, n))
        }

        async fn attach_document(&self, study_id: &str, _document: &[u8]) -> Result<()> {
            if let Some(marker) = &self.fail_attach_containing {
                if study_id.contains(marker.as_str()) {
                    return Err(DeidentError::Pacs("attach rejected".to_string()));
                }
            }
            self.attached.lock().unwrap().push(study_id.to_string());
            Ok(())
        }
    }

    struct FakeReports {
        candidates: Vec<String>,
        reports: HashMap<String, String>,
    }

    #[async_trait]
    impl ReportService for FakeReports {
        async fn candidate_patients(&self) -> Result<Vec<String>> {
            Ok(self.candidates.clone())
        }

        async fn latest_report(&self, external_key: &str) -> Result<String> {
            Ok(self.reports.get(external_key).cloned().unwrap_or_default())
        }
    }

    fn two_patient_pacs() -> FakePacs {
        FakePacs {
            patients: vec![
                ("a".to_string(), Some("P1".to_string())),
                ("b".to_string(), Some("P2".to_string())),
            ],
            studies: HashMap::from([
                ("P1".to_string(), vec![study("s1", "20240101")]),
                ("P2".to_string(), vec![study("s2", "20240202")]),
            ]),
            ..Default::default()
        }
    }

    fn reports_for(keys: &[&str]) -> FakeReports {
        FakeReports {
            candidates: keys.iter().map(|key| key.to_string()).collect(),
            reports: HashMap::from([
                ("P1".to_string(), "Report one".to_string()),
                ("P2".to_string(), "Report two".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn test_each_patient_published_exactly_once() {
        let pacs = two_patient_pacs();
        let reports = reports_for(&["P1", "P2"]);

        let summary = Pipeline::new(&pacs, &reports).run().await.unwrap();

        assert_eq!(summary.published.len(), 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(*pacs.anonymized.lock().unwrap(), vec!["s1", "s2"]);
        assert_eq!(pacs.attached.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_patient_without_study_is_skipped() {
        let mut pacs = two_patient_pacs();
        pacs.studies.remove("P1");
        let reports = reports_for(&["P1", "P2"]);

        let summary = Pipeline::new(&pacs, &reports).run().await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.published.len(), 1);
        assert_eq!(summary.published[0].0, "P2");
        assert_eq!(*pacs.anonymized.lock().unwrap(), vec!["s2"]);
    }

    #[tokio::test]
    async fn test_unmapped_candidate_is_skipped() {
        let pacs = two_patient_pacs();
        let reports = reports_for(&["P9", "P1"]);

        let summary = Pipeline::new(&pacs, &reports).run().await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.published.len(), 1);
        assert_eq!(summary.published[0].0, "P1");
    }

    #[tokio::test]
    async fn test_attach_failure_does_not_block_next_patient() {
        let mut pacs = two_patient_pacs();
        // P1的匿名化检查标识包含s1，附加时被拒绝
        pacs.fail_attach_containing = Some("s1".to_string());
        let reports = reports_for(&["P1", "P2"]);

        let summary = Pipeline::new(&pacs, &reports).run().await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.published.len(), 1);
        assert_eq!(summary.published[0].0, "P2");
        // 后续患者的匿名化与附加照常进行
        assert_eq!(*pacs.anonymized.lock().unwrap(), vec!["s1", "s2"]);
        assert_eq!(pacs.attached.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_run_is_not_idempotent() {
        let pacs = two_patient_pacs();
        let reports = reports_for(&["P1"]);
        let pipeline = Pipeline::new(&pacs, &reports);

        let first = pipeline.run().await.unwrap();
        let second = pipeline.run().await.unwrap();

        // 第二次运行再次匿名化并再次附加文档
        assert_eq!(pacs.anonymized.lock().unwrap().len(), 2);
        assert_eq!(pacs.attached.lock().unwrap().len(), 2);
        assert_ne!(first.published[0].1, second.published[0].1);
    }

    #[tokio::test]
    async fn test_duplicate_candidates_processed_once() {
        let pacs = two_patient_pacs();
        let reports = reports_for(&["P1", "P1", "P2"]);

        let summary = Pipeline::new(&pacs, &reports).run().await.unwrap();

        assert_eq!(summary.published.len(), 2);
        assert_eq!(pacs.anonymized.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_report_still_publishes_document() {
        let pacs = two_patient_pacs();
        let reports = FakeReports {
            candidates: vec!["P1".to_string()],
            reports: HashMap::new(),
        };

        let summary = Pipeline::new(&pacs, &reports).run().await.unwrap();

        assert_eq!(summary.published.len(), 1);
        assert_eq!(pacs.attached.lock().unwrap().len(), 1);
    }
}
