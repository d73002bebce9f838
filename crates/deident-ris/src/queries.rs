//! RIS只读查询

use deident_core::{DeidentError, Result};

use crate::connection::RisPool;

/// RIS查询接口
pub struct RisQueries<'a> {
    pool: &'a RisPool,
}

impl<'a> RisQueries<'a> {
    pub fn new(pool: &'a RisPool) -> Self {
        Self { pool }
    }

    /// 查询带有指定检查类型申请的候选患者号，按申请时间倒序
    ///
    /// 同一患者可能因多份申请出现多次，由调用方去重。
    pub async fn imaging_patients(&self, exam_type: i32) -> Result<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.pat_num
            FROM patient p
            JOIN request r ON r.patient_id = p.patient_id
            JOIN request_detail rd ON rd.request_id = r.request_id
            JOIN exam e ON e.exam_id = rd.exam_id
            WHERE e.type = ?
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(exam_type)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| DeidentError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// 查询患者最近一份报告的原始文本
    pub async fn latest_report(&self, patient_key: &str) -> Result<Option<String>> {
        sqlx::query_scalar(
            r#"
            SELECT r.text
            FROM report r
            JOIN patient p ON r.patient_id = p.patient_id
            WHERE p.pat_num = ?
            ORDER BY r.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(patient_key)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| DeidentError::Database(e.to_string()))
    }
}
