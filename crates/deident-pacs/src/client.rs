//! PACS REST客户端

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use deident_core::{DeidentError, PacsConfig, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    AnonymizeRequest, AnonymizeResponse, CreateDicomRequest, CreateDicomResponse,
    CreateDicomTags, PatientDetails, StudySummary, SystemInfo, ToolsFindRequest,
    DOCUMENT_MODALITY,
};

/// PACS REST客户端
///
/// 所有请求都携带基本认证。
#[derive(Debug, Clone)]
pub struct OrthancClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl OrthancClient {
    pub fn new(config: &PacsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeidentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.endpoint(path))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| DeidentError::Pacs(format!("GET {} failed: {}", path, e)))?;

        Self::decode(path, response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .map_err(|e| DeidentError::Pacs(format!("POST {} failed: {}", path, e)))?;

        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        match response.status() {
            status if status.is_success() => response.json().await.map_err(|e| {
                DeidentError::Pacs(format!("{} returned malformed payload: {}", path, e))
            }),
            StatusCode::NOT_FOUND => Err(DeidentError::NotFound(path.to_string())),
            status => Err(DeidentError::Pacs(format!(
                "{} returned status {}",
                path, status
            ))),
        }
    }

    /// 探测PACS可达性；失败视为配置错误
    pub async fn check(&self) -> Result<SystemInfo> {
        let info: SystemInfo = self
            .get_json("/system")
            .await
            .map_err(|e| DeidentError::Config(format!("PACS unreachable: {}", e)))?;

        tracing::info!(
            "PACS connected: {} {}",
            info.name.as_deref().unwrap_or("unknown"),
            info.version.as_deref().unwrap_or("?")
        );
        Ok(info)
    }

    /// 枚举全部患者标识
    pub async fn list_patients(&self) -> Result<Vec<String>> {
        self.get_json("/patients").await
    }

    /// 获取单个患者详情
    pub async fn patient_details(&self, patient_id: &str) -> Result<PatientDetails> {
        self.get_json(&format!("/patients/{}", patient_id)).await
    }

    /// 按外部患者号查询检查，日期不做限定
    pub async fn find_studies(&self, patient_key: &str, limit: u32) -> Result<Vec<StudySummary>> {
        let request = ToolsFindRequest::studies_for_patient(patient_key, limit);
        self.post_json("/tools/find", &request).await
    }

    /// 匿名化检查，仅保留白名单标签，返回新检查的标识
    pub async fn anonymize_study(&self, study_id: &str) -> Result<String> {
        let request = AnonymizeRequest::default();
        let response: AnonymizeResponse = self
            .post_json(&format!("/studies/{}/anonymize", study_id), &request)
            .await?;

        Ok(response.id)
    }

    /// 将PDF文档作为新序列附加到指定检查
    pub async fn create_document(
        &self,
        parent_study: &str,
        document: &[u8],
        series_description: &str,
    ) -> Result<CreateDicomResponse> {
        let today = chrono::Local::now().format("%Y%m%d").to_string();
        let request = CreateDicomRequest {
            parent: parent_study.to_string(),
            tags: CreateDicomTags {
                modality: DOCUMENT_MODALITY.to_string(),
                series_description: series_description.to_string(),
                series_date: today.clone(),
                acquisition_date: today.clone(),
                content_date: today,
            },
            content: format!(
                "data:application/pdf;base64,{}",
                STANDARD.encode(document)
            ),
        };

        self.post_json("/tools/create-dicom", &request).await
    }
}
