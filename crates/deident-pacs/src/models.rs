//! PACS REST接口模型

use serde::{Deserialize, Serialize};

/// 匿名化时保留的DICOM标签白名单
pub const KEPT_TAGS: [&str; 4] = [
    "SeriesDescription",
    "StudyDescription",
    "StudyDate",
    "StudyTime",
];

/// 附加文档序列使用的Modality
pub const DOCUMENT_MODALITY: &str = "DOC";

/// `/tools/find` 查询请求
#[derive(Debug, Clone, Serialize)]
pub struct ToolsFindRequest {
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Expand")]
    pub expand: bool,
    #[serde(rename = "Limit")]
    pub limit: u32,
    #[serde(rename = "Query")]
    pub query: StudyQuery,
}

/// 按患者号查询检查的条件；日期留空表示不限定
#[derive(Debug, Clone, Serialize)]
pub struct StudyQuery {
    #[serde(rename = "PatientID")]
    pub patient_id: String,
    #[serde(rename = "StudyDate")]
    pub study_date: String,
}

impl ToolsFindRequest {
    /// 构造检查级别的患者号查询
    pub fn studies_for_patient(patient_key: &str, limit: u32) -> Self {
        Self {
            level: "Study".to_string(),
            expand: true,
            limit,
            query: StudyQuery {
                patient_id: patient_key.to_string(),
                study_date: String::new(),
            },
        }
    }
}

/// 检查查询结果条目
#[derive(Debug, Clone, Deserialize)]
pub struct StudySummary {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "MainDicomTags", default)]
    pub main_dicom_tags: StudyTags,
}

/// 检查的主要DICOM标签
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyTags {
    #[serde(rename = "StudyDate")]
    pub study_date: Option<String>,
    #[serde(rename = "StudyTime")]
    pub study_time: Option<String>,
    #[serde(rename = "StudyDescription")]
    pub study_description: Option<String>,
}

/// 患者详情
#[derive(Debug, Clone, Deserialize)]
pub struct PatientDetails {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "MainDicomTags", default)]
    pub main_dicom_tags: PatientTags,
}

/// 患者的主要DICOM标签；PatientID为RIS发放的外部患者号
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientTags {
    #[serde(rename = "PatientID")]
    pub patient_id: Option<String>,
}

impl PatientDetails {
    /// 读取PACS元数据中内嵌的外部患者号
    pub fn external_key(&self) -> Option<&str> {
        self.main_dicom_tags
            .patient_id
            .as_deref()
            .filter(|key| !key.is_empty())
    }
}

/// 匿名化请求：仅保留白名单标签
#[derive(Debug, Clone, Serialize)]
pub struct AnonymizeRequest {
    #[serde(rename = "Keep")]
    pub keep: Vec<String>,
}

impl Default for AnonymizeRequest {
    fn default() -> Self {
        Self {
            keep: KEPT_TAGS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

/// 匿名化响应：新检查的标识
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymizeResponse {
    #[serde(rename = "ID")]
    pub id: String,
}

/// `/tools/create-dicom` 请求
#[derive(Debug, Clone, Serialize)]
pub struct CreateDicomRequest {
    #[serde(rename = "Parent")]
    pub parent: String,
    #[serde(rename = "Tags")]
    pub tags: CreateDicomTags,
    /// base64数据URI形式的文档内容
    #[serde(rename = "Content")]
    pub content: String,
}

/// 附加文档序列的描述性标签
#[derive(Debug, Clone, Serialize)]
pub struct CreateDicomTags {
    #[serde(rename = "Modality")]
    pub modality: String,
    #[serde(rename = "SeriesDescription")]
    pub series_description: String,
    #[serde(rename = "SeriesDate")]
    pub series_date: String,
    #[serde(rename = "AcquisitionDate")]
    pub acquisition_date: String,
    #[serde(rename = "ContentDate")]
    pub content_date: String,
}

/// `/tools/create-dicom` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDicomResponse {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "ParentSeries")]
    pub parent_series: Option<String>,
}

/// `/system` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Version")]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_request_serialization() {
        let request = ToolsFindRequest::studies_for_patient("P001", 101);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["Level"], "Study");
        assert_eq!(value["Limit"], 101);
        assert_eq!(value["Query"]["PatientID"], "P001");
        assert_eq!(value["Query"]["StudyDate"], "");
    }

    #[test]
    fn test_study_summary_deserialization() {
        let payload = r#"{
            "ID": "study-1",
            "MainDicomTags": {
                "StudyDate": "20240105",
                "StudyTime": "101500",
                "StudyDescription": "CT CHEST"
            }
        }"#;
        let study: StudySummary = serde_json::from_str(payload).unwrap();
        assert_eq!(study.id, "study-1");
        assert_eq!(study.main_dicom_tags.study_date.as_deref(), Some("20240105"));
    }

    #[test]
    fn test_patient_without_embedded_key() {
        let payload = r#"{"ID": "abc", "MainDicomTags": {}}"#;
        let details: PatientDetails = serde_json::from_str(payload).unwrap();
        assert!(details.external_key().is_none());

        let payload = r#"{"ID": "abc", "MainDicomTags": {"PatientID": ""}}"#;
        let details: PatientDetails = serde_json::from_str(payload).unwrap();
        assert!(details.external_key().is_none());
    }

    #[test]
    fn test_anonymize_request_keep_list() {
        let value = serde_json::to_value(AnonymizeRequest::default()).unwrap();
        let keep = value["Keep"].as_array().unwrap();
        assert_eq!(keep.len(), 4);
        assert!(keep.iter().any(|tag| tag == "StudyDate"));
    }
}
