//! # PACS REST访问模块
//!
//! 面向Orthanc兼容REST接口的客户端与手写模型，覆盖本系统消费的
//! 端点子集：患者枚举与详情、检查查询、匿名化、文档附加。

pub mod client;
pub mod models;

pub use client::OrthancClient;
pub use models::{
    AnonymizeRequest, AnonymizeResponse, CreateDicomRequest, CreateDicomResponse,
    CreateDicomTags, PatientDetails, PatientTags, StudySummary, StudyTags, SystemInfo,
    ToolsFindRequest, DOCUMENT_MODALITY, KEPT_TAGS,
};
