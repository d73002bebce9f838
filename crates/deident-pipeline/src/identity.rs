//! 患者标识调和
//!
//! RIS发放的外部患者号与PACS内部生成的患者标识相互独立，
//! 这里通过读取PACS患者元数据中内嵌的外部患者号建立映射。
//! 映射只被发现，从不被发明。

use std::collections::{btree_map, BTreeMap, HashMap};

use deident_core::Result;

use crate::services::PacsService;

/// 外部患者号到PACS患者标识的映射
///
/// 键唯一且按外部患者号有序遍历；外部患者号重复或缺失的
/// PACS患者不产生映射项，绝不歧义映射。
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    entries: BTreeMap<String, String>,
}

impl IdentityMap {
    pub fn get(&self, external_key: &str) -> Option<&str> {
        self.entries.get(external_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }
}

/// 由 (PACS患者标识, 内嵌外部患者号) 对构建映射
///
/// 缺失外部患者号的患者被跳过；同一外部患者号出现多次时，
/// 所有相关患者一并剔除。
pub fn reconcile<I>(pairs: I) -> IdentityMap
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    let mut claims: HashMap<String, usize> = HashMap::new();
    let mut candidates: Vec<(String, String)> = Vec::new();

    for (pacs_id, external_key) in pairs {
        match external_key {
            Some(key) if !key.is_empty() => {
                *claims.entry(key.clone()).or_insert(0) += 1;
                candidates.push((key, pacs_id));
            }
            _ => {
                tracing::warn!(
                    "PACS patient {} has no embedded patient number, skipping",
                    pacs_id
                );
            }
        }
    }

    let mut entries = BTreeMap::new();
    for (key, pacs_id) in candidates {
        if claims[&key] > 1 {
            tracing::warn!(
                "patient number {} is claimed by multiple PACS patients, excluded from mapping",
                key
            );
            continue;
        }
        entries.insert(key, pacs_id);
    }

    IdentityMap { entries }
}

/// 枚举PACS全部患者并构建标识映射
///
/// 枚举请求失败会中止整次运行（绝不使用不完整的映射）；
/// 单个患者的详情查询失败只跳过该患者。
pub async fn build_identity_map<P: PacsService>(pacs: &P) -> Result<IdentityMap> {
    let patient_ids = pacs.list_patients().await?;
    tracing::info!("PACS reports {} patients", patient_ids.len());

    let mut pairs = Vec::with_capacity(patient_ids.len());
    for pacs_id in patient_ids {
        match pacs.patient_external_key(&pacs_id).await {
            Ok(external_key) => pairs.push((pacs_id, external_key)),
            Err(e) => {
                tracing::warn!("failed to read PACS patient {}: {}", pacs_id, e);
            }
        }
    }

    let map = reconcile(pairs);
    tracing::info!("identity map holds {} patients", map.len());
    Ok(map)
}
