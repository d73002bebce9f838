//! 检查选择策略

use deident_pacs::StudySummary;

/// 从候选检查中确定性地选出最新的一项
///
/// 排序键：StudyDate降序，再StudyTime降序，最后按标识降序打破平局。
/// 缺失日期的检查排在所有带日期的检查之后。
pub fn newest_study(mut studies: Vec<StudySummary>) -> Option<StudySummary> {
    studies.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    studies.into_iter().next()
}

fn sort_key(study: &StudySummary) -> (Option<&str>, Option<&str>, &str) {
    (
        study.main_dicom_tags.study_date.as_deref(),
        study.main_dicom_tags.study_time.as_deref(),
        study.id.as_str(),
    )
}
