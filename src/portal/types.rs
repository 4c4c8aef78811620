//! 门户领域类型

use std::fmt::Display;
use std::path::PathBuf;

/// 课程引用（课程 id + 显示名称）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lecture {
    pub id: String,
    pub name: String,
}

impl Lecture {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Display for Lecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[课程 #{}] {}", self.id, self.name)
    }
}

/// 上传表单中文件位置的标识（label 的 `for` 属性）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSlotId(String);

impl FileSlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 小组提交码的表单字段名，由 id 的前四个字符派生
    pub fn submitter_code_field(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("submitterCode_{}", prefix)
    }
}

impl Display for FileSlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 一次文件提交的描述
#[derive(Debug, Clone)]
pub struct FileSubmission {
    /// 门户上显示的文件名
    pub name: String,
    /// 本地文件路径
    pub path: PathBuf,
    pub lecture_id: String,
    /// 小组提交伙伴的提交码（可选）
    pub partner_code: Option<String>,
}

impl FileSubmission {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, lecture_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            lecture_id: lecture_id.into(),
            partner_code: None,
        }
    }

    pub fn with_partner_code(mut self, code: impl Into<String>) -> Self {
        self.partner_code = Some(code.into());
        self
    }
}

/// 本地文件与门户上的文件比较结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileComparison {
    Identical,
    Different,
}

/// 提交状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// 状态图标的 title 文本
    Reported(String),
    /// 概览页上没有该文件
    NoStatus,
}

/// 门户版本
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalVersion {
    Live(String),
    /// 无法连接到门户
    Unreachable,
}

/// 版本兼容性检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    Compatible,
    /// 线上版本文本（原样返回）
    Mismatch(String),
    Unreachable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submitter_code_field_uses_first_four_chars() {
        let slot = FileSlotId::new("file1234_5");
        assert_eq!(slot.submitter_code_field(), "submitterCode_file");

        let short = FileSlotId::new("ab");
        assert_eq!(short.submitter_code_field(), "submitterCode_ab");
    }

    #[test]
    fn test_submission_builder() {
        let submission = FileSubmission::new("blatt01.c", "/tmp/blatt01.c", "42").with_partner_code("XYZ9");
        assert_eq!(submission.partner_code.as_deref(), Some("XYZ9"));
        assert_eq!(submission.lecture_id, "42");
    }
}
