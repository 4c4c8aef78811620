use std::path::PathBuf;

use thiserror::Error;

/// EST 客户端错误类型
///
/// 每个变体都携带足够的上下文（操作、文件、课程、URL），
/// 调用方可以直接展示给用户。
#[derive(Debug, Error)]
pub enum EstError {
    /// 登录页面返回了错误信息
    #[error("登录失败 (用户: {user}): {reason}")]
    AuthenticationFailed { user: String, reason: String },

    /// 课程中没有配置该文件的上传位置
    #[error("课程 {lecture_id} 中没有文件 '{file_name}' 的上传位置")]
    FileSlotNotFound {
        file_name: String,
        lecture_id: String,
    },

    /// 本地文件为空，拒绝上传
    #[error("文件为空，已拒绝上传: {}", path.display())]
    EmptyFileRejected { path: PathBuf },

    /// 门户在上传时返回了校验错误
    #[error("上传被拒绝 (文件: {file_name}, 课程: {lecture_id}): {reason}")]
    SubmissionRejected {
        file_name: String,
        lecture_id: String,
        reason: String,
    },

    /// 页面中缺少预期的标记元素
    #[error("页面元素未找到 ({operation}): {context}")]
    ElementNotFound {
        operation: &'static str,
        context: String,
    },

    /// 无法连接到门户
    #[error("无法连接到门户 ({operation}, {url}): {source}")]
    NetworkUnreachable {
        operation: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 其他传输层错误（超时、HTTP 错误状态码等）
    #[error("HTTP 请求失败 ({operation}, {url}): {source}")]
    Http {
        operation: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 释放会话资源失败
    #[error("释放会话资源失败: {source}")]
    ResourceReleaseFailure {
        #[source]
        source: std::io::Error,
    },

    /// 本地文件读写失败
    #[error("文件操作失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// URL 无法解析
    #[error("无效的 URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析配置文件失败
    #[error("TOML解析失败 ({}): {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl EstError {
    /// 根据 reqwest 错误的类型区分"无法连接"和其他传输错误
    pub fn transport(operation: &'static str, url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_connect() {
            EstError::NetworkUnreachable {
                operation,
                url,
                source,
            }
        } else {
            EstError::Http {
                operation,
                url,
                source,
            }
        }
    }

    /// 创建文件操作错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EstError::Io {
            path: path.into(),
            source,
        }
    }

    /// 创建元素未找到错误
    pub fn element_not_found(operation: &'static str, context: impl Into<String>) -> Self {
        EstError::ElementNotFound {
            operation,
            context: context.into(),
        }
    }

    /// 是否是网络不可达错误
    pub fn is_unreachable(&self) -> bool {
        matches!(self, EstError::NetworkUnreachable { .. })
    }
}

// ========== Result 类型别名 ==========

/// 客户端结果类型
pub type Result<T> = std::result::Result<T, EstError>;
