use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EstError, Result};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 门户根地址
    pub base_url: String,
    /// 已验证兼容的门户版本字符串
    pub known_version: String,
    /// 单个请求的超时时间（秒）
    pub request_timeout_secs: u64,
    /// 建立连接的超时时间（秒）
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// 下载时每次写入磁盘的块大小（字节）
    pub download_chunk_size: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 登录信息 ---
    pub username: Option<String>,
    pub password: Option<String>,
    // --- 提交任务 ---
    pub lecture_id: Option<String>,
    pub file_name: Option<String>,
    pub file_path: Option<PathBuf>,
    pub partner_code: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://est.informatik.uni-erlangen.de".to_string(),
            known_version: "Version 2.0.2384".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("est_upload/{}", env!("CARGO_PKG_VERSION")),
            download_chunk_size: 512 * 1024,
            verbose_logging: false,
            username: None,
            password: None,
            lecture_id: None,
            file_name: None,
            file_path: None,
            partner_code: None,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的字段使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，文件中缺失的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| EstError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| EstError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 先读取 `EST_CONFIG` 指定的 TOML 文件（如果有），再应用环境变量
    pub fn load() -> Result<Self> {
        let base = match std::env::var("EST_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_toml_file(path)?,
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            base_url: env("EST_BASE_URL").unwrap_or(self.base_url),
            known_version: env("EST_KNOWN_VERSION").unwrap_or(self.known_version),
            request_timeout_secs: env("EST_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            connect_timeout_secs: env("EST_CONNECT_TIMEOUT_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.connect_timeout_secs),
            user_agent: env("EST_USER_AGENT").unwrap_or(self.user_agent),
            download_chunk_size: env("EST_DOWNLOAD_CHUNK_SIZE").and_then(|v| v.parse().ok()).unwrap_or(self.download_chunk_size),
            verbose_logging: env("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            username: env("EST_USER").or(self.username),
            password: env("EST_PASSWORD").or(self.password),
            lecture_id: env("EST_LECTURE_ID").or(self.lecture_id),
            file_name: env("EST_FILE_NAME").or(self.file_name),
            file_path: env("EST_FILE_PATH").map(PathBuf::from).or(self.file_path),
            partner_code: env("EST_PARTNER_CODE").or(self.partner_code),
        }
    }

    /// 返回登录凭据（用户名和密码都配置时）
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}
