//! 会话 - 基础设施层
//!
//! 持有唯一的 HTTP 会话（cookie）和校验下载用的临时目录，只暴露能力。

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{EstError, Result};

/// 门户会话
///
/// 职责：
/// - 每个客户端实例持有唯一的会话，所有请求复用同一个 cookie 存储
/// - 持有校验下载用的临时目录
/// - 通过 `close` 确定性释放；未调用 `close` 时在 `Drop` 中释放
pub struct Session {
    http: Client,
    scratch: Option<TempDir>,
}

impl Session {
    /// 建立新的会话
    pub fn open(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| EstError::transport("open_session", config.base_url.as_str(), e))?;

        let scratch = tempfile::Builder::new()
            .prefix("est-upload-")
            .tempdir()
            .map_err(|e| EstError::io(std::env::temp_dir(), e))?;
        debug!("会话已建立，临时目录: {}", scratch.path().display());

        Ok(Self {
            http,
            scratch: Some(scratch),
        })
    }

    /// 获取 HTTP 客户端
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// 临时目录中用于存放指定文件的路径
    ///
    /// 只取文件名部分，门户上的文件名不能把路径带出临时目录。
    pub fn scratch_path(&self, file_name: &str) -> Result<PathBuf> {
        let dir = self
            .scratch
            .as_ref()
            .map(|d| d.path())
            .ok_or_else(|| EstError::io(file_name, std::io::ErrorKind::NotFound.into()))?;
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| EstError::io(file_name, std::io::ErrorKind::InvalidInput.into()))?;
        Ok(dir.join(name))
    }

    /// 释放会话资源
    pub fn close(mut self) -> Result<()> {
        match self.scratch.take() {
            Some(dir) => dir
                .close()
                .map_err(|source| EstError::ResourceReleaseFailure { source }),
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(dir) = self.scratch.take() {
            debug!("会话未显式关闭，正在释放");
            if let Err(source) = dir.close() {
                warn!("{}", EstError::ResourceReleaseFailure { source });
            }
        }
    }
}
