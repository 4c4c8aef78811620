//! EST 门户客户端
//!
//! 封装所有与门户页面相关的调用逻辑：每个操作按顺序发出请求，
//! 把响应正文交给 [`extract`](crate::portal::extract) 解析成领域数据。

use std::path::Path;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{EstError, Result};
use crate::portal::content::{self, EMPTY_MIME};
use crate::portal::endpoints::{Endpoint, Endpoints};
use crate::portal::extract;
use crate::portal::session::Session;
use crate::portal::types::{
    FileComparison, FileSlotId, FileSubmission, Lecture, PortalVersion, SubmissionStatus, VersionCheck,
};
use crate::utils::logging::truncate_text;

/// EST 门户客户端
pub struct EstClient {
    endpoints: Endpoints,
    session: Session,
    known_version: String,
    chunk_size: usize,
}

impl EstClient {
    /// 创建新的门户客户端，同时建立会话
    pub fn new(config: &Config) -> Result<Self> {
        let endpoints = Endpoints::new(&config.base_url)?;
        let session = Session::open(config)?;
        Ok(Self {
            endpoints,
            session,
            known_version: config.known_version.clone(),
            chunk_size: config.download_chunk_size.max(1),
        })
    }

    pub fn known_version(&self) -> &str {
        &self.known_version
    }

    /// 登录
    ///
    /// 用户名和密码放在表单正文中 POST，不拼接到 URL 查询串里；
    /// 查询串只保留 `action=student`。
    /// 页面上没有错误容器即为成功；否则返回容器中的错误文本。
    pub async fn authenticate(&self, user: &str, password: &str) -> Result<()> {
        let url = self.endpoints.url(Endpoint::Login);
        let params = [("login", user), ("password", password), ("submit", "login")];
        debug!("正在登录: {}", user);

        let response = self
            .session
            .http()
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| EstError::transport("authenticate", url.as_str(), e))?;
        let markup = read_body("authenticate", &url, response).await?;

        match extract::error_reason(&markup) {
            None => {
                info!("✓ 登录成功: {}", user);
                Ok(())
            }
            Some(reason) => {
                warn!("登录失败: {}", reason);
                Err(EstError::AuthenticationFailed {
                    user: user.to_string(),
                    reason,
                })
            }
        }
    }

    /// 查找文件在上传表单中的位置
    ///
    /// # 返回
    /// 找不到时返回 `None`
    pub async fn locate_file(&self, file_name: &str, lecture_id: &str) -> Result<Option<FileSlotId>> {
        let url = self.endpoints.lecture_url(Endpoint::Upload, lecture_id);
        let markup = self.get_page("locate_file", &url).await?;
        let slot = extract::file_slot(&markup, file_name);
        match &slot {
            Some(id) => debug!("文件 '{}' 的位置: {}", file_name, id),
            None => debug!("课程 {} 中没有文件 '{}' 的位置", lecture_id, file_name),
        }
        Ok(slot)
    }

    /// 上传文件
    ///
    /// 空文件不会被发送到门户。
    pub async fn submit_file(&self, submission: &FileSubmission) -> Result<()> {
        let FileSubmission {
            name,
            path,
            lecture_id,
            partner_code,
        } = submission;

        let slot = self
            .locate_file(name, lecture_id)
            .await?
            .ok_or_else(|| EstError::FileSlotNotFound {
                file_name: name.clone(),
                lecture_id: lecture_id.clone(),
            })?;

        let mime_type = content::sniff(path).await?;
        if mime_type == EMPTY_MIME {
            warn!("文件为空，跳过上传: {}", path.display());
            return Err(EstError::EmptyFileRejected { path: path.clone() });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| EstError::io(path, e))?;
        debug!("上传文件 {} ({} 字节, {})", name, bytes.len(), mime_type);

        let url = self.endpoints.url(Endpoint::UploadView);
        let part = Part::bytes(bytes)
            .file_name(name.clone())
            .mime_str(&mime_type)
            .map_err(|e| EstError::transport("submit_file", url.as_str(), e))?;
        let mut form = Form::new()
            .text("upload", "upload")
            .text("lectureId", lecture_id.clone())
            .text("action", "submit")
            .text("tab", "upload")
            .part(slot.as_str().to_string(), part);
        if let Some(code) = partner_code {
            form = form.text(slot.submitter_code_field(), code.clone());
        }

        let response = self
            .session
            .http()
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EstError::transport("submit_file", url.as_str(), e))?;
        let markup = read_body("submit_file", &url, response).await?;

        match extract::error_reason(&markup) {
            None => {
                info!("✓ 文件上传成功: {} (课程 {})", name, lecture_id);
                Ok(())
            }
            Some(reason) => {
                warn!("文件上传被拒绝: {}", reason);
                Err(EstError::SubmissionRejected {
                    file_name: name.clone(),
                    lecture_id: lecture_id.clone(),
                    reason,
                })
            }
        }
    }

    /// 检查门户上的文件是否与本地文件完全一致
    pub async fn check_file(&self, file_name: &str, path: &Path, lecture_id: &str) -> Result<FileComparison> {
        let url = self.endpoints.lecture_url(Endpoint::Check, lecture_id);
        let markup = self.get_page("check_file", &url).await?;
        let href = extract::download_href(&markup, file_name)?;
        let file_url = self.endpoints.resolve(&href)?;

        let remote_copy = self.session.scratch_path(file_name)?;
        self.download_file(file_url.as_str(), &remote_copy).await?;

        let result = if content::same_content(path, &remote_copy).await? {
            FileComparison::Identical
        } else {
            FileComparison::Different
        };
        info!("文件校验 {}: {:?}", file_name, result);
        Ok(result)
    }

    /// 读取文件的提交状态
    pub async fn check_status(&self, file_name: &str, lecture_id: &str) -> Result<SubmissionStatus> {
        let url = self.endpoints.lecture_url(Endpoint::Check, lecture_id);
        let markup = self.get_page("check_status", &url).await?;
        extract::submission_status(&markup, file_name)
    }

    /// 下载文件到本地路径（覆盖已有文件）
    ///
    /// # 返回
    /// 写入的字节数
    pub async fn download_file(&self, url: &str, local_path: &Path) -> Result<u64> {
        debug!("下载 {} -> {}", url, local_path.display());
        let response = self
            .session
            .http()
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| EstError::transport("download_file", url, e))?;

        let mut file = File::create(local_path)
            .await
            .map_err(|e| EstError::io(local_path, e))?;
        let written = self.write_stream(url, local_path, response, &mut file).await;
        drop(file);

        match written {
            Ok(bytes) => {
                debug!("下载完成: {} 字节", bytes);
                Ok(bytes)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(local_path).await {
                    debug!("删除不完整的下载文件失败: {}", remove_err);
                }
                Err(e)
            }
        }
    }

    async fn write_stream(&self, url: &str, local_path: &Path, response: Response, file: &mut File) -> Result<u64> {
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| EstError::transport("download_file", url, e))?;
            for piece in chunk.chunks(self.chunk_size) {
                file.write_all(piece).await.map_err(|e| EstError::io(local_path, e))?;
                file.flush().await.map_err(|e| EstError::io(local_path, e))?;
                written += piece.len() as u64;
            }
        }
        Ok(written)
    }

    /// 读取当前用户的课程列表
    pub async fn list_lectures(&self) -> Result<Vec<Lecture>> {
        let url = self.endpoints.url(Endpoint::Home);
        let markup = self.get_page("list_lectures", &url).await?;
        let lectures = extract::lectures(&markup)?;
        info!("✓ 找到 {} 门课程", lectures.len());
        Ok(lectures)
    }

    /// 读取门户版本
    ///
    /// 无法连接时返回 [`PortalVersion::Unreachable`]，不返回错误。
    pub async fn get_version(&self) -> Result<PortalVersion> {
        let url = self.endpoints.url(Endpoint::Home);
        let markup = match self.get_page("get_version", &url).await {
            Ok(markup) => markup,
            Err(e) if e.is_unreachable() => {
                warn!("无法连接到门户，版本未知: {}", e);
                return Ok(PortalVersion::Unreachable);
            }
            Err(e) => return Err(e),
        };
        extract::version_text(&markup).map(PortalVersion::Live)
    }

    /// 检查门户版本是否与已知版本兼容
    pub async fn check_version_compatibility(&self) -> Result<VersionCheck> {
        let check = match self.get_version().await? {
            PortalVersion::Live(text) if text.contains(&self.known_version) => VersionCheck::Compatible,
            PortalVersion::Live(text) => VersionCheck::Mismatch(text),
            PortalVersion::Unreachable => VersionCheck::Unreachable,
        };
        Ok(check)
    }

    /// 根据小组提交码查找伙伴姓名
    pub async fn resolve_partner_name(&self, partner_code: &str, lecture_id: &str) -> Result<Option<String>> {
        let url = self.endpoints.lecture_url(Endpoint::Group, lecture_id);
        let markup = self.get_page("resolve_partner_name", &url).await?;
        Ok(extract::partner_name(&markup, partner_code))
    }

    /// 查找文件的小组提交码，没有时返回空字符串
    pub async fn resolve_partner_code(&self, file_name: &str, lecture_id: &str) -> Result<String> {
        let url = self.endpoints.lecture_url(Endpoint::Group, lecture_id);
        let markup = self.get_page("resolve_partner_code", &url).await?;
        Ok(extract::partner_code(&markup, file_name))
    }

    /// 关闭客户端并释放会话
    ///
    /// 释放失败只记录日志，不返回给调用方。
    pub fn close(self) {
        let EstClient { session, .. } = self;
        match session.close() {
            Ok(()) => debug!("会话已关闭"),
            Err(e) => warn!("{}", e),
        }
    }

    async fn get_page(&self, operation: &'static str, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .session
            .http()
            .get(url)
            .send()
            .await
            .map_err(|e| EstError::transport(operation, url, e))?;
        read_body(operation, url, response).await
    }
}

async fn read_body(operation: &'static str, url: &str, response: Response) -> Result<String> {
    let response = response
        .error_for_status()
        .map_err(|e| EstError::transport(operation, url, e))?;
    let body = response
        .text()
        .await
        .map_err(|e| EstError::transport(operation, url, e))?;
    debug!("{} 响应: {}", operation, truncate_text(&body, 200));
    Ok(body)
}
