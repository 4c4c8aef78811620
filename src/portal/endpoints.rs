//! 门户端点模板表
//!
//! 构造时一次性生成，之后只读。

use std::collections::HashMap;

use reqwest::Url;

use crate::error::{EstError, Result};

const LECTURE_SLOT: &str = "{lecture_id}";

/// 门户端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// 门户首页（课程列表、版本号）
    Home,
    Login,
    /// 上传页（查找文件位置）
    Upload,
    /// 上传表单提交地址
    UploadView,
    /// 提交概览页（状态、下载链接）
    Check,
    /// 小组提交页
    Group,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::Home,
        Endpoint::Login,
        Endpoint::Upload,
        Endpoint::UploadView,
        Endpoint::Check,
        Endpoint::Group,
    ];

    /// 符号名称
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Home => "home",
            Endpoint::Login => "login",
            Endpoint::Upload => "upload",
            Endpoint::UploadView => "upload_view",
            Endpoint::Check => "check",
            Endpoint::Group => "group",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Endpoint::Home => "/",
            Endpoint::Login => "/login.html?action=student",
            Endpoint::Upload => "/exercise.html?lectureId={lecture_id}&action=submit&tab=upload",
            Endpoint::UploadView => "/exercise.html",
            Endpoint::Check => "/judging.html?lectureId={lecture_id}&action=submit&tab=overview",
            Endpoint::Group => "/submissiongroupdynamic.html?lectureId={lecture_id}&action=submit&tab=overview",
        }
    }
}

/// 端点 URL 表
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    table: HashMap<Endpoint, String>,
}

impl Endpoints {
    /// 基于门户根地址生成完整的端点表
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base = Url::parse(&format!("{}/", trimmed)).map_err(|e| EstError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let table = Endpoint::ALL
            .iter()
            .map(|ep| (*ep, format!("{}{}", trimmed, ep.template())))
            .collect();
        Ok(Self { base, table })
    }

    /// 不带课程参数的端点地址
    pub fn url(&self, endpoint: Endpoint) -> String {
        self.table
            .get(&endpoint)
            .map(|t| t.replace(LECTURE_SLOT, ""))
            .unwrap_or_default()
    }

    /// 代入课程 id 的端点地址
    ///
    /// 课程 id 作为查询参数值进行百分号编码。
    pub fn lecture_url(&self, endpoint: Endpoint, lecture_id: &str) -> String {
        let Some(template) = self.table.get(&endpoint) else {
            return String::new();
        };
        if !template.contains(LECTURE_SLOT) {
            return template.clone();
        }
        let Ok(mut url) = Url::parse(template) else {
            return template.replace(LECTURE_SLOT, lecture_id);
        };
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| {
                let value = if value == LECTURE_SLOT {
                    lecture_id.to_string()
                } else {
                    value.into_owned()
                };
                (key.into_owned(), value)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }

    /// 把页面中的链接解析为绝对地址
    pub fn resolve(&self, href: &str) -> Result<Url> {
        self.base.join(href).map_err(|e| EstError::InvalidUrl {
            url: href.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_fully_populated() {
        let endpoints = Endpoints::new("https://est.example.org").unwrap();
        for ep in Endpoint::ALL {
            assert!(!endpoints.url(ep).is_empty(), "端点 {} 缺少模板", ep.name());
        }
    }

    #[test]
    fn test_lecture_substitution() {
        let endpoints = Endpoints::new("https://est.example.org/").unwrap();
        assert_eq!(
            endpoints.lecture_url(Endpoint::Upload, "42"),
            "https://est.example.org/exercise.html?lectureId=42&action=submit&tab=upload"
        );
        assert_eq!(
            endpoints.lecture_url(Endpoint::Group, "7"),
            "https://est.example.org/submissiongroupdynamic.html?lectureId=7&action=submit&tab=overview"
        );
        assert_eq!(endpoints.url(Endpoint::Home), "https://est.example.org/");
        assert_eq!(
            endpoints.url(Endpoint::Login),
            "https://est.example.org/login.html?action=student"
        );
    }

    #[test]
    fn test_lecture_id_is_percent_encoded() {
        let endpoints = Endpoints::new("https://est.example.org").unwrap();
        assert_eq!(
            endpoints.lecture_url(Endpoint::Check, "4 2&tab=x"),
            "https://est.example.org/judging.html?lectureId=4+2%26tab%3Dx&action=submit&tab=overview"
        );
        assert_eq!(
            endpoints.lecture_url(Endpoint::Home, "42"),
            "https://est.example.org/"
        );
    }

    #[test]
    fn test_resolve_relative_and_absolute_links() {
        let endpoints = Endpoints::new("https://est.example.org").unwrap();
        assert_eq!(
            endpoints.resolve("download.html?id=3").unwrap().as_str(),
            "https://est.example.org/download.html?id=3"
        );
        assert_eq!(
            endpoints.resolve("https://cdn.example.org/f.c").unwrap().as_str(),
            "https://cdn.example.org/f.c"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            Endpoints::new("not a url"),
            Err(EstError::InvalidUrl { .. })
        ));
    }
}
