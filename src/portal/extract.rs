//! 页面解析 - 把门户返回的 HTML 转换成领域数据
//!
//! 这里的函数都是同步的纯函数，输入是响应正文，输出是自有数据，
//! 解析出的文档不会跨越 `.await`。

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{EstError, Result};
use crate::html::Document;
use crate::portal::types::{FileSlotId, Lecture, SubmissionStatus};

/// 错误信息容器的 id
pub const ERROR_ID: &str = "estError";
/// 首页主体内容容器的 id
pub const CONTENT_ID: &str = "estContent";
/// 页脚菜单（版本号所在位置）的 id
pub const FOOTER_ID: &str = "footermenu";
/// 小组提交码所在 span 的 class
pub const PARTNER_MARKER: &str = "submissionGroupDynamicCode";
/// 伙伴姓名后面跟着的两个格式字符
const PARTNER_NAME_SUFFIX_LEN: usize = 2;

fn lecture_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"index\.html\?lectureId=([^&#]+)").expect("课程链接正则无效"))
}

/// 读取页面上的错误信息
///
/// 没有错误容器时返回 `None`；有容器但没有文本时返回空字符串。
pub fn error_reason(markup: &str) -> Option<String> {
    let doc = Document::parse(markup);
    let error = doc.find_by_id(ERROR_ID)?;
    Some(error.following_text().map(|t| t.trim().to_string()).unwrap_or_default())
}

/// 在上传页上查找文件位置
pub fn file_slot(markup: &str, file_name: &str) -> Option<FileSlotId> {
    let doc = Document::parse(markup);
    let label = doc.find_by_tag_and_text("label", file_name)?;
    match label.attr("for") {
        Some(id) if !id.is_empty() => Some(FileSlotId::new(id)),
        _ => {
            debug!("文件 '{}' 的 label 缺少 for 属性", file_name);
            None
        }
    }
}

/// 在概览页上查找文件的下载链接
pub fn download_href(markup: &str, file_name: &str) -> Result<String> {
    let doc = Document::parse(markup);
    let cell = doc
        .find_by_tag_and_text("td", file_name)
        .ok_or_else(|| EstError::element_not_found("check_file", format!("概览页上没有文件 '{}'", file_name)))?;
    let link = cell
        .find_next("a")
        .ok_or_else(|| EstError::element_not_found("check_file", format!("文件 '{}' 后面没有下载链接", file_name)))?;
    link.attr("href")
        .map(str::to_string)
        .ok_or_else(|| EstError::element_not_found("check_file", format!("文件 '{}' 的下载链接缺少 href", file_name)))
}

/// 在概览页上读取文件的提交状态
pub fn submission_status(markup: &str, file_name: &str) -> Result<SubmissionStatus> {
    let doc = Document::parse(markup);
    let Some(cell) = doc.find_by_tag_and_text("td", file_name) else {
        return Ok(SubmissionStatus::NoStatus);
    };
    let indicator = cell
        .find_previous("span")
        .ok_or_else(|| EstError::element_not_found("check_status", format!("文件 '{}' 前面没有状态图标", file_name)))?;
    indicator
        .attr("title")
        .map(|t| SubmissionStatus::Reported(t.to_string()))
        .ok_or_else(|| EstError::element_not_found("check_status", format!("文件 '{}' 的状态图标缺少 title", file_name)))
}

/// 从首页读取课程列表，按 (id, 名称) 去重并保持首次出现的顺序
pub fn lectures(markup: &str) -> Result<Vec<Lecture>> {
    let doc = Document::parse(markup);
    let content = doc
        .find_by_id(CONTENT_ID)
        .ok_or_else(|| EstError::element_not_found("list_lectures", format!("首页缺少 #{}", CONTENT_ID)))?;

    let mut seen = HashSet::new();
    let mut result = Vec::new();
    let mut anchor = content.find_next("a");
    while let Some(a) = anchor {
        anchor = a.find_next("a");
        let Some(href) = a.attr("href") else {
            continue;
        };
        let Some(caps) = lecture_link().captures(href) else {
            continue;
        };
        let lecture = Lecture::new(&caps[1], a.text().trim());
        if seen.insert(lecture.clone()) {
            result.push(lecture);
        }
    }
    Ok(result)
}

/// 从首页页脚读取门户版本文本，原样返回（不去除空白）
pub fn version_text(markup: &str) -> Result<String> {
    let doc = Document::parse(markup);
    let footer = doc
        .find_by_id(FOOTER_ID)
        .ok_or_else(|| EstError::element_not_found("get_version", format!("首页缺少 #{}", FOOTER_ID)))?;
    let item = footer
        .find_next("li")
        .ok_or_else(|| EstError::element_not_found("get_version", "页脚菜单中没有列表项"))?;
    Ok(item.text())
}

/// 根据小组提交码查找伙伴姓名
///
/// 姓名是提交码 span 之前的文本，去掉末尾两个格式字符后再去掉空白。
pub fn partner_name(markup: &str, partner_code: &str) -> Option<String> {
    let doc = Document::parse(markup);
    let span = doc.find_by_tag_and_text("span", partner_code)?;
    let text = span.preceding_text()?;
    let keep = text.chars().count().saturating_sub(PARTNER_NAME_SUFFIX_LEN);
    let name: String = text.chars().take(keep).collect();
    Some(name.trim().to_string())
}

/// 查找文件对应的小组提交码
///
/// 从文件所在单元格开始向后扫描到文档末尾，找不到时返回空字符串。
pub fn partner_code(markup: &str, file_name: &str) -> String {
    let doc = Document::parse(markup);
    let Some(cell) = doc.find_by_tag_and_text("td", file_name) else {
        return String::new();
    };
    cell.scan_from(|e| e.has_class(PARTNER_MARKER))
        .map(|marker| marker.text().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERVIEW: &str = r#"
        <html><body><div id="estContent"><table>
          <tr>
            <td><span class="icon" title="Abgabe erfolgreich"></span></td>
            <td>blatt01.c</td>
            <td><a href="download.html?fileId=11">Download</a></td>
          </tr>
          <tr>
            <td><span class="icon"></span></td>
            <td>blatt02.c</td>
            <td><a>Download</a></td>
          </tr>
        </table></div></body></html>
    "#;

    #[test]
    fn test_error_reason() {
        assert_eq!(error_reason("<html><body><p>Willkommen</p></body></html>"), None);
        assert_eq!(
            error_reason(r#"<div id="estError"> Invalid password </div>"#).as_deref(),
            Some("Invalid password")
        );
        assert_eq!(error_reason(r#"<div id="estError"></div>"#).as_deref(), Some(""));
    }

    #[test]
    fn test_empty_error_container_ignores_page_text() {
        let markup = r#"<div id="estError"></div><div id="estContent"><p>Willkommen, Max</p></div>"#;
        assert_eq!(error_reason(markup).as_deref(), Some(""));
    }

    #[test]
    fn test_file_slot() {
        let markup = r#"
            <form><label for="f0a1b2">blatt01.c</label><input type="file" id="f0a1b2">
            <label>blatt02.c</label></form>
        "#;
        assert_eq!(file_slot(markup, "blatt01.c"), Some(FileSlotId::new("f0a1b2")));
        assert_eq!(file_slot(markup, "blatt02.c"), None);
        assert_eq!(file_slot(markup, "blatt03.c"), None);
    }

    #[test]
    fn test_download_href() {
        assert_eq!(download_href(OVERVIEW, "blatt01.c").unwrap(), "download.html?fileId=11");
        assert!(matches!(
            download_href(OVERVIEW, "blatt02.c"),
            Err(EstError::ElementNotFound { operation: "check_file", .. })
        ));
        assert!(matches!(
            download_href(OVERVIEW, "fehlt.c"),
            Err(EstError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_submission_status() {
        assert_eq!(
            submission_status(OVERVIEW, "blatt01.c").unwrap(),
            SubmissionStatus::Reported("Abgabe erfolgreich".to_string())
        );
        assert_eq!(submission_status(OVERVIEW, "fehlt.c").unwrap(), SubmissionStatus::NoStatus);
        assert!(submission_status(OVERVIEW, "blatt02.c").is_err());
    }

    #[test]
    fn test_lectures_deduplicated_in_order() {
        let markup = r#"
            <div id="menu"><a href="index.html?lectureId=99">Vor dem Inhalt</a></div>
            <div id="estContent">
              <a href="index.html?lectureId=12&action=show">Algorithmen</a>
              <a href="impressum.html">Impressum</a>
              <a href="index.html?lectureId=7">Systemprogrammierung</a>
              <a href="index.html?lectureId=12&action=show">Algorithmen</a>
              <a>ohne Ziel</a>
              <a href="index.html?lectureId=12">Algorithmen II</a>
            </div>
        "#;
        let lectures = lectures(markup).unwrap();
        assert_eq!(
            lectures,
            vec![
                Lecture::new("12", "Algorithmen"),
                Lecture::new("7", "Systemprogrammierung"),
                Lecture::new("12", "Algorithmen II"),
            ]
        );
    }

    #[test]
    fn test_lectures_without_container() {
        assert!(matches!(
            lectures("<body><a href=\"index.html?lectureId=1\">x</a></body>"),
            Err(EstError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_version_text() {
        let markup = r#"<div id="footermenu"><ul><li> Version 2.0.2384 </li><li>Impressum</li></ul></div>"#;
        assert_eq!(version_text(markup).unwrap(), " Version 2.0.2384 ");
        assert!(version_text("<div id=\"footermenu\"></div>").is_err());
    }

    #[test]
    fn test_partner_name_strips_suffix() {
        let markup = r#"<p>Erika Musterfrau (<span class="code">K7Q2</span>)</p>"#;
        assert_eq!(partner_name(markup, "K7Q2").as_deref(), Some("Erika Musterfrau"));
        assert_eq!(partner_name(markup, "NOPE"), None);
    }

    #[test]
    fn test_partner_name_without_leading_text() {
        let markup = "<table><tr><td><span>K7Q2</span></td></tr></table>";
        assert_eq!(partner_name(markup, "K7Q2"), None);
    }

    #[test]
    fn test_partner_code_scans_rest_of_document() {
        let markup = r#"
            <table>
              <tr><td>blatt01.c</td><td>offen</td></tr>
              <tr><td>blatt02.c</td><td><span class="submissionGroupDynamicCode"> AB12 </span></td></tr>
            </table>
        "#;
        assert_eq!(partner_code(markup, "blatt01.c"), "AB12");
        assert_eq!(partner_code(markup, "blatt02.c"), "AB12");
    }

    #[test]
    fn test_partner_code_without_marker_is_empty() {
        let markup = r#"
            <span class="submissionGroupDynamicCode">VORHER</span>
            <table><tr><td>blatt01.c</td><td>keine Gruppe</td></tr></table>
        "#;
        assert_eq!(partner_code(markup, "blatt01.c"), "");
        assert_eq!(partner_code(markup, "fehlt.c"), "");
    }
}
