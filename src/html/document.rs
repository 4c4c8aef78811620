//! HTML 查询原语
//!
//! 只提供门户抓取需要的最小查询能力：按 id 查找、按标签和文本查找、
//! 按标签查找全部，以及在已找到元素上的相对导航。
//! 所有导航都在预先生成的文档顺序节点序列上做有界线性扫描。

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node};

/// 单次向前/向后扫描的最大节点数
pub const SCAN_LIMIT: usize = 100_000;

/// 解析后的 HTML 文档
pub struct Document {
    html: Html,
    /// 文档顺序（先序遍历）的节点 id
    order: Vec<NodeId>,
    position: HashMap<NodeId, usize>,
}

/// 文档中的一个元素句柄，只读
#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    el: ElementRef<'a>,
    index: usize,
}

impl Document {
    /// 解析 HTML 文本
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let order: Vec<NodeId> = html.tree.root().descendants().map(|n| n.id()).collect();
        let position = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Self {
            html,
            order,
            position,
        }
    }

    /// 按 id 属性查找第一个元素
    pub fn find_by_id(&self, id: &str) -> Option<Element<'_>> {
        self.elements().find(|e| e.el.value().id() == Some(id))
    }

    /// 按标签和可见文本查找第一个元素
    ///
    /// 文本是精确匹配（忽略首尾空白），不是子串匹配。
    pub fn find_by_tag_and_text(&self, tag: &str, text: &str) -> Option<Element<'_>> {
        let wanted = text.trim();
        self.elements()
            .filter(|e| e.name().eq_ignore_ascii_case(tag))
            .find(|e| e.text().trim() == wanted)
    }

    /// 按标签查找全部元素，保持文档顺序
    pub fn find_all_by_tag(&self, tag: &str) -> Vec<Element<'_>> {
        self.elements()
            .filter(|e| e.name().eq_ignore_ascii_case(tag))
            .collect()
    }

    fn elements(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        (0..self.order.len()).filter_map(move |i| self.element_at(i))
    }

    fn node_at(&self, index: usize) -> Option<NodeRef<'_, Node>> {
        self.order.get(index).and_then(|id| self.html.tree.get(*id))
    }

    fn element_at(&self, index: usize) -> Option<Element<'_>> {
        let el = ElementRef::wrap(self.node_at(index)?)?;
        Some(Element {
            doc: self,
            el,
            index,
        })
    }

    fn wrap<'a>(&'a self, node: NodeRef<'a, Node>) -> Option<Element<'a>> {
        let index = *self.position.get(&node.id())?;
        let el = ElementRef::wrap(node)?;
        Some(Element {
            doc: self,
            el,
            index,
        })
    }
}

impl<'a> Element<'a> {
    /// 标签名（小写）
    pub fn name(&self) -> &'a str {
        self.el.value().name()
    }

    /// 读取属性
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.el.value().attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.el.value().classes().any(|c| c == class)
    }

    /// 元素内所有文本拼接
    pub fn text(&self) -> String {
        self.el.text().collect()
    }

    /// 下一个兄弟元素（跳过文本节点）
    pub fn next_sibling_element(&self) -> Option<Element<'a>> {
        self.el
            .next_siblings()
            .find(|n| n.value().is_element())
            .and_then(|n| self.doc.wrap(n))
    }

    /// 上一个兄弟元素（跳过文本节点）
    pub fn prev_sibling_element(&self) -> Option<Element<'a>> {
        self.el
            .prev_siblings()
            .find(|n| n.value().is_element())
            .and_then(|n| self.doc.wrap(n))
    }

    /// 文档顺序中的下一个元素（包括自身的子元素）
    pub fn next_element(&self) -> Option<Element<'a>> {
        self.find_next_matching(|_| true)
    }

    /// 文档顺序中本元素之后第一个指定标签的元素
    pub fn find_next(&self, tag: &str) -> Option<Element<'a>> {
        self.find_next_matching(|e| e.name().eq_ignore_ascii_case(tag))
    }

    /// 文档顺序中本元素之前最近的指定标签的元素（包括祖先元素）
    pub fn find_previous(&self, tag: &str) -> Option<Element<'a>> {
        let doc = self.doc;
        (0..self.index)
            .rev()
            .take(SCAN_LIMIT)
            .filter_map(|i| doc.element_at(i))
            .find(|e| e.name().eq_ignore_ascii_case(tag))
    }

    /// 从本元素开始（包括自身）向后扫描，返回第一个满足条件的元素
    ///
    /// 扫描到文档末尾或达到 [`SCAN_LIMIT`] 时返回 `None`。
    pub fn scan_from<P>(&self, predicate: P) -> Option<Element<'a>>
    where
        P: Fn(&Element<'a>) -> bool,
    {
        let doc = self.doc;
        (self.index..doc.order.len())
            .take(SCAN_LIMIT)
            .filter_map(|i| doc.element_at(i))
            .find(|e| predicate(e))
    }

    fn find_next_matching<P>(&self, predicate: P) -> Option<Element<'a>>
    where
        P: Fn(&Element<'a>) -> bool,
    {
        let doc = self.doc;
        (self.index + 1..doc.order.len())
            .take(SCAN_LIMIT)
            .filter_map(|i| doc.element_at(i))
            .find(|e| predicate(e))
    }

    /// 本元素内部第一段非空白文本
    ///
    /// 只在本元素的后代中查找，元素没有文本时返回 `None`。
    pub fn following_text(&self) -> Option<&'a str> {
        self.el
            .descendants()
            .skip(1)
            .take(SCAN_LIMIT)
            .filter_map(|n| n.value().as_text().map(|t| &**t))
            .find(|t| !t.trim().is_empty())
    }

    /// 文档顺序中紧挨在本元素之前的节点的文本
    ///
    /// 前一个节点是文本节点时返回其内容，是元素时返回元素内全部文本。
    /// 本元素是父元素的第一个子节点时，前一个节点就是父元素，返回 `None`。
    pub fn preceding_text(&self) -> Option<String> {
        let index = self.index.checked_sub(1)?;
        let node = self.doc.node_at(index)?;
        if self.el.parent().map(|p| p.id()) == Some(node.id()) {
            return None;
        }
        match node.value() {
            Node::Text(text) => Some(text.to_string()),
            Node::Element(_) => ElementRef::wrap(node).map(|e| e.text().collect()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        <html><body>
          <div id="estContent">
            <table>
              <tr>
                <td><span class="status" title="bewertet"></span></td>
                <td>blatt01.c</td>
                <td><a href="download.html?id=7">laden</a></td>
              </tr>
              <tr>
                <td>blatt02.c</td>
              </tr>
            </table>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_find_by_id() {
        let doc = Document::parse(TABLE);
        let content = doc.find_by_id("estContent").expect("应该找到容器");
        assert_eq!(content.name(), "div");
        assert!(doc.find_by_id("missing").is_none());
    }

    #[test]
    fn test_find_by_tag_and_text_is_exact() {
        let doc = Document::parse(TABLE);
        assert!(doc.find_by_tag_and_text("td", "blatt01.c").is_some());
        assert!(doc.find_by_tag_and_text("td", "blatt01").is_none());
        assert!(doc.find_by_tag_and_text("span", "blatt01.c").is_none());
    }

    #[test]
    fn test_find_all_by_tag_keeps_order() {
        let doc = Document::parse(TABLE);
        let cells: Vec<String> = doc
            .find_all_by_tag("td")
            .iter()
            .map(|e| e.text().trim().to_string())
            .collect();
        assert_eq!(cells, vec!["", "blatt01.c", "laden", "blatt02.c"]);
        assert!(doc.find_all_by_tag("li").is_empty());
    }

    #[test]
    fn test_relative_navigation() {
        let doc = Document::parse(TABLE);
        let cell = doc.find_by_tag_and_text("td", "blatt01.c").unwrap();

        let link = cell.find_next("a").expect("后面应该有链接");
        assert_eq!(link.attr("href"), Some("download.html?id=7"));

        let status = cell.find_previous("span").expect("前面应该有状态");
        assert_eq!(status.attr("title"), Some("bewertet"));

        assert_eq!(cell.next_sibling_element().unwrap().text(), "laden");
        assert!(cell.prev_sibling_element().unwrap().find_next("span").is_some());
    }

    #[test]
    fn test_missing_relations_are_none() {
        let doc = Document::parse(TABLE);
        let last = doc.find_by_tag_and_text("td", "blatt02.c").unwrap();
        assert!(last.next_sibling_element().is_none());
        assert!(last.prev_sibling_element().is_none());
        assert!(last.find_next("a").is_none());
        assert!(last.next_element().is_none());
        assert!(last.attr("for").is_none());
    }

    #[test]
    fn test_text_neighbours() {
        let doc = Document::parse(r#"<p>Max Mustermann (<span>ABC123</span>)</p><div id="estError"> Falsches Passwort </div>"#);
        let span = doc.find_by_tag_and_text("span", "ABC123").unwrap();
        assert_eq!(span.preceding_text().as_deref(), Some("Max Mustermann ("));

        let error = doc.find_by_id("estError").unwrap();
        assert_eq!(error.following_text(), Some(" Falsches Passwort "));
    }

    #[test]
    fn test_following_text_stays_inside_element() {
        let doc = Document::parse(r#"<div id="estError"> </div><div id="estContent"><p>Willkommen, Max</p></div>"#);
        let error = doc.find_by_id("estError").unwrap();
        assert_eq!(error.following_text(), None);

        let doc = Document::parse(r#"<div id="estError"><b></b><span>Sitzung abgelaufen</span></div><p>danach</p>"#);
        let error = doc.find_by_id("estError").unwrap();
        assert_eq!(error.following_text(), Some("Sitzung abgelaufen"));
    }

    #[test]
    fn test_preceding_text_ignores_parent() {
        let doc = Document::parse("<table><tr><td><span>K7Q2</span></td></tr></table>");
        let span = doc.find_by_tag_and_text("span", "K7Q2").unwrap();
        assert_eq!(span.preceding_text(), None);

        let doc = Document::parse("<p><b>Erika</b><span>K7Q2</span></p>");
        let span = doc.find_by_tag_and_text("span", "K7Q2").unwrap();
        assert_eq!(span.preceding_text().as_deref(), Some("Erika"));
    }

    #[test]
    fn test_scan_from_includes_self() {
        let doc = Document::parse(r#"<table><tr><td class="x">a</td><td>b</td></tr></table>"#);
        let cell = doc.find_by_tag_and_text("td", "a").unwrap();
        assert!(cell.scan_from(|e| e.has_class("x")).is_some());
        let other = doc.find_by_tag_and_text("td", "b").unwrap();
        assert!(other.scan_from(|e| e.has_class("x")).is_none());
    }
}
