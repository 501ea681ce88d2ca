//! 模板语法树
//!
//! 规则文件中的模板被解析为一棵持有的 XML 节点树。节点可哈希，
//! random 标签以此为每个元素派生稳定的身份。

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// 模板节点：文本或元素
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateNode {
    /// 文本内容
    Text(String),
    /// 元素节点
    Element(Element),
}

/// 模板元素
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    /// 标签名
    pub name: String,
    /// 属性，按文档顺序
    pub attributes: Vec<(String, String)>,
    /// 子节点
    pub children: Vec<TemplateNode>,
}

impl Element {
    /// 创建空元素
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 读取属性值
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 元素身份：内容哈希
    ///
    /// 同一规则文件里的同一元素在重新加载后仍得到相同身份。
    pub fn identity(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// 子元素（跳过文本节点）
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            TemplateNode::Element(e) => Some(e),
            TemplateNode::Text(_) => None,
        })
    }

    /// 直接文本内容（不含子元素）
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let TemplateNode::Text(t) = node {
                out.push_str(t);
            }
        }
        out
    }

    /// 还原为标记文本，用于未知标签的原样输出
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attributes {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(v);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return out;
        }
        out.push('>');
        for child in &self.children {
            match child {
                TemplateNode::Text(t) => out.push_str(t),
                TemplateNode::Element(e) => out.push_str(&e.render()),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element {
            name: "template".into(),
            attributes: vec![],
            children: vec![
                TemplateNode::Text("Hello, ".into()),
                TemplateNode::Element(Element::new("star")),
                TemplateNode::Text(".".into()),
            ],
        }
    }

    #[test]
    fn test_identity_stable_for_equal_elements() {
        assert_eq!(sample().identity(), sample().identity());
    }

    #[test]
    fn test_identity_differs_for_different_content() {
        let mut other = sample();
        other.children.push(TemplateNode::Text("!".into()));
        assert_ne!(sample().identity(), other.identity());
    }

    #[test]
    fn test_attribute_lookup() {
        let mut element = Element::new("get");
        element.attributes.push(("name".into(), "mood".into()));
        assert_eq!(element.attribute("name"), Some("mood"));
        assert_eq!(element.attribute("value"), None);
    }

    #[test]
    fn test_render_round_trip_shape() {
        assert_eq!(sample().render(), "<template>Hello, <star/>.</template>");
    }
}
