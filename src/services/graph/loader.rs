//! AIML Rule Loader
//!
//! Parses AIML-shaped XML rule files into categories. The template
//! subtree is kept as an owned node tree; pattern, that and topic are
//! whitespace-normalized text. `<topic name="...">` groups assign their
//! topic to every enclosed category that does not carry its own.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::models::category::Category;
use crate::models::template::{Element, TemplateNode};
use crate::services::normalizer::normalize_whitespace;

/// Loads categories from AIML sources.
pub struct AimlLoader;

impl AimlLoader {
    /// Reads and parses one rule file.
    pub fn load_file(path: &Path) -> Result<Vec<Category>> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse_str(&xml, &path.display().to_string())
    }

    /// Parses rule text. `source` tags every produced category for
    /// unload/reload bookkeeping.
    pub fn parse_str(xml: &str, source: &str) -> Result<Vec<Category>> {
        let root = parse_document(xml)?;
        if root.name != "aiml" {
            return Err(EngineError::RuleParse(format!(
                "expected <aiml> root, found <{}> in {}",
                root.name, source
            )));
        }

        let mut categories = Vec::new();
        for child in root.child_elements() {
            match child.name.as_str() {
                "topic" => {
                    let topic = child.attribute("name").unwrap_or("*").to_string();
                    for grandchild in child.child_elements() {
                        if grandchild.name == "category" {
                            collect_category(grandchild, &topic, source, &mut categories);
                        }
                    }
                }
                "category" => collect_category(child, "*", source, &mut categories),
                other => {
                    warn!(element = %other, %source, "ignoring unexpected element under <aiml>");
                }
            }
        }
        Ok(categories)
    }
}

fn collect_category(category: &Element, group_topic: &str, source: &str, out: &mut Vec<Category>) {
    let pattern = category
        .child_elements()
        .find(|e| e.name == "pattern")
        .map(|e| normalize_whitespace(&e.text_content()));
    let template = category
        .child_elements()
        .find(|e| e.name == "template")
        .cloned();

    let (Some(pattern), Some(template)) = (pattern, template) else {
        warn!(%source, "skipping category without pattern or template");
        return;
    };
    if pattern.is_empty() {
        warn!(%source, "skipping category with empty pattern");
        return;
    }

    let that = category
        .child_elements()
        .find(|e| e.name == "that")
        .map(|e| normalize_whitespace(&e.text_content()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "*".to_string());
    let topic = category
        .child_elements()
        .find(|e| e.name == "topic")
        .map(|e| normalize_whitespace(&e.text_content()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| group_topic.to_string());

    let mut parsed = Category::new(&pattern, &that, &topic, template);
    parsed.source = source.to_string();
    out.push(parsed);
}

/// Parses a whole XML document into one element tree.
fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| EngineError::RuleParse("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| EngineError::RuleParse(e.to_string()))?
                    .to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(TemplateNode::Text(text));
                }
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t.into_inner()).to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(TemplateNode::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(EngineError::RuleParse("unclosed element".into()));
    }
    root.ok_or_else(|| EngineError::RuleParse("empty rule document".into()))
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(TemplateNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn element_from(start: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
    let mut element = Element::new(&name);
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| EngineError::RuleParse(e.to_string()))?
            .to_string();
        element.attributes.push((key, value));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<aiml>
  <category>
    <pattern>HI</pattern>
    <template>Hello there!</template>
  </category>
  <category>
    <pattern>MY NAME IS *</pattern>
    <template>Nice to meet you, <star/>.</template>
  </category>
  <category>
    <pattern>YES</pattern>
    <that>DO YOU LIKE CATS</that>
    <template>Me too!</template>
  </category>
  <topic name="WEATHER">
    <category>
      <pattern>IS IT NICE</pattern>
      <template>Lovely.</template>
    </category>
  </topic>
</aiml>"#;

    #[test]
    fn test_parse_counts_and_contexts() {
        let categories = AimlLoader::parse_str(SAMPLE, "sample.aiml").unwrap();
        assert_eq!(categories.len(), 4);

        assert_eq!(categories[0].pattern, "HI");
        assert_eq!(categories[0].that, "*");
        assert_eq!(categories[0].topic, "*");
        assert_eq!(categories[0].source, "sample.aiml");

        assert_eq!(categories[2].that, "DO YOU LIKE CATS");
        assert_eq!(categories[3].topic, "WEATHER");
    }

    #[test]
    fn test_template_subtree_preserved() {
        let categories = AimlLoader::parse_str(SAMPLE, "sample.aiml").unwrap();
        let template = &categories[1].template;
        assert!(template.child_elements().any(|e| e.name == "star"));
        assert!(template.text_content().starts_with("Nice to meet you"));
    }

    #[test]
    fn test_category_without_pattern_is_skipped() {
        let xml = r#"<aiml><category><template>orphan</template></category>
            <category><pattern>OK</pattern><template>fine</template></category></aiml>"#;
        let categories = AimlLoader::parse_str(xml, "broken.aiml").unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].pattern, "OK");
    }

    #[test]
    fn test_non_aiml_root_is_error() {
        assert!(AimlLoader::parse_str("<rules/>", "bad.xml").is_err());
    }

    #[test]
    fn test_unclosed_document_is_error() {
        assert!(AimlLoader::parse_str("<aiml><category>", "bad.xml").is_err());
    }
}
