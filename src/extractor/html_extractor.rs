//! HTML标签提取器
//! 从页面字节流中提取script-src与meta标签，供信号通道检查按选择器读取

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

use crate::error::{RswebprobeError, RwpResult};

/// HTML输入守卫：进入DOM/正则分析前确保输入可解析且不会拖垮引擎
pub struct HtmlInputGuard;

impl HtmlInputGuard {
    /// 最大HTML长度（2MB），超出部分在UTF-8边界截断
    pub const MAX_HTML_LEN: usize = 2 * 1024 * 1024;
    /// 二进制嗅探窗口
    const SNIFF_LEN: usize = 1024;

    /// 校验并解码页面字节流
    /// 嗅探窗口内出现NUL字节视为二进制内容，判定为不可解析文档
    pub fn guard(body: &[u8]) -> RwpResult<Cow<'_, str>> {
        let sniff = &body[..body.len().min(Self::SNIFF_LEN)];
        if sniff.contains(&0u8) {
            return Err(RswebprobeError::HtmlParseError(
                "body is binary content, not a navigable document".to_string(),
            ));
        }

        let mut text = String::from_utf8_lossy(body);
        if text.len() > Self::MAX_HTML_LEN {
            let mut cut = Self::MAX_HTML_LEN;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text = Cow::Owned(text[..cut].to_string());
        }

        Ok(text)
    }
}

/// 页面DOM查询能力：script-src列表与meta标签内容按name查询
#[derive(Debug, Default, Clone)]
pub struct PageDom {
    script_srcs: Vec<String>,
    meta_tags: Vec<(String, String)>,
}

impl PageDom {
    /// 从HTML字符串构建（流式tokenizer，单趟遍历）
    pub fn parse(html: &str) -> Self {
        let tokenizer = Tokenizer::new(DomSink::default(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink.into_dom()
    }

    /// 文档顺序的script-src列表
    pub fn script_srcs(&self) -> &[String] {
        &self.script_srcs
    }

    /// 按name查询meta标签content（同名meta可能出现多次，全部返回）
    pub fn meta_contents<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        let name = name.to_lowercase();
        self.meta_tags
            .iter()
            .filter(move |(n, _)| *n == name)
            .map(|(_, content)| content.as_str())
    }
}

/// tokenizer回调收集器
#[derive(Default)]
struct DomSink {
    script_srcs: RefCell<Vec<String>>,
    meta_tags: RefCell<Vec<(String, String)>>,
}

impl DomSink {
    fn into_dom(self) -> PageDom {
        PageDom {
            script_srcs: self.script_srcs.into_inner(),
            meta_tags: self.meta_tags.into_inner(),
        }
    }

    fn collect_script_src(&self, attrs: &[Attribute]) {
        for attr in attrs {
            if attr.name.local.as_ref() == "src" {
                self.script_srcs.borrow_mut().push(attr.value.to_string());
                break;
            }
        }
    }

    fn collect_meta(&self, attrs: &[Attribute]) {
        let mut name = None;
        let mut content = None;

        for attr in attrs {
            match attr.name.local.as_ref() {
                "name" => name = Some(attr.value.to_string().to_lowercase()),
                "content" => content = Some(attr.value.to_string()),
                _ => {}
            }
        }

        if let (Some(n), Some(c)) = (name, content) {
            self.meta_tags.borrow_mut().push((n, c));
        }
    }
}

impl TokenSink for DomSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            match name.as_ref() {
                "script" => self.collect_script_src(&attrs),
                "meta" => self.collect_meta(&attrs),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_dom_extracts_scripts_and_meta() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="author" content="test_user">
            <meta name="Generator" content="WordPress 5.4" />
            <script src="/vue.global.js"></script>
        "#;

        let dom = PageDom::parse(html);

        assert_eq!(
            dom.script_srcs(),
            &["/jquery.min.js".to_string(), "/vue.global.js".to_string()]
        );
        assert_eq!(
            dom.meta_contents("generator").collect::<Vec<_>>(),
            vec!["WordPress 5.4"]
        );
        assert_eq!(dom.meta_contents("missing").count(), 0);
    }

    #[test]
    fn test_guard_rejects_binary_body() {
        // 测试场景：二进制内容不是可解析文档
        let body = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
        assert!(HtmlInputGuard::guard(body).is_err());
    }

    #[test]
    fn test_guard_accepts_html_and_empty_body() {
        assert_eq!(HtmlInputGuard::guard(b"<html></html>").unwrap(), "<html></html>");
        assert_eq!(HtmlInputGuard::guard(b"").unwrap(), "");
    }
}
