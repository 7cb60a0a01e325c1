//! 提取模块：页面字节流守卫与HTML标签提取

pub mod html_extractor;

pub use self::html_extractor::{HtmlInputGuard, PageDom};
