//! 目标可观测面
//! 一次抓取得到的全部可匹配信号：响应体、最终URL、响应头、Cookie

use std::collections::HashMap;

/// 目标可观测面（每个目标一份，由抓取结果或离线数据组装）
#[derive(Debug, Clone, Default)]
pub struct TargetSurface {
    /// 最终URL（重定向后）
    pub url: String,
    /// 响应状态码
    pub status: u16,
    /// 原始响应体字节
    pub body: Vec<u8>,
    /// 响应头（小写键名，多值）
    pub headers: HashMap<String, Vec<String>>,
    /// Cookie表（name -> value）
    pub cookies: HashMap<String, String>,
}

impl TargetSurface {
    /// 构造离线可观测面（确定性测试/批量离线分析用）
    pub fn new(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            body: body.into(),
            ..Default::default()
        }
    }

    /// 追加一条响应头（键名自动小写）
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_lowercase())
            .or_default()
            .push(value.to_string());
        self
    }

    /// 追加一条Cookie
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    /// 按小写键名读取响应头的全部值
    pub fn header_values(&self, name: &str) -> Option<&Vec<String>> {
        self.headers.get(name)
    }
}
