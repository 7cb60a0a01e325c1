//! Header格式转换工具
//! HTTP响应头转内部多值映射，并从Set-Cookie中提取Cookie表

use std::collections::HashMap;

use reqwest::header::HeaderMap;
use tracing::warn;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 防御异常响应的迭代上限
    const MAX_HEADER_COUNT: usize = 1000;

    /// 将HeaderMap转换为小写键名的多值映射
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();

        for (i, (key, value)) in header_map.iter().enumerate() {
            if i >= Self::MAX_HEADER_COUNT {
                warn!("响应头超过{}条，截断处理", Self::MAX_HEADER_COUNT);
                break;
            }

            let key_str = key.as_str().to_lowercase();
            let value_str = value.to_str().unwrap_or("").to_string();

            map.entry(key_str).or_default().push(value_str);
        }

        map
    }

    /// 从多值Header映射中提取Cookie表（name -> value）
    /// 取每条Set-Cookie首个 `name=value` 对，属性段（Path/Expires等）丢弃
    pub fn extract_cookies(headers: &HashMap<String, Vec<String>>) -> HashMap<String, String> {
        let mut cookies = HashMap::new();

        let Some(set_cookie_values) = headers.get("set-cookie") else {
            return cookies;
        };

        for raw in set_cookie_values {
            let Some(pair) = raw.split(';').next() else {
                continue;
            };
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    cookies.insert(name.to_string(), value.trim().to_string());
                }
            }
        }

        cookies
    }
}
