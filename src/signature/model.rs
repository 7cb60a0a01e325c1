//! 签名库原始数据模型
//! 仅存储反序列化后的原始签名数据，无任何业务逻辑

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 签名库文件（顶层结构）
/// `apps` 为技术名 -> 原始签名映射，`categories` 为分类ID -> 分类定义映射
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignatureFile {
    #[serde(default, alias = "technologies")]
    pub apps: HashMap<String, RawSignature>,
    #[serde(default)]
    pub categories: HashMap<String, CategoryDef>,
}

/// 单项技术的原始签名
/// 规则字段兼容 字符串 / 字符串数组 两种写法，统一用 Value 承载，编译期展开
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSignature {
    #[serde(rename = "cats", default, alias = "categories")]
    pub category_ids: Vec<u32>,
    #[serde(default)]
    pub website: Option<String>,

    // 六类信号通道的检测规则
    #[serde(default)]
    pub html: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub script: Option<Value>,
    // 兼容：部分签名源使用 scriptSrc 字段
    #[serde(rename = "scriptSrc", default)]
    pub script_src: Option<Value>,
    #[serde(default)]
    pub headers: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub meta: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub cookies: Option<HashMap<String, Value>>,

    // 关联规则：命中本技术时连带上报的技术名
    #[serde(default)]
    pub implies: Option<Value>,
}

/// 分类定义
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoryDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: Option<u32>,
}
