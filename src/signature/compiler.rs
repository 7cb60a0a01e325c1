//! 签名编译器
//! 将原始签名数据展开并编译为可执行的签名库；任一模式编译失败即整库失败

use std::collections::HashMap;
use std::time::Instant;
use serde_json::Value;
use tracing::debug;

use super::db::{KeyedPatterns, Signature, SignatureDb};
use super::model::{RawSignature, SignatureFile};
use super::pattern::SignaturePattern;
use crate::error::{RswebprobeError, RwpResult};

/// 签名编译器
pub struct SignatureCompiler;

impl SignatureCompiler {
    /// 编译整个签名库
    pub fn compile(file: &SignatureFile) -> RwpResult<SignatureDb> {
        let start = Instant::now();

        // 1. 构建分类映射（ID -> 名称）
        let mut categories = HashMap::new();
        for (id, def) in &file.categories {
            if let Ok(id) = id.parse::<u32>() {
                categories.insert(id, def.name.clone());
            }
        }

        // 2. 逐项编译技术签名
        let mut signatures = Vec::with_capacity(file.apps.len());
        for (name, raw) in &file.apps {
            let signature = Self::compile_signature(name, raw).map_err(|e| {
                RswebprobeError::RuleLoadError(format!("technology {:?}: {}", name, e))
            })?;
            signatures.push(signature);
        }

        debug!(
            "签名库编译完成：{}项技术，{}个分类，耗时{:?}",
            signatures.len(),
            categories.len(),
            start.elapsed()
        );

        Ok(SignatureDb::from_parts(signatures, categories))
    }

    /// 编译单项技术签名
    fn compile_signature(name: &str, raw: &RawSignature) -> RwpResult<Signature> {
        // script 与 scriptSrc 两种字段合并为同一通道
        let mut script = Self::compile_pattern_list(raw.script.as_ref())?;
        script.extend(Self::compile_pattern_list(raw.script_src.as_ref())?);

        Ok(Signature {
            name: name.to_string(),
            category_ids: raw.category_ids.clone(),
            website: raw.website.clone(),
            html: Self::compile_pattern_list(raw.html.as_ref())?,
            url: Self::compile_pattern_list(raw.url.as_ref())?,
            script,
            // Header/Meta名按HTTP惯例不区分大小写，统一小写；Cookie名大小写敏感
            headers: Self::compile_keyed(raw.headers.as_ref(), true)?,
            meta: Self::compile_keyed(raw.meta.as_ref(), true)?,
            cookies: Self::compile_keyed(raw.cookies.as_ref(), false)?,
            implies: Self::parse_implies(raw.implies.as_ref()),
        })
    }

    /// 编译列表型通道（html/url/script）
    /// 列表通道中的空规则没有匹配意义，直接丢弃
    fn compile_pattern_list(value: Option<&Value>) -> RwpResult<Vec<SignaturePattern>> {
        let mut patterns = Vec::new();
        for raw in Self::collect_strings(value) {
            if let Some(pattern) = SignaturePattern::parse(&raw)? {
                patterns.push(pattern);
            }
        }
        Ok(patterns)
    }

    /// 编译KV型通道（headers/meta/cookies）
    /// 空规则保留为key存在性规则（模式列表为空）；key排序保证遍历顺序稳定
    fn compile_keyed(
        map: Option<&HashMap<String, Value>>,
        lowercase_keys: bool,
    ) -> RwpResult<KeyedPatterns> {
        let Some(map) = map else {
            return Ok(Vec::new());
        };

        let mut keyed: KeyedPatterns = Vec::with_capacity(map.len());
        for (key, value) in map {
            let key = if lowercase_keys {
                key.to_lowercase()
            } else {
                key.clone()
            };
            let mut patterns = Vec::new();
            for raw in Self::collect_strings(Some(value)) {
                if let Some(pattern) = SignaturePattern::parse(&raw)? {
                    patterns.push(pattern);
                }
            }
            keyed.push((key, patterns));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed)
    }

    /// 展开 字符串 / 字符串数组 两种规则写法
    fn collect_strings(value: Option<&Value>) -> Vec<String> {
        match value {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(arr)) => arr
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 解析implies列表：兼容 字符串（逗号分隔）/ 数组 两种写法，
    /// 技术名上挂载的指令段（如置信度）一并剥离
    fn parse_implies(value: Option<&Value>) -> Vec<String> {
        let mut names = Vec::new();
        let mut push_name = |raw: &str| {
            let name = raw.split("\\;").next().unwrap_or(raw).trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        };

        match value {
            Some(Value::String(s)) => {
                for part in s.split(',') {
                    push_name(part);
                }
            }
            Some(Value::Array(arr)) => {
                for item in arr {
                    if let Value::String(s) = item {
                        push_name(s);
                    }
                }
            }
            _ => {}
        }
        names
    }
}
