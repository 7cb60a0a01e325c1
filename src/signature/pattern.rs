//! 签名规则模式解析与编译
//! 规则字符串形如 `<正则>[\;key:value]*`，已识别指令：version（版本模板）、confidence（置信度）
//! 签名源正则为PCRE方言，编译前先做清洗；清洗后仍无法编译的规则使整库加载失败

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RwpResult;

/// 编译后的单条签名模式
#[derive(Debug, Clone)]
pub struct SignaturePattern {
    pub regex: Regex,
    pub version_template: Option<String>,
    pub confidence: u8,
}

impl SignaturePattern {
    /// 解析并编译一条规则字符串
    ///
    /// 返回 `Ok(None)` 表示规则无正则部分（纯key存在性规则，Header/Cookie专用）；
    /// 返回 `Err` 表示正则清洗后仍编译失败（整库加载失败，全有或全无）
    pub fn parse(raw: &str) -> RwpResult<Option<SignaturePattern>> {
        let parts = split_directives(raw);
        let pattern_part = parts.first().copied().unwrap_or("");

        let mut version_template = None;
        let mut confidence: u8 = 100;
        for directive in parts.iter().skip(1) {
            if let Some(v) = directive.strip_prefix("version:") {
                version_template = Some(v.to_string());
            } else if let Some(c) = directive.strip_prefix("confidence:") {
                confidence = c.trim().parse::<u8>().unwrap_or(100).min(100);
            }
            // 其余指令（informational）直接忽略
        }

        if pattern_part.is_empty() {
            return Ok(None);
        }

        let cleaned = clean_pattern(pattern_part);
        // 签名惯例为忽略大小写匹配
        let regex = Regex::new(&format!("(?i){}", cleaned))?;

        Ok(Some(SignaturePattern {
            regex,
            version_template,
            confidence,
        }))
    }
}

/// 拆分规则字符串中的指令段
/// 标准写法用 `\;` 分隔；兼容裸 `;version:` / `;confidence:` 写法，
/// 不含指令时整串视为正则（正则内的裸 `;` 不会被误切）
fn split_directives(raw: &str) -> Vec<&str> {
    if raw.contains("\\;") {
        raw.split("\\;").collect()
    } else if raw.contains(";version:") || raw.contains(";confidence:") {
        raw.split(';').collect()
    } else {
        vec![raw]
    }
}

/// 清洗PCRE方言正则，使其可被 regex crate 编译
fn clean_pattern(raw: &str) -> String {
    static LOOK_AROUND_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"\(\?<?[=!][^)]*\)"#).unwrap()
    });

    let mut cleaned = raw.to_string();

    // 移除PCRE分隔符
    if cleaned.len() >= 2 && cleaned.starts_with('/') && cleaned.ends_with('/') {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    // 移除环视分组（regex crate 不支持）
    cleaned = LOOK_AROUND_REGEX.replace_all(&cleaned, "").to_string();

    // 清理无效转义（含反向引用 \1 等，regex crate 不支持）
    cleaned = clean_invalid_escapes(&cleaned);

    // 转义字符集中间位置的裸连字符
    cleaned = fix_charset_hyphen(&cleaned);

    // 修复未闭合分组
    fix_unbalanced_groups(&cleaned)
}

/// 字符集内与类转义（`\d`/`\w` 等）相邻的裸 `-` 构成非法区间，转义为字面量
/// 普通区间（如 `[a-z]`、`[0-9]`）保持原样
fn fix_charset_hyphen(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut in_charset = false;
    let mut prev_was_class_escape = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let next_c = chars.next();
                prev_was_class_escape =
                    in_charset && matches!(next_c, Some('d' | 'D' | 'w' | 'W' | 's' | 'S'));
                result.push('\\');
                if let Some(next_c) = next_c {
                    result.push(next_c);
                }
            }
            '[' if !in_charset => {
                in_charset = true;
                prev_was_class_escape = false;
                result.push(c);
            }
            ']' => {
                in_charset = false;
                result.push(c);
            }
            '-' if in_charset => {
                let next_is_class_escape = {
                    let mut ahead = chars.clone();
                    ahead.next() == Some('\\')
                        && matches!(ahead.next(), Some('d' | 'D' | 'w' | 'W' | 's' | 'S'))
                };
                if prev_was_class_escape || next_is_class_escape {
                    result.push_str("\\-");
                } else {
                    result.push('-');
                }
                prev_was_class_escape = false;
            }
            _ => {
                prev_was_class_escape = false;
                result.push(c);
            }
        }
    }

    result
}

/// 清理无效转义符：保留 regex crate 认可的转义，其余退化为字面字符
fn clean_invalid_escapes(s: &str) -> String {
    const KEEP: &[char] = &[
        'd', 'D', 'w', 'W', 's', 'S', 'b', 'B', 'n', 'r', 't', 'x', 'u',
        '.', '+', '*', '?', '(', ')', '[', ']', '{', '}', '^', '$', '|', '/', '\\', '-',
    ];

    let mut cleaned = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            cleaned.push(c);
            continue;
        }
        match chars.peek() {
            Some(next_c) if KEEP.contains(next_c) => {
                cleaned.push('\\');
                cleaned.push(*next_c);
                chars.next();
            }
            Some(_) => {
                // 无效转义：丢弃反斜杠，保留字符本身
                if let Some(next_c) = chars.next() {
                    cleaned.push(next_c);
                }
            }
            None => {}
        }
    }

    cleaned
}

/// 修复未闭合分组：丢弃多余的 `)`，回删多余的 `(`
fn fix_unbalanced_groups(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut depth = 0usize;
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            escaped = false;
            result.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                result.push(c);
            }
            '(' => {
                depth += 1;
                result.push(c);
            }
            ')' => {
                if depth > 0 {
                    depth -= 1;
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    // 从尾部回删未闭合的 `(`
    let mut result_chars: Vec<char> = result.chars().collect();
    let mut i = result_chars.len();
    while i > 0 && depth > 0 {
        i -= 1;
        if result_chars[i] == '(' && (i == 0 || result_chars[i - 1] != '\\') {
            result_chars.remove(i);
            depth -= 1;
        }
    }

    result_chars.into_iter().collect()
}
