//! 匹配引擎核心
//! 以固定顺序（body→headers→url→script→meta→cookie）对单个目标执行六类信号检查，
//! 累积命中的捕获组并解析版本，最后做单层implies展开

use std::sync::Arc;

use tracing::debug;

use super::surface::TargetSurface;
use crate::error::RwpResult;
use crate::extractor::{HtmlInputGuard, PageDom};
use crate::signature::db::KeyedPatterns;
use crate::signature::{Signature, SignatureDb, SignaturePattern};
use crate::utils::VersionResolver;

/// 单项技术的匹配结果
/// `matches` 为命中的原始捕获组序列；implies连带上报的技术该字段为空，
/// 版本为空串表示未解析出版本
#[derive(Debug, Clone)]
pub struct TechMatch {
    pub name: String,
    pub signature: Arc<Signature>,
    pub matches: Vec<Vec<String>>,
    pub version: String,
}

impl TechMatch {
    fn implied(signature: &Arc<Signature>) -> Self {
        Self {
            name: signature.name.clone(),
            signature: signature.clone(),
            matches: Vec::new(),
            version: String::new(),
        }
    }
}

/// 单项签名的累积器：六类通道的命中依次汇入
#[derive(Debug, Default)]
struct MatchAccumulator {
    groups: Vec<Vec<String>>,
    version: String,
}

impl MatchAccumulator {
    fn absorb(&mut self, fired: ChannelFinding) {
        if fired.groups.is_empty() {
            return;
        }
        self.groups.extend(fired.groups);
        // 仅非空解析结果覆盖已有版本
        if !fired.version.is_empty() {
            self.version = fired.version;
        }
    }
}

/// 一次通道检查（或通道内一条子项）的命中
#[derive(Debug, Default)]
struct ChannelFinding {
    groups: Vec<Vec<String>>,
    version: String,
}

/// 匹配引擎
/// 持有只读签名库的共享引用，可被任意数量worker并发调用
#[derive(Debug, Clone)]
pub struct MatchEngine {
    db: Arc<SignatureDb>,
}

impl MatchEngine {
    pub fn new(db: Arc<SignatureDb>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<SignatureDb> {
        &self.db
    }

    /// 分析单个目标的可观测面，产出全部命中技术
    ///
    /// 仅当响应体无法解析为可导航文档时报错；
    /// 单个信号缺失（无此Header/Cookie、正则未命中）只是无命中，不是错误。
    /// 同一技术可能出现两次（自身命中 + 被其他技术implies连带），去重由调用方决定
    pub fn analyze(&self, url: &str, surface: &TargetSurface) -> RwpResult<Vec<TechMatch>> {
        let body_text = HtmlInputGuard::guard(&surface.body)?;
        let dom = PageDom::parse(&body_text);

        let mut found = Vec::new();

        for signature in self.db.iter() {
            let mut acc = MatchAccumulator::default();

            // 1. 响应体检查
            acc.absorb(run_patterns(&body_text, &signature.html));
            // 2. 响应头检查
            check_headers(surface, &signature.headers, &mut acc);
            // 3. URL检查
            acc.absorb(run_patterns(url, &signature.url));
            // 4. script-src检查
            for src in dom.script_srcs() {
                acc.absorb(run_patterns(src, &signature.script));
            }
            // 5. meta标签检查
            check_meta(&dom, &signature.meta, &mut acc);
            // 6. Cookie检查
            check_cookies(surface, &signature.cookies, &mut acc);

            if acc.groups.is_empty() {
                continue;
            }

            debug!(
                "技术命中：{}，命中组数={}，版本={:?}",
                signature.name,
                acc.groups.len(),
                acc.version
            );

            found.push(TechMatch {
                name: signature.name.clone(),
                signature: signature.clone(),
                matches: acc.groups,
                version: acc.version,
            });

            // implies单层展开：无条件连带上报，不检查被连带技术自身是否独立命中
            for implied_name in &signature.implies {
                match self.db.get(implied_name) {
                    Some(implied_sig) => found.push(TechMatch::implied(implied_sig)),
                    None => debug!("implies指向未知技术，跳过：{}", implied_name),
                }
            }
        }

        Ok(found)
    }
}

/// 对一段内容依次运行一组模式，累积全部命中的捕获组
/// 通道内每条携带版本模板且命中的模式，都基于截至当前累积的全部组重算一次版本
/// （后算结果覆盖前算结果，含空结果——通道间的覆盖语义由累积器另行约束）
fn run_patterns(content: &str, patterns: &[SignaturePattern]) -> ChannelFinding {
    let mut finding = ChannelFinding::default();

    for pattern in patterns {
        let mut fired = false;
        for caps in pattern.regex.captures_iter(content) {
            fired = true;
            finding.groups.push(
                caps.iter()
                    .map(|g| g.map_or(String::new(), |m| m.as_str().to_string()))
                    .collect(),
            );
        }

        if fired {
            if let Some(template) = &pattern.version_template {
                finding.version = VersionResolver::resolve(&finding.groups, template);
            }
        }
    }

    finding
}

/// 响应头检查：逐条规则对命中的响应头值运行模式
/// 空规则 = Header存在性规则，命中时记录单元素组（键名）
fn check_headers(surface: &TargetSurface, rules: &KeyedPatterns, acc: &mut MatchAccumulator) {
    for (header_name, patterns) in rules {
        let Some(values) = surface.header_values(header_name) else {
            continue;
        };

        if patterns.is_empty() {
            acc.absorb(ChannelFinding {
                groups: vec![vec![header_name.clone()]],
                version: String::new(),
            });
            continue;
        }

        for value in values {
            acc.absorb(run_patterns(value, patterns));
        }
    }
}

/// meta标签检查：按name查询DOM中meta的content并运行对应模式
fn check_meta(dom: &PageDom, rules: &KeyedPatterns, acc: &mut MatchAccumulator) {
    for (meta_name, patterns) in rules {
        for content in dom.meta_contents(meta_name) {
            if patterns.is_empty() {
                acc.absorb(ChannelFinding {
                    groups: vec![vec![meta_name.clone()]],
                    version: String::new(),
                });
                continue;
            }
            acc.absorb(run_patterns(content, patterns));
        }
    }
}

/// Cookie检查：带模式的规则对Cookie值运行；空规则仅要求Cookie存在，
/// 命中时记录单元素组（Cookie名），不要求任何正则命中
fn check_cookies(surface: &TargetSurface, rules: &KeyedPatterns, acc: &mut MatchAccumulator) {
    for (cookie_name, patterns) in rules {
        let Some(value) = surface.cookies.get(cookie_name) else {
            continue;
        };

        if patterns.is_empty() {
            acc.absorb(ChannelFinding {
                groups: vec![vec![cookie_name.clone()]],
                version: String::new(),
            });
            continue;
        }

        acc.absorb(run_patterns(value, patterns));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(raw: &str) -> MatchEngine {
        MatchEngine::new(Arc::new(SignatureDb::load_from_str(raw).unwrap()))
    }

    fn names(matches: &[TechMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_analyze_meta_generator_with_version() {
        // 测试场景：meta generator命中并解析版本
        let engine = engine(
            r#"{"apps": {"WordPress": {
                "meta": {"generator": "WordPress ([\\d.]+)\\;version:\\1"}
            }}}"#,
        );
        let surface = TargetSurface::new(
            "https://example.com",
            r#"<html><head><meta name="generator" content="WordPress 5.4"></head></html>"#,
        );

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "WordPress");
        assert_eq!(matches[0].version, "5.4");
        assert!(!matches[0].matches.is_empty());
    }

    #[test]
    fn test_analyze_header_with_version() {
        // 测试场景：Server响应头命中并解析版本
        let engine = engine(
            r#"{"apps": {"nginx": {
                "headers": {"Server": "nginx/([\\d.]+)\\;version:\\1"}
            }}}"#,
        );
        let surface = TargetSurface::new("https://example.com", "<html></html>")
            .with_header("Server", "nginx/1.18.0");

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "nginx");
        assert_eq!(matches[0].version, "1.18.0");
    }

    #[test]
    fn test_analyze_implies_reported_with_empty_groups() {
        // 测试场景：A命中时B被连带上报，B无自身命中、组序列与版本为空
        let engine = engine(
            r#"{"apps": {
                "WordPress": {"html": ["wp-content"], "implies": "PHP"},
                "PHP": {"headers": {"X-Powered-By": "PHP"}}
            }}"#,
        );
        let surface = TargetSurface::new(
            "https://example.com",
            r#"<html><link href="/wp-content/style.css"></html>"#,
        );

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(names(&matches), vec!["WordPress", "PHP"]);
        assert!(!matches[0].matches.is_empty());
        assert!(matches[1].matches.is_empty());
        assert_eq!(matches[1].version, "");
    }

    #[test]
    fn test_analyze_implied_tech_can_appear_twice() {
        // 测试场景：被连带技术自身也独立命中时出现两次，引擎不去重
        let engine = engine(
            r#"{"apps": {
                "WordPress": {"html": ["wp-content"], "implies": "PHP"},
                "PHP": {"headers": {"X-Powered-By": "PHP"}}
            }}"#,
        );
        let surface = TargetSurface::new(
            "https://example.com",
            r#"<html><link href="/wp-content/style.css"></html>"#,
        )
        .with_header("X-Powered-By", "PHP/8.1");

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        // 排序遍历：PHP自身命中在前，WordPress及其连带在后
        assert_eq!(names(&matches), vec!["PHP", "WordPress", "PHP"]);
        assert!(!matches[0].matches.is_empty());
        assert!(matches[2].matches.is_empty());
    }

    #[test]
    fn test_analyze_unknown_implied_skipped() {
        // 测试场景：implies指向签名库中不存在的技术时静默跳过
        let engine = engine(
            r#"{"apps": {"A": {"html": ["marker-a"], "implies": "NotInDb"}}}"#,
        );
        let surface = TargetSurface::new("https://example.com", "<html>marker-a</html>");

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(names(&matches), vec!["A"]);
    }

    #[test]
    fn test_analyze_cookie_presence_rule() {
        // 测试场景：空Cookie规则仅要求存在，记录单元素组（Cookie名）
        let engine = engine(
            r#"{"apps": {"Laravel": {"cookies": {"laravel_session": ""}}}}"#,
        );
        let surface = TargetSurface::new("https://example.com", "<html></html>")
            .with_cookie("laravel_session", "eyJpdiI6");

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matches, vec![vec!["laravel_session".to_string()]]);
    }

    #[test]
    fn test_analyze_cookie_pattern_rule() {
        // 测试场景：带模式的Cookie规则对Cookie值运行并解析版本
        let engine = engine(
            r#"{"apps": {"Shop": {"cookies": {"shop_ver": "v([\\d.]+)\\;version:\\1"}}}}"#,
        );
        let surface = TargetSurface::new("https://example.com", "<html></html>")
            .with_cookie("shop_ver", "v2.3.1");

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(matches[0].version, "2.3.1");
    }

    #[test]
    fn test_analyze_script_and_url_channels() {
        // 测试场景：script-src与URL通道各自独立命中
        let engine = engine(
            r#"{"apps": {
                "jQuery": {"script": "jquery[.-]([\\d.]+)\\.min\\.js\\;version:\\1"},
                "Ghost": {"url": "ghost\\.io"}
            }}"#,
        );
        let surface = TargetSurface::new(
            "https://demo.ghost.io/post",
            r#"<html><script src="/js/jquery-3.6.0.min.js"></script></html>"#,
        );

        let matches = engine.analyze("https://demo.ghost.io/post", &surface).unwrap();
        assert_eq!(names(&matches), vec!["Ghost", "jQuery"]);
        let jquery = matches.iter().find(|m| m.name == "jQuery").unwrap();
        assert_eq!(jquery.version, "3.6.0");
    }

    #[test]
    fn test_analyze_no_signal_no_match() {
        // 测试场景：零信号命中的技术绝不出现在结果中
        let engine = engine(
            r#"{"apps": {"Drupal": {"html": ["drupal-settings-json"]}}}"#,
        );
        let surface = TargetSurface::new("https://example.com", "<html>plain page</html>")
            .with_header("Server", "nginx");

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_analyze_later_channel_version_overwrites() {
        // 测试场景：后执行通道的非空版本解析覆盖先前通道的结果
        let engine = engine(
            r#"{"apps": {"App": {
                "html": ["app-build-([\\d.]+)\\;version:\\1"],
                "meta": {"app-version": "([\\d.]+)\\;version:\\1"}
            }}}"#,
        );
        let surface = TargetSurface::new(
            "https://example.com",
            r#"<html>app-build-1.0<meta name="app-version" content="2.5"></html>"#,
        );

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(matches[0].version, "2.5");
    }

    #[test]
    fn test_analyze_empty_resolution_keeps_previous_version() {
        // 测试场景：后执行通道命中但版本解析为空时，不清除已解析的版本
        let engine = engine(
            r#"{"apps": {"App": {
                "html": ["app-build-([\\d.]+)\\;version:\\1"],
                "meta": {"app-flag": "enabled"}
            }}}"#,
        );
        let surface = TargetSurface::new(
            "https://example.com",
            r#"<html>app-build-1.0<meta name="app-flag" content="enabled"></html>"#,
        );

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(matches[0].version, "1.0");
    }

    #[test]
    fn test_analyze_binary_body_is_parse_error() {
        // 测试场景：响应体为二进制时整个分析报错
        let engine = engine(r#"{"apps": {"A": {"html": ["x"]}}}"#);
        let surface = TargetSurface::new("https://example.com", vec![0u8, 159, 146, 150]);

        assert!(engine.analyze("https://example.com", &surface).is_err());
    }

    #[test]
    fn test_analyze_header_presence_rule() {
        // 测试场景：空Header规则命中Header存在性
        let engine = engine(r#"{"apps": {"CDN": {"headers": {"X-Cache": ""}}}}"#);
        let surface = TargetSurface::new("https://example.com", "<html></html>")
            .with_header("X-Cache", "HIT");

        let matches = engine.analyze("https://example.com", &surface).unwrap();
        assert_eq!(matches[0].matches, vec![vec!["x-cache".to_string()]]);
    }
}
