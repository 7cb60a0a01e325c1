//! 编译后的签名库
//! 构建完成后只读，可被任意数量 worker 无锁并发读取

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::compiler::SignatureCompiler;
use super::loader::SignatureLoader;
use crate::error::RwpResult;
use crate::signature::pattern::SignaturePattern;

/// KV型通道规则（Header/Meta/Cookie专用），按key排序保证遍历顺序稳定
/// 模式列表为空表示key存在性规则
pub type KeyedPatterns = Vec<(String, Vec<SignaturePattern>)>;

/// 单项技术的编译后签名
#[derive(Debug)]
pub struct Signature {
    pub name: String,
    pub category_ids: Vec<u32>,
    pub website: Option<String>,

    // 六类信号通道
    pub html: Vec<SignaturePattern>,
    pub url: Vec<SignaturePattern>,
    pub script: Vec<SignaturePattern>,
    pub headers: KeyedPatterns,
    pub meta: KeyedPatterns,
    pub cookies: KeyedPatterns,

    // 关联技术（单层展开，不做传递闭包）
    pub implies: Vec<String>,
}

/// 编译后的签名库
/// 签名按名称排序存储：同一份签名库在任何进程中的遍历顺序一致，
/// 版本解析结果可复现
#[derive(Debug, Default)]
pub struct SignatureDb {
    signatures: Vec<Arc<Signature>>,
    index: HashMap<String, usize>,
    categories: HashMap<u32, String>,
}

impl SignatureDb {
    /// 由已编译签名构建（内部接口，编译器专用）
    pub(crate) fn from_parts(
        mut signatures: Vec<Signature>,
        categories: HashMap<u32, String>,
    ) -> Self {
        signatures.sort_by(|a, b| a.name.cmp(&b.name));
        let signatures: Vec<Arc<Signature>> = signatures.into_iter().map(Arc::new).collect();
        let index = signatures
            .iter()
            .enumerate()
            .map(|(i, sig)| (sig.name.clone(), i))
            .collect();
        Self {
            signatures,
            index,
            categories,
        }
    }

    /// 从JSON字符串加载并编译（全有或全无）
    pub fn load_from_str(data: &str) -> RwpResult<SignatureDb> {
        let file = SignatureLoader::parse(data)?;
        SignatureCompiler::compile(&file)
    }

    /// 从本地文件加载并编译
    pub async fn load_from_file(path: impl AsRef<Path>) -> RwpResult<SignatureDb> {
        let file = SignatureLoader::load_from_file(path.as_ref()).await?;
        SignatureCompiler::compile(&file)
    }

    /// 按名称稳定顺序遍历全部签名
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Signature>> {
        self.signatures.iter()
    }

    /// 按技术名查找签名
    pub fn get(&self, name: &str) -> Option<&Arc<Signature>> {
        self.index.get(name).map(|&i| &self.signatures[i])
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// 分类ID转分类名
    pub fn category_name(&self, id: u32) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }

    /// 解析一项签名的全部分类名
    pub fn category_names(&self, signature: &Signature) -> Vec<String> {
        signature
            .category_ids
            .iter()
            .filter_map(|id| self.categories.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "apps": {
            "Zebra": {"cats": [1], "html": ["zebra"]},
            "Alpha": {"cats": [1], "html": ["alpha"]},
            "Mango": {"cats": [2], "html": ["mango"]}
        },
        "categories": {"1": {"name": "CMS"}, "2": {"name": "Analytics"}}
    }"#;

    #[test]
    fn test_db_iteration_is_name_sorted() {
        // 测试场景：遍历顺序与插入顺序无关，始终按名称排序
        let db = SignatureDb::load_from_str(SAMPLE).unwrap();
        let names: Vec<&str> = db.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Mango", "Zebra"]);
    }

    #[test]
    fn test_db_lookup_and_categories() {
        let db = SignatureDb::load_from_str(SAMPLE).unwrap();
        assert_eq!(db.len(), 3);
        let mango = db.get("Mango").unwrap();
        assert_eq!(db.category_names(mango), vec!["Analytics".to_string()]);
        assert!(db.get("Unknown").is_none());
    }

    #[test]
    fn test_db_load_invalid_regex_fails_whole_load() {
        // 测试场景：单条非法正则使整库加载失败（全有或全无）
        let raw = r#"{"apps": {
            "Good": {"html": ["fine"]},
            "Bad": {"html": ["[broken"]}
        }}"#;
        assert!(SignatureDb::load_from_str(raw).is_err());
    }
}
