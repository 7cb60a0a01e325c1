//! 签名模块：签名库的数据模型、解析、编译、加载与缓存

pub mod model;
pub mod pattern;
pub mod compiler;
pub mod db;
pub mod loader;
pub mod cache;

// 导出核心接口
pub use self::model::{CategoryDef, RawSignature, SignatureFile};
pub use self::pattern::SignaturePattern;
pub use self::compiler::SignatureCompiler;
pub use self::db::{KeyedPatterns, Signature, SignatureDb};
pub use self::loader::SignatureLoader;
pub use self::cache::SignatureCacheManager;
