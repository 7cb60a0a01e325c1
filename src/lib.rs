//! rswebprobe - 高性能Web技术栈指纹识别与并发批量扫描库

// 导出全局错误类型
pub use self::error::{RswebprobeError, RwpResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, GlobalConfig};

// 导出签名模块核心接口
pub use self::signature::{
    Signature, SignatureCacheManager, SignatureCompiler, SignatureDb, SignatureFile,
    SignatureLoader, SignaturePattern,
};

// 导出提取模块核心接口
pub use self::extractor::{HtmlInputGuard, PageDom};

// 导出工具模块核心接口
pub use self::utils::{HeaderConverter, VersionResolver};

// 导出分析模块核心接口
pub use self::analyzer::{MatchEngine, TargetSurface, TechMatch};

// 导出调度模块核心接口
pub use self::scheduler::{HttpFetcher, Job, JobResult, ScanScheduler, SurfaceFetcher};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod signature;
pub mod extractor;
pub mod utils;
pub mod analyzer;
pub mod scheduler;
