//! 扫描任务与任务结果

use crate::analyzer::{TargetSurface, TechMatch};
use crate::error::RswebprobeError;

/// 一次扫描请求
/// 在线任务只带目标URL，由worker抓取可观测面；
/// 离线任务预置可观测面，不触发网络（确定性测试/离线分析）
#[derive(Debug, Clone)]
pub struct Job {
    pub url: String,
    pub surface: Option<TargetSurface>,
}

impl Job {
    /// 构造在线任务；无scheme的目标默认补全https
    pub fn online(target: impl Into<String>) -> Self {
        Self {
            url: normalize_target(target.into()),
            surface: None,
        }
    }

    /// 构造离线任务
    pub fn offline(target: impl Into<String>, surface: TargetSurface) -> Self {
        Self {
            url: target.into(),
            surface: Some(surface),
        }
    }
}

fn normalize_target(target: String) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        target
    } else {
        format!("https://{}", target)
    }
}

/// 单个任务的扫描结果
/// 每个任务恰好产出一个结果；错误只隔离在本结果内，不影响其他任务
#[derive(Debug)]
pub struct JobResult {
    pub url: String,
    pub matches: Vec<TechMatch>,
    pub error: Option<RswebprobeError>,
}

impl JobResult {
    pub fn ok(url: String, matches: Vec<TechMatch>) -> Self {
        Self {
            url,
            matches,
            error: None,
        }
    }

    pub fn failed(url: String, error: RswebprobeError) -> Self {
        Self {
            url,
            matches: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}
