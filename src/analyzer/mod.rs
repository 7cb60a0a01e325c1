//! 分析模块：目标可观测面与多信号匹配引擎

pub mod surface;
pub mod engine;

pub use self::surface::TargetSurface;
pub use self::engine::{MatchEngine, TechMatch};
