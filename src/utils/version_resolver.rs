//! 版本解析工具模块
//! 根据版本模板（反向引用占位符 \1..\3）从已命中的捕获组序列中解析版本号
//! 纯函数：同样输入永远得到同样输出

/// 版本解析工具类
pub struct VersionResolver;

impl VersionResolver {
    /// 签名格式仅支持到 \3，更高编号的占位符永不替换
    pub const MAX_GROUP_REF: usize = 3;

    /// 从捕获组序列中解析版本号
    ///
    /// # 参数
    /// - `groups`: 按命中顺序排列的捕获组序列（每组首元素为整体匹配）
    /// - `template`: 版本模板，含 `\1`/`\2`/`\3` 占位符
    ///
    /// # 算法
    /// 按顺序扫描每组：对占位符编号 1..=3，若模板含该占位符且该组有对应捕获，
    /// 以模板为基底替换一次。第一个产出非空结果的组直接胜出，
    /// 后续组不再参与；全部为空则返回空串
    pub fn resolve(groups: &[Vec<String>], template: &str) -> String {
        for group in groups {
            let mut version = String::new();

            for i in 1..=Self::MAX_GROUP_REF {
                let placeholder = format!("\\{}", i);
                if template.contains(&placeholder) && group.len() > i {
                    version = template.replacen(&placeholder, &group[i], 1);
                }
            }

            if !version.is_empty() {
                return version;
            }
        }

        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(groups: &[&[&str]]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_resolve_single_backreference() {
        // 测试场景：\1 占位符替换为首个捕获组
        let groups = owned(&[&["nginx/1.18.0", "1.18.0"]]);
        assert_eq!(VersionResolver::resolve(&groups, r"\1"), "1.18.0");
    }

    #[test]
    fn test_resolve_first_nonempty_group_wins() {
        // 测试场景：首个产出非空结果的组胜出，后续组不再参与
        let groups = owned(&[
            &["WordPress", ""],
            &["WordPress 5.4", "5.4"],
            &["WordPress 6.0", "6.0"],
        ]);
        assert_eq!(VersionResolver::resolve(&groups, r"\1"), "5.4");
    }

    #[test]
    fn test_resolve_missing_group_yields_empty() {
        // 测试场景：模板引用的编号超出该组捕获数量时不替换
        let groups = owned(&[&["match-only"]]);
        assert_eq!(VersionResolver::resolve(&groups, r"\1"), "");
    }

    #[test]
    fn test_resolve_reference_beyond_max_ignored() {
        // 测试场景：\4 及以上编号永不替换，仅含高编号占位符的模板解析为空
        let groups = owned(&[&["full", "a", "b", "c", "d"]]);
        assert_eq!(VersionResolver::resolve(&groups, r"\4"), "");
    }

    #[test]
    fn test_resolve_is_pure() {
        // 测试场景：幂等，重复调用结果一致
        let groups = owned(&[&["Apache/2.4.57", "2.4.57"]]);
        let first = VersionResolver::resolve(&groups, r"\1");
        let second = VersionResolver::resolve(&groups, r"\1");
        assert_eq!(first, second);
        assert_eq!(first, "2.4.57");
    }

    #[test]
    fn test_resolve_no_groups_yields_empty() {
        assert_eq!(VersionResolver::resolve(&[], r"\1"), "");
    }
}
