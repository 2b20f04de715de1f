//! 共享上下文累积
//!
//! 一张共享图（例如多个小题共用的图表）在第 k 小题出现后，对同一大题的
//! 第 k 小题及之后所有小题都可见，但对之前的小题不可见。
//!
//! `ContextSet` 是按值传递的累加器：组装器按题号升序依次调用
//! [`ContextSet::accumulate`]，每次得到新的累加器，再交给下一行。

use std::collections::HashMap;
use tracing::debug;

use crate::models::file_ref::FileRef;
use crate::staging::naming::is_context_file;

/// 大题号 → 已发现的共享上下文图（发现顺序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSet {
    by_major: HashMap<String, Vec<FileRef>>,
}

impl ContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把本题专属图中的上下文图追加到对应大题，按文件名去重
    pub fn accumulate(mut self, specific_images: &[FileRef], major: &str) -> Self {
        for file in specific_images.iter().filter(|f| is_context_file(f.name())) {
            let list = self.by_major.entry(major.to_string()).or_default();
            if list.iter().any(|existing| existing.name() == file.name()) {
                continue;
            }
            debug!("大题 {} 新增共享图: {}", major, file.name());
            list.push(file.clone());
        }
        self
    }

    /// 某大题当前已累积的上下文图
    pub fn snapshot(&self, major: &str) -> &[FileRef] {
        self.by_major
            .get(major)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> FileRef {
        FileRef::new(name, Vec::new())
    }

    #[test]
    fn test_only_marked_files_accumulate() {
        let set = ContextSet::new().accumulate(&[file("1.1.png"), file("1.1-plus.png")], "1");
        let names: Vec<&str> = set.snapshot("1").iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["1.1-plus.png"]);
        assert!(set.snapshot("2").is_empty());
    }

    #[test]
    fn test_accumulation_is_idempotent_by_name() {
        let set = ContextSet::new()
            .accumulate(&[file("1.1-plus.png")], "1")
            .accumulate(&[file("1.1-plus.png"), file("1.2plus.png")], "1");
        let names: Vec<&str> = set.snapshot("1").iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["1.1-plus.png", "1.2plus.png"]);
    }

    #[test]
    fn test_majors_are_isolated() {
        let set = ContextSet::new()
            .accumulate(&[file("1.1-plus.png")], "1")
            .accumulate(&[file("2.1-plus.png")], "2");
        assert_eq!(set.snapshot("1").len(), 1);
        assert_eq!(set.snapshot("2")[0].name(), "2.1-plus.png");
    }
}
