use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::file_ref::FileRef;
use crate::models::identifier::Identifier;
use crate::staging::naming::extract_scheme_id;

/// 题号 → 评分标准文件
///
/// 同一题号出现多个文件时，按输入顺序后者覆盖前者（不报错，只记日志）。
/// 无法解析题号的文件记入 `ignored`，调用方需要提示用户改名重传。
#[derive(Debug, Clone, Default)]
pub struct SchemeIndex {
    schemes: HashMap<Identifier, FileRef>,
    ignored: Vec<String>,
    overwritten: Vec<String>,
}

impl SchemeIndex {
    /// 扫描全部评分标准文件
    pub fn build(scheme_files: &[FileRef]) -> Self {
        let mut index = Self::default();

        for file in scheme_files {
            match extract_scheme_id(file.name()) {
                Some(id) => {
                    debug!("评分标准 {} → 题号 {}", file.name(), id);
                    if let Some(previous) = index.schemes.insert(id.clone(), file.clone()) {
                        warn!(
                            "⚠️ 题号 {} 有多个评分标准，{} 覆盖 {}",
                            id,
                            file.name(),
                            previous.name()
                        );
                        index.overwritten.push(previous.name().to_string());
                    }
                }
                None => {
                    warn!("⚠️ 无法从文件名解析题号，已忽略: {}", file.name());
                    index.ignored.push(file.name().to_string());
                }
            }
        }

        index
    }

    pub fn get(&self, id: &Identifier) -> Option<&FileRef> {
        self.schemes.get(id)
    }

    /// 题号按数字逐段升序排列，这个顺序决定暂存行顺序和上下文累积顺序
    pub fn sorted_identifiers(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self.schemes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// 无法解析题号而被忽略的文件名
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    /// 因重复题号被覆盖掉的文件名
    pub fn overwritten(&self) -> &[String] {
        &self.overwritten
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}
