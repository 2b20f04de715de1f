//! 上传文件句柄
//!
//! 题目图片、评分标准图片在整个流水线中都以 `FileRef` 传递：
//! 只需要文件名和原始字节。创建后不可变，克隆只增加引用计数。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use phf::phf_map;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

/// 扩展名 → MIME 类型
static MIME_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "pdf" => "application/pdf",
};

const DEFAULT_MIME: &str = "image/png";

/// 一个上传文件（名称 + 字节）
#[derive(Clone, PartialEq, Eq)]
pub struct FileRef {
    name: String,
    bytes: Arc<[u8]>,
}

impl FileRef {
    /// 从名称和字节创建
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// 从磁盘读取文件，名称取文件名部分
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    /// 从 `data:` URL（或裸 base64）还原，用于读取已持久化的题目
    pub fn from_data_url(name: impl Into<String>, data: &str) -> AppResult<Self> {
        let payload = data.split_once(',').map(|(_, b64)| b64).unwrap_or(data);
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| AppError::Other(format!("base64 解码失败: {}", e)))?;
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 扩展名（小写），没有扩展名时返回 None
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// 根据扩展名推断 MIME 类型，未知扩展名按 PNG 处理
    pub fn mime_type(&self) -> &'static str {
        self.extension()
            .and_then(|ext| MIME_TYPES.get(ext.as_str()).copied())
            .unwrap_or(DEFAULT_MIME)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<payload>`，用于 Vision API 和持久化
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRef")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
