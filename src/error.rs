use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 暂存（批量配对）相关错误
    #[error("暂存错误: {0}")]
    Staging(#[from] StagingError),
    /// 持久化存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 暂存表相关错误
#[derive(Debug, Error)]
pub enum StagingError {
    /// 没有提供任何评分标准文件
    #[error("没有提供评分标准文件，无法生成暂存表")]
    NoSchemeFiles,
    /// 提供了评分标准文件，但没有一个文件名能解析出题号
    #[error("没有可识别的评分标准文件 (忽略 {} 个: {})", ignored.len(), ignored.join(", "))]
    NoRecognizedSchemes { ignored: Vec<String> },
    /// 行索引超出范围
    #[error("行索引 {index} 超出范围 (共 {len} 行)")]
    RowOutOfRange { index: usize, len: usize },
    /// 图片索引超出范围
    #[error("第 {row} 行的图片索引 {index} 超出范围 (共 {len} 张)")]
    ImageOutOfRange { row: usize, index: usize, len: usize },
}

/// 持久化存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 读取集合失败
    #[error("读取集合 {collection} 失败: {source}")]
    ReadFailed {
        collection: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入集合失败（配额、磁盘、权限等）
    #[error("写入集合 {collection} 失败: {source}")]
    WriteFailed {
        collection: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 集合内容无法（反）序列化
    #[error("集合 {collection} 格式错误: {source}")]
    Malformed {
        collection: String,
        source: serde_json::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 批次元数据文件解析失败
    #[error("批次文件 {path} 解析失败: {source}")]
    BatchParseFailed {
        path: String,
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }
}

impl StorageError {
    pub fn read_failed(
        collection: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::ReadFailed {
            collection: collection.into(),
            source: Box::new(source),
        }
    }

    pub fn write_failed(
        collection: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::WriteFailed {
            collection: collection.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
