use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::file_ref::FileRef;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// 扫描图片题（批量导入产生的都是这种）
    Image,
    /// 纯文本题
    Text,
}

/// 持久化的图片：文件名 + data URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub name: String,
    pub data: String,
}

impl StoredImage {
    pub fn to_file_ref(&self) -> AppResult<FileRef> {
        FileRef::from_data_url(self.name.clone(), &self.data)
    }
}

impl From<&FileRef> for StoredImage {
    fn from(file: &FileRef) -> Self {
        Self {
            name: file.name().to_string(),
            data: file.to_data_url(),
        }
    }
}

/// 题库中的一道题
///
/// 字段名即导出/导入 JSON 的格式，必须能原样往返。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub board: String,
    pub subject: String,
    pub year: u16,
    pub paper: String,
    pub topic: String,
    pub marks: u32,
    pub lines: u32,
    #[serde(rename = "questionImg", default)]
    pub images: Vec<StoredImage>,
    #[serde(rename = "schemeImg", default)]
    pub scheme: Option<StoredImage>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub scheme_text: String,
    pub created_at: DateTime<Utc>,
}

impl QuestionRecord {
    /// 还原题目图片，用于重新分类或判分
    pub fn image_files(&self) -> AppResult<Vec<FileRef>> {
        self.images.iter().map(StoredImage::to_file_ref).collect()
    }

    pub fn scheme_file(&self) -> AppResult<Option<FileRef>> {
        self.scheme.as_ref().map(StoredImage::to_file_ref).transpose()
    }
}

/// 一次批量提交共用的试卷信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub board: String,
    pub subject: String,
    #[serde(deserialize_with = "deserialize_year")]
    pub year: u16,
    pub paper: String,
}

// year 在 TOML / JSON 里既可能写成整数也可能写成字符串
fn deserialize_year<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = u16;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a year")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u16::try_from(value).map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u16::try_from(value)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
        }
    }

    deserializer.deserialize_any(YearVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_year_accepts_string_or_integer() {
        let a: BatchMetadata =
            toml::from_str("board = \"AQA\"\nsubject = \"PHYSICS\"\nyear = 2019\npaper = \"P1\"")
                .unwrap();
        let b: BatchMetadata =
            toml::from_str("board = \"AQA\"\nsubject = \"PHYSICS\"\nyear = \"2019\"\npaper = \"P1\"")
                .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.year, 2019);
    }

    #[test]
    fn test_record_json_field_names() {
        let record = QuestionRecord {
            id: "c-1".to_string(),
            kind: QuestionType::Image,
            board: "AQA".to_string(),
            subject: "PHYSICS".to_string(),
            year: 2020,
            paper: "P2".to_string(),
            topic: "Energy".to_string(),
            marks: 3,
            lines: 6,
            images: vec![StoredImage::from(&FileRef::new("1.png", vec![7u8]))],
            scheme: None,
            question_text: String::new(),
            scheme_text: String::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["questionImg"][0]["name"], "1.png");
        assert!(json["schemeImg"].is_null());
        assert!(json.get("createdAt").is_some());
    }
}
