//! LLM 服务 - 业务能力层
//!
//! 只负责"看图判断"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini、Azure 等）
//! - 图片以 `data:` URL 形式随用户消息发送

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, LlmError};
use crate::models::file_ref::FileRef;
use crate::models::staging::DEFAULT_TOPIC;
use crate::services::analyzer::{BoardContext, Enrichment, QuestionAnalyzer, FALLBACK_TOPIC};

/// 判分多次重试仍失败时返回的文字
pub const MARKING_FAILED: &str = "Marking failed.";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 识别题目主题、分值、线数
/// - 判分（带指数退避重试）
/// - 只处理单道题
/// - 不出现 StagingGrid / 题库
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_retries: usize,
    retry_base_delay: Duration,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_retries: config.llm_max_retries.max(1),
            retry_base_delay: Duration::from_millis(config.llm_retry_base_ms),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `images`: 附带的图片 / PDF
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        images: &[FileRef],
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!(
            "用户消息长度: {} 字符, 附件 {} 个",
            user_message.len(),
            images.len()
        );

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if images.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()?
        } else {
            // Vision API：文本在前，图片按顺序追加
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                vec![ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: user_message.to_string(),
                    },
                )];

            for file in images {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: file.to_data_url(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()?
        };
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.2)
            .max_tokens(2048u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 判分
    ///
    /// 失败时按 1s、2s、4s… 退避重试，全部失败返回 [`MARKING_FAILED`]，不报错。
    pub async fn evaluate_answer(
        &self,
        question_images: &[FileRef],
        scheme: Option<&FileRef>,
        global_guidance: Option<&FileRef>,
        user_answer: &str,
        marks: u32,
    ) -> String {
        let prompt = build_marking_prompt(user_answer, marks, scheme.is_some(), global_guidance.is_some());

        let mut attachments: Vec<FileRef> = question_images.to_vec();
        attachments.extend(scheme.cloned());
        attachments.extend(global_guidance.cloned());

        for attempt in 0..self.max_retries {
            match self.send_to_llm(&prompt, None, &attachments).await {
                Ok(feedback) if !feedback.is_empty() => return feedback,
                Ok(_) => warn!("判分返回为空 (尝试 {}/{})", attempt + 1, self.max_retries),
                Err(e) => warn!("判分失败 (尝试 {}/{}): {}", attempt + 1, self.max_retries, e),
            }
            if attempt + 1 < self.max_retries {
                sleep(retry_delay(self.retry_base_delay, attempt)).await;
            }
        }

        MARKING_FAILED.to_string()
    }
}

/// 第 `attempt` 次失败后的等待时间：base × 2^attempt，封顶不溢出
fn retry_delay(base: Duration, attempt: usize) -> Duration {
    let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
    base.checked_mul(factor).unwrap_or(Duration::MAX)
}

#[async_trait]
impl QuestionAnalyzer for LlmService {
    async fn analyze(
        &self,
        images: &[FileRef],
        scheme: Option<&FileRef>,
        context: &BoardContext,
    ) -> Enrichment {
        let (user_message, system_message) = build_analysis_messages(context);

        let mut attachments: Vec<FileRef> = images.to_vec();
        attachments.extend(scheme.cloned());

        match self
            .send_to_llm(&user_message, Some(&system_message), &attachments)
            .await
        {
            Ok(response) => parse_analysis_response(&response).unwrap_or_else(|| {
                warn!("无法解析分析结果，使用默认值: {}", response);
                Enrichment::fallback()
            }),
            Err(e) => {
                warn!("题目分析失败，使用默认值: {}", e);
                Enrichment::fallback()
            }
        }
    }

    async fn detect_topic(&self, images: &[FileRef], context: &BoardContext) -> String {
        let prompt = build_topic_prompt(context);
        match self.send_to_llm(&prompt, None, images).await {
            Ok(response) => clean_topic(&response),
            Err(e) => {
                warn!("主题识别失败: {}", e);
                FALLBACK_TOPIC.to_string()
            }
        }
    }
}

// ========== 提示词 ==========

/// 主题约束说明：有主题表时必须从表中选，否则按考纲自由分类
fn topic_instruction(context: &BoardContext) -> String {
    if context.valid_topics.is_empty() {
        format!(
            "Classify it into ONE single academic topic string strictly based on the official {} {} syllabus.",
            context.board, context.subject
        )
    } else {
        let list: Vec<String> = context
            .valid_topics
            .iter()
            .map(|t| format!("- \"{}\"", t))
            .collect();
        format!(
            "CRITICAL INSTRUCTION: You are strictly bound to a specific curriculum list.\n\
             You MUST classify the question into exactly ONE of the topics from the list below.\n\
             If the question covers multiple, choose the most dominant one.\n\n\
             VALID TOPICS LIST:\n{}\n\n\
             Do not output any topic that is not in this list.",
            list.join("\n")
        )
    }
}

fn build_topic_prompt(context: &BoardContext) -> String {
    format!(
        "Analyze this exam question image.\n{}\n\nReturn ONLY the topic name. No explanations.",
        topic_instruction(context)
    )
}

/// 返回 (user_message, system_message)
fn build_analysis_messages(context: &BoardContext) -> (String, String) {
    let system_message = format!(
        "You are an experienced {} {} examiner preparing past-paper questions ({}) for a practice library.",
        context.board, context.subject, context.paper
    );

    let user_message = format!(
        r#"The first images are one exam question (shared diagrams first, then the question part).
The last image, if present, is its mark scheme.

{}

Also find:
- the maximum marks for the question (e.g. "[3 marks]"),
- the number of horizontal ruled answer lines (0 if none),
- a plain-text transcription of the question,
- a plain-text transcription of the mark scheme (empty if no mark scheme image).

Return ONLY a JSON object:
{{"topic": "...", "marks": 0, "lines": 0, "questionText": "...", "schemeText": "..."}}"#,
        topic_instruction(context)
    );

    (user_message, system_message)
}

fn build_marking_prompt(user_answer: &str, marks: u32, has_scheme: bool, has_guidance: bool) -> String {
    let mut prompt = format!(
        "You are an examiner. Mark the student answer.\nMax Marks: {}\nStudent Answer: \"{}\"",
        marks, user_answer
    );
    if has_guidance {
        prompt.push_str("\nUse Global Guidance PDF.");
    }
    if has_scheme {
        prompt.push_str("\nUse Mark Scheme Image.");
    }
    prompt.push_str(&format!(
        "\nProvide score (e.g. 2/{}) and brief feedback.",
        marks
    ));
    prompt
}

// ========== 响应解析 ==========

/// 去掉引号；空结果按默认主题处理
fn clean_topic(response: &str) -> String {
    let topic = response.replace(['"', '\''], "");
    let topic = topic.trim();
    if topic.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        topic.to_string()
    }
}

/// 解析分析结果 JSON（可能包在 ```json 代码块里）
///
/// 缺失或无法识别的字段使用 [`Enrichment::fallback`] 中的值。
fn parse_analysis_response(response: &str) -> Option<Enrichment> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    let value: JsonValue = serde_json::from_str(&response[start..=end]).ok()?;
    let object = value.as_object()?;

    let fallback = Enrichment::fallback();
    let text = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .find_map(|k| object.get(*k).and_then(|v| v.as_str()))
            .map(|s| s.trim().to_string())
    };
    let count = |key: &str| -> Option<u32> {
        match object.get(key)? {
            JsonValue::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };

    Some(Enrichment {
        topic: text(&["topic"])
            .map(|t| clean_topic(&t))
            .unwrap_or(fallback.topic),
        marks: count("marks").unwrap_or(fallback.marks),
        lines: count("lines").unwrap_or(fallback.lines),
        question_text: text(&["questionText", "question_text"]).unwrap_or_default(),
        scheme_text: text(&["schemeText", "scheme_text"]).unwrap_or_default(),
    })
}
