//! DeepSeek chat-completion backend
//!
//! One HTTPS request per analysis, bearer-token authenticated. Timed-out
//! requests are retried up to the configured limit; every failure is
//! classified into an `AnalysisErrorKind` with a user-facing remediation
//! message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{build_comparison_prompt, AnalysisBackend, PeriodSummary};
use crate::config::Config;
use crate::error::{AnalysisErrorKind, Error, Result};

const BASE_URL: &str = "https://api.deepseek.com/v1";
const MODEL: &str = "deepseek-chat";

/// Temperature for the analysis report: creative enough to vary, still
/// grounded in the numbers
const REPORT_TEMPERATURE: f32 = 0.7;
const REPORT_MAX_TOKENS: u32 = 4000;
const TEST_MAX_TOKENS: u32 = 50;

/// DeepSeek backend
#[derive(Debug)]
pub struct DeepSeekBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    test_timeout: Duration,
    max_retries: u32,
}

impl DeepSeekBackend {
    /// Create a backend with an explicit key and tuning knobs
    pub fn new(api_key: &str, timeout_secs: u64, test_timeout_secs: u64, max_retries: u32) -> Self {
        Self {
            http_client: Client::new(),
            base_url: BASE_URL.to_string(),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(timeout_secs),
            test_timeout: Duration::from_secs(test_timeout_secs),
            max_retries,
        }
    }

    /// Create a backend from the loaded config
    ///
    /// Fails with the authentication message while the key is still the
    /// `sk-` placeholder, so no request is ever sent without credentials.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| analysis_error(AnalysisErrorKind::Auth, "API key not configured"))?;
        Ok(Self::new(
            api_key,
            config.settings.timeout_secs,
            config.settings.connect_test_timeout_secs,
            config.settings.max_retries,
        ))
    }

    /// Override the endpoint (tests point this at a local server)
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// One chat-completion round trip
    async fn chat_completion(
        &self,
        prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: REPORT_TEMPERATURE,
            max_tokens,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let kind = classify_status(status, &body);
            return Err(analysis_error(
                kind,
                &format!("HTTP {}: {}", status, body),
            ));
        }

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(classify_transport_error)?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(analysis_error(
                AnalysisErrorKind::Other,
                "AI模型返回了空的响应",
            ));
        }
        Ok(content)
    }

    /// Chat completion with the bounded timeout-retry loop
    async fn chat_completion_with_retry(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            match self
                .chat_completion(prompt, REPORT_MAX_TOKENS, self.timeout)
                .await
            {
                Ok(report) => return Ok(report),
                Err(Error::Analysis {
                    kind: AnalysisErrorKind::Timeout,
                    ..
                }) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, max = self.max_retries, "Analysis call timed out, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl AnalysisBackend for DeepSeekBackend {
    async fn comparative_report(
        &self,
        period1: &PeriodSummary,
        period2: &PeriodSummary,
    ) -> Result<String> {
        let prompt = build_comparison_prompt(period1, period2);
        debug!(prompt_chars = prompt.len(), "Requesting comparative report");
        self.chat_completion_with_retry(&prompt).await
    }

    async fn test_connection(&self) -> Result<String> {
        self.chat_completion("请回复：连接测试成功", TEST_MAX_TOKENS, self.test_timeout)
            .await
    }

    fn model(&self) -> &str {
        MODEL
    }
}

/// Classify an HTTP error status into a failure bucket
fn classify_status(status: StatusCode, body: &str) -> AnalysisErrorKind {
    let body_lower = body.to_lowercase();
    match status {
        StatusCode::UNAUTHORIZED => AnalysisErrorKind::Auth,
        StatusCode::FORBIDDEN => AnalysisErrorKind::Forbidden,
        StatusCode::TOO_MANY_REQUESTS => AnalysisErrorKind::Quota,
        _ if body_lower.contains("quota") || body_lower.contains("limit") => {
            AnalysisErrorKind::Quota
        }
        _ if body_lower.contains("api_key") || body_lower.contains("api key") => {
            AnalysisErrorKind::Auth
        }
        _ => AnalysisErrorKind::Other,
    }
}

/// Classify a transport-level reqwest failure
fn classify_transport_error(err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() {
        AnalysisErrorKind::Timeout
    } else if err.is_connect() {
        AnalysisErrorKind::Network
    } else {
        AnalysisErrorKind::Other
    };
    analysis_error(kind, &err.to_string())
}

/// Build the user-facing error with the remediation message for its bucket
fn analysis_error(kind: AnalysisErrorKind, detail: &str) -> Error {
    let message = match kind {
        AnalysisErrorKind::Auth => format!(
            "❌ 认证失败：API密钥无效或已过期\n请更新config.toml中的DeepSeek API密钥。\n({})",
            detail
        ),
        AnalysisErrorKind::Forbidden => format!(
            "❌ 访问被拒绝：API密钥权限不足\n请检查您的DeepSeek账户权限。\n({})",
            detail
        ),
        AnalysisErrorKind::Network => format!(
            "❌ 网络连接错误：{}\n请检查网络连接并稍后重试。",
            detail
        ),
        AnalysisErrorKind::Timeout => format!(
            "❌ 请求超时：AI分析耗时较长，已超过超时限制\n\n💡 解决方案：\n1. 您的API调用可能已成功，token已消耗（这是正常的）\n2. 请稍等1-2分钟后重试，避免重复计费\n3. 可以尝试缩小时间范围以减少数据量\n\n🔧 技术详情：{}",
            detail
        ),
        AnalysisErrorKind::Quota => format!(
            "❌ API配额限制：{}\n请检查您的DeepSeek API使用配额。",
            detail
        ),
        AnalysisErrorKind::Other => format!(
            "❌ AI分析服务暂时不可用：{}\n请稍后重试或联系技术支持。",
            detail
        ),
    };
    Error::Analysis { kind, message }
}

/// DeepSeek chat-completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// DeepSeek chat-completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::API_KEY_UNSET;

    #[test]
    fn test_backend_new() {
        let backend = DeepSeekBackend::new("sk-test", 90, 10, 2);
        assert_eq!(backend.model(), "deepseek-chat");
        assert_eq!(backend.base_url, "https://api.deepseek.com/v1");
        assert_eq!(backend.max_retries, 2);
    }

    #[test]
    fn test_from_config_rejects_placeholder_key() {
        let mut config = Config::default();
        config.deepseek.api_key = API_KEY_UNSET.to_string();

        let err = DeepSeekBackend::from_config(&config).unwrap_err();
        match err {
            Error::Analysis { kind, message } => {
                assert_eq!(kind, AnalysisErrorKind::Auth);
                assert!(message.contains("认证失败"));
            }
            other => panic!("Expected analysis error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_reads_knobs() {
        let mut config = Config::default();
        config.deepseek.api_key = "sk-live".to_string();
        config.settings.timeout_secs = 30;
        config.settings.max_retries = 1;

        let backend = DeepSeekBackend::from_config(&config).unwrap();
        assert_eq!(backend.timeout, Duration::from_secs(30));
        assert_eq!(backend.max_retries, 1);
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            AnalysisErrorKind::Auth
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, ""),
            AnalysisErrorKind::Forbidden
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            AnalysisErrorKind::Quota
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, "monthly quota exceeded"),
            AnalysisErrorKind::Quota
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, "invalid api_key supplied"),
            AnalysisErrorKind::Auth
        );
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            AnalysisErrorKind::Other
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "你好".to_string(),
            }],
            temperature: REPORT_TEMPERATURE,
            max_tokens: REPORT_MAX_TOKENS,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "你好");
        assert_eq!(json["max_tokens"], 4000);
        assert_eq!(json["stream"], false);
        let temp = json["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 0.001);
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "报告内容"},
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.content, "报告内容");
    }
}
