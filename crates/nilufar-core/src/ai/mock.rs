//! Mock analysis backend for tests

use async_trait::async_trait;

use super::{AnalysisBackend, PeriodSummary};
use crate::error::{AnalysisErrorKind, Error, Result};

/// A backend that returns canned responses without touching the network
pub struct MockBackend {
    report: String,
    fail_kind: Option<AnalysisErrorKind>,
}

impl MockBackend {
    /// Always succeeds with the given report text
    pub fn new(report: &str) -> Self {
        Self {
            report: report.to_string(),
            fail_kind: None,
        }
    }

    /// Always fails with the given error kind
    pub fn failing(kind: AnalysisErrorKind) -> Self {
        Self {
            report: String::new(),
            fail_kind: Some(kind),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("【第一部分：总体财务概览】\n模拟分析报告。")
    }
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    async fn comparative_report(
        &self,
        _period1: &PeriodSummary,
        _period2: &PeriodSummary,
    ) -> Result<String> {
        match self.fail_kind {
            Some(kind) => Err(Error::Analysis {
                kind,
                message: "mock failure".to_string(),
            }),
            None => Ok(self.report.clone()),
        }
    }

    async fn test_connection(&self) -> Result<String> {
        match self.fail_kind {
            Some(kind) => Err(Error::Analysis {
                kind,
                message: "mock failure".to_string(),
            }),
            None => Ok("连接测试成功".to_string()),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
