//! AI comparative analysis
//!
//! Builds the fixed analyst prompt from two pre-aggregated spending periods
//! and sends it to a chat-completion backend. The backend sits behind the
//! `AnalysisBackend` trait so tests can swap in `MockBackend`.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::CategoryTotal;

mod deepseek;
mod mock;

pub use deepseek::DeepSeekBackend;
pub use mock::MockBackend;

/// One comparison period: an inclusive date range with its per-category
/// totals
#[derive(Debug, Clone)]
pub struct PeriodSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub totals: Vec<CategoryTotal>,
}

/// A chat-completion backend able to produce the comparative report
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Generate the comparative analysis report for two periods
    async fn comparative_report(
        &self,
        period1: &PeriodSummary,
        period2: &PeriodSummary,
    ) -> Result<String>;

    /// Cheap round-trip to verify the API key and connectivity; returns the
    /// model's reply text
    async fn test_connection(&self) -> Result<String>;

    /// Model identifier used by this backend
    fn model(&self) -> &str;
}

/// Render one period's totals as a box-drawing table for the prompt
pub(crate) fn format_period_table(period: &PeriodSummary, period_name: &str) -> String {
    if period.totals.is_empty() {
        return format!("{}：无支出记录", period_name);
    }

    let total: f64 = period.totals.iter().map(|t| t.total_amount).sum();

    let mut sorted = period.totals.clone();
    sorted.sort_by(|a, b| {
        b.total_amount
            .partial_cmp(&a.total_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines = vec![
        format!("{}支出明细:", period_name),
        "┌─────────────────────┬──────────────────┬─────────┐".to_string(),
        "│ 支出分类            │ 金额(元)         │ 占比(%) │".to_string(),
        "├─────────────────────┼──────────────────┼─────────┤".to_string(),
    ];

    for item in &sorted {
        let percentage = if total > 0.0 {
            item.total_amount / total * 100.0
        } else {
            0.0
        };
        lines.push(format!(
            "│ {:<10} │ {:>15} │ {:>6} │",
            item.category_name_cn,
            format!("¥{:.2}", item.total_amount),
            format!("{:.1}%", percentage),
        ));
    }

    lines.push("├─────────────────────┼──────────────────┼─────────┤".to_string());
    lines.push(format!("│ 合计                │ {:>15} │ 100.0%  │", format!("¥{:.2}", total)));
    lines.push("└─────────────────────┴──────────────────┴─────────┘".to_string());

    lines.join("\n")
}

/// The fixed analyst master prompt with both period tables embedded
pub(crate) fn build_comparison_prompt(period1: &PeriodSummary, period2: &PeriodSummary) -> String {
    let period1_table = format_period_table(period1, "时段一");
    let period2_table = format_period_table(period2, "时段二");

    format!(
        r#"
# 角色
你是一位顶级的餐厅财务数据分析师和商业顾问，你的客户是一家餐厅的老板。你的分析风格必须：**数据驱动、逻辑严谨、建议具体、格式清晰**。

# 任务
请根据以下两个时间段的支出汇总数据，为餐厅老板生成一份专业的、深入的财务对比分析报告。

# 原始数据
## 时段一: {p1_start} 至 {p1_end}
{period1_table}

## 时段二: {p2_start} 至 {p2_end}
{period2_table}

# 报告生成要求
请严格按照以下 **四个部分** 的结构来生成你的报告，并使用 **Markdown** 格式化文本，确保报告的专业性和可读性。

---
### **【第一部分：总体财务概览】**
用简洁的语言和关键数据总结两个时段的总体支出变化。必须包含：两个时段的**总支出**、支出的**绝对差额**、支出的**变化率（%）**，以及基于变化率的一个简短定性结论。

---
### **【第二部分：核心数据对比表】**
创建一个Markdown表格，清晰地对比两个时段内 **每一个支出品类** 的数据。表格必须包含以下列：`支出分类`, `时段一金额(元)`, `时段二金额(元)`, `差额(元)`, `变化率(%)`。如果某个品类只在一个时段出现，也要在表格中明确体现出来。

---
### **【第三部分：关键品类深度分析】**
基于上述表格，**挑选出2-3个最值得关注的变化品类**进行深度分析：金额变动最大的品类、比率变动最剧烈的品类、以及新增或消失的大额项目。

---
### **【第四部分：经营诊断与行动建议】**
基于前面的数据和分析，提供具体、可落地的建议，分为两类：
1.  **【🔍 需要您立即核实的问题】**: 提出需要老板亲自调查的疑点。
2.  **【💡 可考虑的行动方案】**: 提出具体的、前瞻性的改进建议。
"#,
        p1_start = period1.start,
        p1_end = period1.end,
        p2_start = period2.start,
        p2_end = period2.end,
        period1_table = period1_table,
        period2_table = period2_table,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: &str, end: &str, totals: &[(&str, f64)]) -> PeriodSummary {
        PeriodSummary {
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            totals: totals
                .iter()
                .map(|(name, amount)| CategoryTotal {
                    category_name_cn: name.to_string(),
                    total_amount: *amount,
                })
                .collect(),
        }
    }

    #[test]
    fn test_format_table_empty_period() {
        let p = period("2025-01-01", "2025-01-15", &[]);
        assert_eq!(format_period_table(&p, "时段一"), "时段一：无支出记录");
    }

    #[test]
    fn test_format_table_sorted_with_total() {
        let p = period("2025-01-01", "2025-01-15", &[("蔬菜", 100.0), ("羊肉", 300.0)]);
        let table = format_period_table(&p, "时段一");

        // Largest amount first
        let lamb = table.find("羊肉").unwrap();
        let veg = table.find("蔬菜").unwrap();
        assert!(lamb < veg);

        assert!(table.contains("¥300.00"));
        assert!(table.contains("¥400.00"), "totals row should sum amounts");
        assert!(table.contains("75.0%"));
        assert!(table.contains("25.0%"));
    }

    #[test]
    fn test_prompt_embeds_both_periods() {
        let p1 = period("2025-01-01", "2025-01-15", &[("羊肉", 1250.5)]);
        let p2 = period("2025-01-16", "2025-01-31", &[("羊肉", 990.0)]);
        let prompt = build_comparison_prompt(&p1, &p2);

        assert!(prompt.contains("2025-01-01 至 2025-01-15"));
        assert!(prompt.contains("2025-01-16 至 2025-01-31"));
        assert!(prompt.contains("¥1250.50"));
        assert!(prompt.contains("¥990.00"));
        assert!(prompt.contains("【第四部分：经营诊断与行动建议】"));
    }
}
