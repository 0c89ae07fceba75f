//! 电量报告格式化

use crate::status::Thresholds;

/// 电量报告格式化器
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFormatter {
    thresholds: Thresholds,
}

impl ReportFormatter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// 生成两行电量报告（末尾带一个空行）
    ///
    /// `escape` 为 true 时把数值中的 `.` 转义为 `\.`，供 Telegram MarkdownV2 使用。
    pub fn format(&self, light: f64, ac: f64, escape: bool) -> String {
        let light_status = self.thresholds.classify(light);
        let ac_status = self.thresholds.classify(ac);

        let mut light_str = format_balance(light);
        let mut ac_str = format_balance(ac);
        if escape {
            light_str = escape_markdown(&light_str);
            ac_str = escape_markdown(&ac_str);
        }

        format!(
            "💡 照明剩余电量：{} 度（{}）\n❄️ 空调剩余电量：{} 度（{}）\n\n",
            light_str,
            light_status.label(),
            ac_str,
            ac_status.label()
        )
    }
}

/// 数值输出保持小数形式：整数余额显示为 `12.0` 而不是 `12`
pub fn format_balance(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// MarkdownV2 中 `.` 为保留字符
pub fn escape_markdown(text: &str) -> String {
    text.replace('.', "\\.")
}
