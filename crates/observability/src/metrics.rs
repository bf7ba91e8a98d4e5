//! 网关运行指标
//!
//! 未安装 recorder 时所有调用都是空操作。

use metrics::{counter, gauge, histogram};

/// 记录一次 fetch cycle 结果
pub fn record_cycle_outcome(branch_id: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "punch_gateway_cycles_total",
        "branch" => branch_id.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录成功转发的记录数
pub fn record_records_forwarded(branch_id: &str, count: usize) {
    if count == 0 {
        return;
    }
    counter!(
        "punch_gateway_records_forwarded_total",
        "branch" => branch_id.to_string()
    )
    .increment(count as u64);
}

/// 记录一次 fleet pass 完成及其耗时
pub fn record_pass(duration_ms: f64) {
    counter!("punch_gateway_passes_total").increment(1);
    histogram!("punch_gateway_pass_duration_ms").record(duration_ms);
}

/// 记录 branch directory 枚举失败
pub fn record_directory_failure() {
    counter!("punch_gateway_directory_failures_total").increment(1);
}

/// 记录 watermark 当前值 (终端本地时间按 UTC 解释的秒数)
pub fn record_watermark(branch_id: &str, seconds: i64) {
    gauge!(
        "punch_gateway_watermark_seconds",
        "branch" => branch_id.to_string()
    )
    .set(seconds as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_cycle_outcome("B1", true);
        record_cycle_outcome("B1", false);
        record_records_forwarded("B1", 0);
        record_records_forwarded("B1", 3);
        record_pass(12.5);
        record_directory_failure();
        record_watermark("B1", 1_700_000_000);
    }
}
