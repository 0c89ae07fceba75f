//! 电量读数与落盘记录

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// 落盘记录中的时间格式（不含年份，年份由所在分区决定）
pub const RECORD_TIME_FORMAT: &str = "%m-%d %H:%M:%S";

/// 一次采样得到的电量读数，创建后不可修改
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceReading {
    taken_at: NaiveDateTime,
    light: f64,
    ac: f64,
}

impl BalanceReading {
    /// `taken_at` 为配置时区下的本地时间，精度到秒
    pub fn new(taken_at: NaiveDateTime, light: f64, ac: f64) -> Self {
        Self {
            taken_at: taken_at.with_nanosecond(0).unwrap_or(taken_at),
            light,
            ac,
        }
    }

    pub fn taken_at(&self) -> NaiveDateTime {
        self.taken_at
    }

    pub fn light(&self) -> f64 {
        self.light
    }

    pub fn ac(&self) -> f64 {
        self.ac
    }

    /// 所属月份分区
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::of(self.taken_at.date())
    }
}

/// 落盘格式，字段名与前端页面读取的一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub time: String,
    #[serde(rename = "light_Balance")]
    pub light_balance: f64,
    #[serde(rename = "ac_Balance")]
    pub ac_balance: f64,
}

impl From<&BalanceReading> for ReadingRecord {
    fn from(reading: &BalanceReading) -> Self {
        Self {
            time: reading.taken_at.format(RECORD_TIME_FORMAT).to_string(),
            light_balance: reading.light,
            ac_balance: reading.ac,
        }
    }
}

/// 月份分区键 `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    year: i32,
    month: u32,
}

static PARTITION_FILE: OnceLock<Regex> = OnceLock::new();

fn partition_file_pattern() -> &'static Regex {
    PARTITION_FILE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2})\.json$").expect("partition file pattern is valid")
    })
}

impl PartitionKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 分区文件名 `YYYY-MM.json`
    pub fn file_name(&self) -> String {
        format!("{}.json", self)
    }

    /// 从文件名识别分区
    ///
    /// 不符合 `YYYY-MM.json` 形状返回 `None`；形状符合但不是合法月份
    /// （如 `2024-13.json`）返回 `Some(Err)`，由调用方告警后跳过。
    pub fn from_file_name(name: &str) -> Option<Result<Self, String>> {
        let caps = partition_file_pattern().captures(name)?;
        Some(caps[1].parse())
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PartitionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map(Self::of)
            .map_err(|e| format!("'{}' is not a calendar month: {}", s, e))
    }
}
