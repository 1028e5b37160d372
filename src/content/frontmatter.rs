use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;

/// `categories: 教程` 与 `categories: [教程, 入门]` 两种写法
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFrontMatter {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub categories: Option<OneOrMany>,
    pub category: Option<String>,
    pub tags: Option<OneOrMany>,
    pub order: Option<i64>,
    pub draft: Option<bool>,
    pub excerpt: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl RawFrontMatter {
    /// `categories` 优先，其次兼容单值的 `category`
    pub fn category_list(&mut self) -> Vec<String> {
        match self.categories.take() {
            Some(cats) => cats.into_vec(),
            None => self.category.take().into_iter().collect(),
        }
    }
}

pub struct ParsedContent {
    pub front_matter: RawFrontMatter,
    pub body: String,
}

/// 分离 Front Matter 和正文。没有 Front Matter 时整段当正文处理，
/// 字段类型不符时返回错误信息
pub fn parse_content(content: &str) -> Result<ParsedContent, String> {
    let matter = gray_matter::Matter::<gray_matter::engine::YAML>::new();
    let parsed = matter.parse(content);

    // 空的 `---\n---` 块解析为 Null，按无 Front Matter 处理
    let front_matter = match parsed.data {
        Some(pod) if !matches!(pod, gray_matter::Pod::Null) => pod
            .deserialize::<RawFrontMatter>()
            .map_err(|e| e.to_string())?,
        _ => RawFrontMatter::default(),
    };

    Ok(ParsedContent {
        front_matter,
        body: parsed.content,
    })
}

/// 从文件名推导 slug（去除日期前缀和扩展名）
pub fn slug_from_filename(filename: &str) -> String {
    let name = filename
        .trim_end_matches(".md")
        .trim_end_matches(".markdown");
    // 去掉 YYYY-MM-DD- 日期前缀
    let slug = match name.get(..11) {
        Some(prefix) if name.len() > 11 && is_date_prefix(prefix.as_bytes()) => &name[11..],
        _ => name,
    };
    slug.to_string()
}

fn is_date_prefix(bytes: &[u8]) -> bool {
    bytes[0..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(|b| b.is_ascii_digit())
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(|b| b.is_ascii_digit())
        && bytes[10] == b'-'
}

/// 解析日期字符串，支持 RFC 3339、无时区 ISO 8601、纯日期和斜线格式。
/// 带偏移的时间保留原偏移；不带偏移的按书写的钟点原样保存（偏移为 0），
/// 两种情况下日历日都与作者所写一致
pub fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let s = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().fixed_offset());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset());
        }
    }
    None
}
