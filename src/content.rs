pub mod excerpt;
pub mod frontmatter;
pub mod markdown;

use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct MarkdownContent {
    pub raw: String,
    html: OnceLock<String>,
}

impl MarkdownContent {
    pub fn new(raw: String) -> Self {
        Self {
            raw,
            html: OnceLock::new(),
        }
    }

    pub fn html(&self) -> &str {
        self.html.get_or_init(|| markdown::render_markdown(&self.raw))
    }
}

/// 从 content/posts/ 加载的一篇已发布文章
#[derive(Debug)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub content: MarkdownContent,
    /// 保留作者书写时的时区偏移，日期与路径均按该偏移下的日历日计算
    pub date: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub order: Option<i64>,
    /// 相对输出目录的路径，如 `2024/01/15/hello/`
    pub path: String,
    pub excerpt: String,
    pub toc: Option<String>,
    pub source: PathBuf,
    pub meta: HashMap<String, serde_json::Value>,
}

/// 分类树构建器的输入，只包含生成 kb.json 需要的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub content: String,
    pub path: String,
    pub order: Option<i64>,
    pub categories: Vec<String>,
}

impl Post {
    pub fn to_record(&self) -> PostRecord {
        PostRecord {
            title: self.title.clone(),
            slug: self.slug.clone(),
            date: self.date.date_naive(),
            content: self.content.html().to_string(),
            path: self.path.clone(),
            order: self.order,
            categories: self.categories.clone(),
        }
    }
}
