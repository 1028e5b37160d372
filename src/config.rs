use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const CONFIG_FILE: &str = "kb.toml";

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    pub site: SiteInfo,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub routes: RouteConfig,
    #[serde(default)]
    pub kb: KbConfig,
    #[serde(default)]
    pub articles: ArticlesConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct SiteInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

#[derive(Debug, Deserialize)]
pub struct RouteConfig {
    /// 文章输出路径模板，支持 {year} {month} {day} {slug}
    #[serde(default = "default_permalink")]
    pub permalink: String,
}

#[derive(Debug, Deserialize)]
pub struct KbConfig {
    /// 相对 output_dir 的 JSON 输出位置
    #[serde(default = "default_kb_output_path")]
    pub output_path: String,
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Deserialize)]
pub struct ArticlesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 相对项目根目录的模板路径，不存在时使用内置模板
    #[serde(default = "default_article_template")]
    pub template: String,
    /// 是否生成文章列表页
    #[serde(default = "default_true")]
    pub index: bool,
    /// 文章列表页的输出位置，相对 output_dir
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default = "default_index_template")]
    pub index_template: String,
    /// 分类名 → 页面上显示的标签，如 `formal-verification = "形式化验证"`
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl ArticlesConfig {
    /// 文章页上显示的分类标签：取第一个分类，未配置映射时原样显示
    pub fn category_label<'a>(&'a self, categories: &'a [String]) -> &'a str {
        let category = categories.first().map_or(crate::kb::UNCATEGORIZED, String::as_str);
        self.labels.get(category).map_or(category, String::as_str)
    }
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl SiteConfig {
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}

// 默认值函数
fn default_language() -> String { "zh-CN".into() }
fn default_output_dir() -> String { "public".into() }
fn default_cache_dir() -> String { ".kb-cache".into() }
fn default_content_dir() -> String { "content/posts".into() }
fn default_excerpt_length() -> usize { 160 }
fn default_true() -> bool { true }
fn default_permalink() -> String { "{year}/{month}/{day}/{slug}/".into() }
fn default_kb_output_path() -> String { "api/kb.json".into() }
fn default_article_template() -> String { "templates/article.html".into() }
fn default_index_path() -> String { "articles/index.html".into() }
fn default_index_template() -> String { "templates/index.html".into() }
fn default_log_level() -> String { "info".into() }

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            content_dir: default_content_dir(),
            excerpt_length: default_excerpt_length(),
            parallel: true,
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            permalink: default_permalink(),
        }
    }
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            output_path: default_kb_output_path(),
            pretty: false,
        }
    }
}

impl Default for ArticlesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            template: default_article_template(),
            index: true,
            index_path: default_index_path(),
            index_template: default_index_template(),
            labels: HashMap::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
