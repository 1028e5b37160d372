use std::path::PathBuf;
use thiserror::Error;

/// 读取或解析 kb.toml 时的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取 {} 失败：{}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析 {} 失败：{}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// 加载文章时的错误，任何一项都会中止构建
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("读取文章 {} 失败：{}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("遍历文章目录 {} 失败：{}", .path.display(), .source)]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("文章 {} 的 Front Matter 无效：{}", .path.display(), .message)]
    FrontMatter { path: PathBuf, message: String },

    #[error("文章 {} 的日期无法解析：{}", .path.display(), .value)]
    InvalidDate { path: PathBuf, value: String },

    #[error("slug 重复：{}（{} 与 {}）", .slug, .first.display(), .second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}
