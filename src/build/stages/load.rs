use crate::config::SiteConfig;
use crate::content::frontmatter;
use crate::content::excerpt;
use crate::content::{MarkdownContent, Post};
use crate::error::ContentError;
use chrono::{DateTime, Datelike, FixedOffset, Local};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 收集文章目录下所有 Markdown 文件，按路径排序以保证遍历顺序稳定。
/// 符号链接按目标处理；无法读取的目录或断开的链接会中止构建
pub fn collect_sources(posts_dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(posts_dir).follow_links(true) {
        let entry = entry.map_err(|source| ContentError::Walk {
            path: source
                .path()
                .map_or_else(|| posts_dir.to_path_buf(), Path::to_path_buf),
            source,
        })?;
        let is_markdown = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == "md" || ext == "markdown");
        if entry.file_type().is_file() && is_markdown {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

/// 加载 content/posts/ 下的所有已发布文章，顺序与文件路径顺序一致
pub fn load_posts(project_root: &Path, config: &SiteConfig) -> anyhow::Result<Vec<Post>> {
    let posts_dir = project_root.join(&config.build.content_dir);
    if !posts_dir.exists() {
        tracing::warn!("文章目录不存在：{}", posts_dir.display());
        return Ok(Vec::new());
    }

    let sources = collect_sources(&posts_dir)?;
    tracing::debug!("发现 {} 个 Markdown 文件", sources.len());

    // 并行加载时 collect 仍保持输入顺序
    let loaded: Vec<Option<Post>> = if config.build.parallel {
        sources
            .par_iter()
            .map(|path| load_single_post(path, config))
            .collect::<Result<_, _>>()?
    } else {
        sources
            .iter()
            .map(|path| load_single_post(path, config))
            .collect::<Result<_, _>>()?
    };

    let posts: Vec<Post> = loaded.into_iter().flatten().collect();
    ensure_unique_slugs(&posts)?;

    tracing::info!("已加载 {} 篇文章", posts.len());
    Ok(posts)
}

/// 加载单篇文章，草稿返回 `None`
pub fn load_single_post(path: &Path, config: &SiteConfig) -> Result<Option<Post>, ContentError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = frontmatter::parse_content(&raw).map_err(|message| ContentError::FrontMatter {
        path: path.to_path_buf(),
        message,
    })?;
    let mut fm = parsed.front_matter;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let slug = fm
        .slug
        .take()
        .unwrap_or_else(|| frontmatter::slug_from_filename(&filename));

    if fm.draft.unwrap_or(false) {
        tracing::debug!("跳过草稿：{}", slug);
        return Ok(None);
    }

    let title = fm.title.take().unwrap_or_else(|| slug.clone());
    let date = match fm.date.as_deref() {
        Some(value) => parse_date_field(path, value)?,
        None => file_modified(path),
    };
    let updated_at = match fm.updated.as_deref() {
        Some(value) => parse_date_field(path, value)?,
        None => date,
    };

    let content = MarkdownContent::new(parsed.body);
    let html = content.html();
    let toc = crate::content::markdown::extract_toc(&content.raw);
    let excerpt = fm
        .excerpt
        .take()
        .unwrap_or_else(|| excerpt::extract_excerpt(html, config.build.excerpt_length));

    Ok(Some(Post {
        path: permalink(&config.routes.permalink, &slug, &date),
        categories: fm.category_list(),
        tags: fm.tags.take().map(|t| t.into_vec()).unwrap_or_default(),
        order: fm.order,
        slug,
        title,
        content,
        date,
        updated_at,
        excerpt,
        toc,
        source: path.to_path_buf(),
        meta: fm.extra,
    }))
}

fn parse_date_field(path: &Path, value: &str) -> Result<DateTime<FixedOffset>, ContentError> {
    frontmatter::parse_date(value).ok_or_else(|| ContentError::InvalidDate {
        path: path.to_path_buf(),
        value: value.to_string(),
    })
}

/// 未写日期时使用文件修改时间（本地时区）
fn file_modified(path: &Path) -> DateTime<FixedOffset> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now())
        .fixed_offset()
}

/// 展开路径模板中的 {year} {month} {day} {slug}
pub fn permalink(pattern: &str, slug: &str, date: &DateTime<FixedOffset>) -> String {
    pattern
        .replace("{year}", &format!("{:04}", date.year()))
        .replace("{month}", &format!("{:02}", date.month()))
        .replace("{day}", &format!("{:02}", date.day()))
        .replace("{slug}", slug)
        .trim_start_matches('/')
        .to_string()
}

pub fn ensure_unique_slugs(posts: &[Post]) -> Result<(), ContentError> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for post in posts {
        if let Some(first) = seen.insert(&post.slug, &post.source) {
            return Err(ContentError::DuplicateSlug {
                slug: post.slug.clone(),
                first: first.to_path_buf(),
                second: post.source.clone(),
            });
        }
    }
    Ok(())
}
