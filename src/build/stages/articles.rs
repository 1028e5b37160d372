use crate::config::SiteConfig;
use crate::content::Post;
use anyhow::{Context, Result};
use minijinja::Environment;
use std::path::Path;

const TEMPLATE_NAME: &str = "article.html";
const INDEX_TEMPLATE_NAME: &str = "index.html";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="description" content="{{ post.excerpt }}">
    <title>{{ post.title }} - {{ site.title }}</title>
</head>
<body>
    <article class="article-content">
        <header class="article-header">
            <h1>{{ post.title }}</h1>
            <div class="article-meta">
                <span class="article-date">{{ post.date }}</span>
                <span class="tag tag-primary">{{ category_label }}</span>
            </div>
            <div class="article-tags">
                {%- for tag in post.tags %}
                <span class="tag">{{ tag }}</span>
                {%- endfor %}
            </div>
        </header>
        {%- if post.toc %}
        <nav class="article-toc">{{ post.toc|safe }}</nav>
        {%- endif %}
        <div class="article-body">
{{ post.content|safe }}
        </div>
    </article>
</body>
</html>
"#;

const DEFAULT_INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>文章列表 - {{ site.title }}</title>
</head>
<body>
    <h1>{{ site.title }}</h1>
    <div class="article-list">
        {%- for post in posts %}
        <div class="article-card">
            <div class="article-card-meta">
                <span class="article-date">{{ post.date }}</span>
                <span class="tag tag-primary">{{ post.category_label }}</span>
            </div>
            <h2 class="article-card-title"><a href="/{{ post.path }}">{{ post.title }}</a></h2>
            <p class="article-card-excerpt">{{ post.excerpt }}</p>
            <div class="article-tags">
                {%- for tag in post.tags %}
                <span class="tag">{{ tag }}</span>
                {%- endfor %}
            </div>
        </div>
        {%- endfor %}
    </div>
</body>
</html>
"#;

/// 渲染后的文章页，尚未写入磁盘
pub struct ArticlePage {
    /// 相对输出目录的文件路径
    pub output_path: String,
    pub html: String,
}

/// `a/b/` → `a/b/index.html`，带扩展名的路径原样使用
pub fn output_file(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') {
        format!("{path}index.html")
    } else {
        path.to_string()
    }
}

fn load_template(project_root: &Path, relative: &str, builtin: &str) -> Result<String> {
    let path = project_root.join(relative);
    if path.exists() {
        tracing::debug!("使用自定义模板：{}", path.display());
        std::fs::read_to_string(&path)
            .with_context(|| format!("读取模板 {} 失败", path.display()))
    } else {
        Ok(builtin.to_string())
    }
}

fn site_context(config: &SiteConfig) -> serde_json::Value {
    serde_json::json!({
        "title": config.site.title,
        "description": config.site.description,
        "url": config.site.url,
        "language": config.site.language,
        "author": config.site.author,
    })
}

/// 将每篇文章渲染为独立 HTML 页面
pub fn render_articles(
    project_root: &Path,
    config: &SiteConfig,
    posts: &[Post],
) -> Result<Vec<ArticlePage>> {
    let mut env = Environment::new();
    let source = load_template(project_root, &config.articles.template, DEFAULT_TEMPLATE)?;
    env.add_template_owned(TEMPLATE_NAME, source)
        .context("编译文章模板失败")?;
    let tmpl = env.get_template(TEMPLATE_NAME)?;

    let site_ctx = site_context(config);

    let mut pages = Vec::with_capacity(posts.len());
    for post in posts {
        let ctx = serde_json::json!({
            "site": site_ctx,
            "category_label": config.articles.category_label(&post.categories),
            "post": {
                "title": post.title,
                "slug": post.slug,
                "date": post.date.format("%Y-%m-%d").to_string(),
                "updated": post.updated_at.format("%Y-%m-%d").to_string(),
                "content": post.content.html(),
                "path": post.path,
                "tags": post.tags,
                "categories": post.categories,
                "toc": post.toc,
                "excerpt": post.excerpt,
                "meta": post.meta,
            },
        });

        let html = tmpl
            .render(minijinja::Value::from_serialize(&ctx))
            .with_context(|| format!("渲染文章 {} 失败", post.slug))?;

        pages.push(ArticlePage {
            output_path: output_file(&post.path),
            html,
        });
    }

    tracing::info!("文章页渲染完成，共 {} 个", pages.len());
    Ok(pages)
}

/// 渲染文章列表页：按日期从新到旧，同一天保持加载顺序
pub fn render_index(
    project_root: &Path,
    config: &SiteConfig,
    posts: &[Post],
) -> Result<ArticlePage> {
    let mut env = Environment::new();
    let source = load_template(project_root, &config.articles.index_template, DEFAULT_INDEX_TEMPLATE)?;
    env.add_template_owned(INDEX_TEMPLATE_NAME, source)
        .context("编译文章列表模板失败")?;
    let tmpl = env.get_template(INDEX_TEMPLATE_NAME)?;

    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let cards: Vec<serde_json::Value> = sorted
        .iter()
        .map(|post| {
            serde_json::json!({
                "title": post.title,
                "slug": post.slug,
                "date": post.date.format("%Y-%m-%d").to_string(),
                "path": post.path,
                "excerpt": post.excerpt,
                "tags": post.tags,
                "category_label": config.articles.category_label(&post.categories),
            })
        })
        .collect();

    let ctx = serde_json::json!({
        "site": site_context(config),
        "posts": cards,
    });
    let html = tmpl
        .render(minijinja::Value::from_serialize(&ctx))
        .context("渲染文章列表失败")?;

    tracing::info!("文章列表渲染完成，共 {} 篇", cards.len());
    Ok(ArticlePage {
        output_path: config.articles.index_path.clone(),
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MarkdownContent;
    use crate::kb::UNCATEGORIZED;
    use chrono::{FixedOffset, TimeZone};
    use std::collections::HashMap;

    fn config() -> SiteConfig {
        toml::from_str("[site]\ntitle = \"我的知识库\"\n").unwrap()
    }

    fn post(categories: &[&str]) -> Post {
        let date = FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .unwrap();
        Post {
            slug: "hello".into(),
            title: "<你好>".into(),
            content: MarkdownContent::new("## 第一节\n\n正文".into()),
            date,
            updated_at: date,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            tags: vec!["rust".into()],
            order: None,
            path: "2024/05/01/hello/".into(),
            excerpt: "正文".into(),
            toc: Some("<ul class=\"toc-list\"></ul>".into()),
            source: "content/posts/hello.md".into(),
            meta: HashMap::new(),
        }
    }

    #[test]
    fn output_file_for_directory_paths() {
        assert_eq!(output_file("2024/05/01/hello/"), "2024/05/01/hello/index.html");
        assert_eq!(output_file("docs/hello.html"), "docs/hello.html");
        assert_eq!(output_file(""), "index.html");
    }

    #[test]
    fn default_template_renders_post() {
        let dir = tempfile::tempdir().unwrap();
        let pages = render_articles(dir.path(), &config(), &[post(&["教程", "入门"])]).unwrap();
        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.output_path, "2024/05/01/hello/index.html");
        assert!(page.html.contains("<title>&lt;你好&gt; - 我的知识库</title>"), "{}", page.html);
        assert!(page.html.contains("<h2 id=\"第一节\">第一节</h2>"));
        assert!(page.html.contains("<span class=\"tag tag-primary\">教程</span>"));
        assert!(page.html.contains("<span class=\"tag\">rust</span>"));
        assert!(page.html.contains("toc-list"));
    }

    #[test]
    fn uncategorized_label() {
        let dir = tempfile::tempdir().unwrap();
        let pages = render_articles(dir.path(), &config(), &[post(&[])]).unwrap();
        assert!(pages[0].html.contains(UNCATEGORIZED));
    }

    #[test]
    fn custom_template_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("templates/article.html");
        std::fs::create_dir_all(tpl.parent().unwrap()).unwrap();
        std::fs::write(&tpl, "{{ post.slug }}|{{ post.date }}|{{ site.title }}").unwrap();
        let pages = render_articles(dir.path(), &config(), &[post(&[])]).unwrap();
        assert_eq!(pages[0].html, "hello|2024-05-01|我的知识库");
    }

    #[test]
    fn broken_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("templates/article.html");
        std::fs::create_dir_all(tpl.parent().unwrap()).unwrap();
        std::fs::write(&tpl, "{% if %}").unwrap();
        assert!(render_articles(dir.path(), &config(), &[post(&[])]).is_err());
    }

    #[test]
    fn configured_label_replaces_category_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.articles.labels.insert("教程".into(), "入门教程".into());
        let pages = render_articles(dir.path(), &config, &[post(&["教程", "入门"])]).unwrap();
        assert!(pages[0].html.contains("<span class=\"tag tag-primary\">入门教程</span>"));
    }

    #[test]
    fn index_lists_newest_first_with_cards() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.articles.labels.insert("工具".into(), "开发工具".into());

        let mut older = post(&["工具"]);
        older.slug = "older".into();
        older.title = "旧文章".into();
        older.path = "2024/05/01/older/".into();
        older.excerpt = "旧的摘要".into();

        let mut newer = post(&[]);
        newer.slug = "newer".into();
        newer.title = "新文章".into();
        newer.path = "2024/06/01/newer/".into();
        newer.date = newer.date + chrono::Duration::days(31);
        newer.tags = vec!["速记".into()];

        let page = render_index(dir.path(), &config, &[older, newer]).unwrap();
        assert_eq!(page.output_path, "articles/index.html");
        let html = &page.html;
        let new_pos = html.find("<a href=\"/2024/06/01/newer/\">新文章</a>").unwrap();
        let old_pos = html.find("<a href=\"/2024/05/01/older/\">旧文章</a>").unwrap();
        assert!(new_pos < old_pos, "{html}");
        assert!(html.contains("<span class=\"article-date\">2024-06-01</span>"));
        assert!(html.contains("<span class=\"tag tag-primary\">开发工具</span>"));
        assert!(html.contains(&format!("<span class=\"tag tag-primary\">{UNCATEGORIZED}</span>")));
        assert!(html.contains("<p class=\"article-card-excerpt\">旧的摘要</p>"));
        assert!(html.contains("<span class=\"tag\">速记</span>"));
    }

    #[test]
    fn custom_index_template_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("templates/index.html");
        std::fs::create_dir_all(tpl.parent().unwrap()).unwrap();
        std::fs::write(&tpl, "{% for p in posts %}{{ p.slug }};{% endfor %}").unwrap();
        let page = render_index(dir.path(), &config(), &[post(&[])]).unwrap();
        assert_eq!(page.html, "hello;");
    }
}
