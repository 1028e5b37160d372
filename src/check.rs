use crate::build::stages::load;
use crate::config::{CONFIG_FILE, SiteConfig};
use crate::content::Post;
use crate::kb;
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Default)]
pub struct CheckResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// 执行项目完整性检查：配置、文章内容、文章模板
pub fn run(project_root: &Path) -> Result<CheckResult> {
    let mut result = CheckResult::default();

    let config_path = project_root.join(CONFIG_FILE);
    if !config_path.exists() {
        result.errors.push(format!("缺少 {CONFIG_FILE} 配置文件"));
        return Ok(result);
    }
    let config = match SiteConfig::load(project_root) {
        Ok(cfg) => cfg,
        Err(e) => {
            result.errors.push(e.to_string());
            return Ok(result);
        }
    };

    check_content(project_root, &config, &mut result);
    check_template(project_root, &config, &mut result);

    Ok(result)
}

/// 逐个加载文章以收集全部错误，而不是在第一个错误处停止
fn check_content(root: &Path, config: &SiteConfig, result: &mut CheckResult) {
    let posts_dir = root.join(&config.build.content_dir);
    if !posts_dir.exists() {
        result
            .warnings
            .push(format!("{}/ 目录不存在", config.build.content_dir));
        return;
    }

    let sources = match load::collect_sources(&posts_dir) {
        Ok(sources) => sources,
        Err(e) => {
            result.errors.push(e.to_string());
            return;
        }
    };

    let mut posts: Vec<Post> = Vec::new();
    for path in sources {
        match load::load_single_post(&path, config) {
            Ok(Some(post)) => posts.push(post),
            Ok(None) => {}
            Err(e) => result.errors.push(e.to_string()),
        }
    }

    if let Err(e) = load::ensure_unique_slugs(&posts) {
        result.errors.push(e.to_string());
    }

    for post in &posts {
        let record = post.to_record();
        let dropped = kb::dropped_categories(&record);
        if !dropped.is_empty() {
            result.warnings.push(format!(
                "文章 {} 的分类超过两级，{} 将被忽略",
                post.slug,
                dropped.join(" / ")
            ));
        }
    }

    if posts.is_empty() && result.errors.is_empty() {
        result.warnings.push("没有可发布的文章".to_string());
    }
}

fn check_template(root: &Path, config: &SiteConfig, result: &mut CheckResult) {
    if !config.articles.enabled {
        return;
    }
    let mut templates = vec![&config.articles.template];
    if config.articles.index {
        templates.push(&config.articles.index_template);
    }
    for relative in templates {
        let path = root.join(relative);
        if !path.exists() {
            continue;
        }
        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                result.errors.push(format!("读取模板 {relative} 失败: {e}"));
                continue;
            }
        };
        let mut env = minijinja::Environment::new();
        if let Err(e) = env.add_template_owned(relative.clone(), source) {
            result.errors.push(format!("模板 {relative} 编译失败: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[site]\ntitle = \"KB\"\n").unwrap();
        std::fs::create_dir_all(dir.path().join("content/posts")).unwrap();
        dir
    }

    fn post(root: &Path, name: &str, content: &str) {
        std::fs::write(root.join("content/posts").join(name), content).unwrap();
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path()).unwrap();
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn clean_project_passes() {
        let dir = project();
        post(dir.path(), "a.md", "---\ndate: 2024-01-01\ncategories: [A, B]\n---\nx");
        let result = run(dir.path()).unwrap();
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn collects_every_broken_post() {
        let dir = project();
        post(dir.path(), "a.md", "---\ndate: nope\n---\nx");
        post(dir.path(), "b.md", "---\norder: first\n---\nx");
        let result = run(dir.path()).unwrap();
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
    }

    #[test]
    fn reports_duplicates_and_deep_categories() {
        let dir = project();
        post(dir.path(), "a.md", "---\nslug: same\ndate: 2024-01-01\n---\nx");
        post(dir.path(), "b.md", "---\nslug: same\ndate: 2024-01-01\ncategories: [A, B, C]\n---\nx");
        let result = run(dir.path()).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("same"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains('C'));
    }

    #[test]
    fn broken_custom_template_is_reported() {
        let dir = project();
        post(dir.path(), "a.md", "---\ndate: 2024-01-01\n---\nx");
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/article.html"), "{% for %}").unwrap();
        let result = run(dir.path()).unwrap();
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn broken_index_template_is_reported() {
        let dir = project();
        post(dir.path(), "a.md", "---\ndate: 2024-01-01\n---\nx");
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/index.html"), "{% if %}").unwrap();
        let result = run(dir.path()).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("templates/index.html"));
    }
}
