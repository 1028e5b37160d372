pub mod incremental;
pub mod pipeline;
pub mod stages;

use crate::config::SiteConfig;
use anyhow::Result;
use incremental::BuildStats;
use std::path::Path;

/// 构建运行参数
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildParams {
    pub clean: bool,
    pub force: bool,
}

pub fn run(project_root: &Path, config: &SiteConfig, params: BuildParams) -> Result<BuildStats> {
    let output_dir = project_root.join(&config.build.output_dir);

    if params.clean {
        if output_dir.exists() {
            std::fs::remove_dir_all(&output_dir)?;
            tracing::info!("已清除输出目录：{}", output_dir.display());
        }
        let cache_dir = project_root.join(&config.build.cache_dir);
        if cache_dir.exists() {
            std::fs::remove_dir_all(&cache_dir)?;
            tracing::info!("已清除缓存目录：{}", cache_dir.display());
        }
    }

    std::fs::create_dir_all(&output_dir)?;

    // clean 模式下缓存已被清除，等同于 force
    pipeline::execute(project_root, config, params.force || params.clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::UNCATEGORIZED;
    use std::path::PathBuf;

    fn project(config_extra: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(
            root.join("kb.toml"),
            format!("[site]\ntitle = \"KB\"\n{config_extra}"),
        )
        .unwrap();
        let posts = root.join("content/posts");
        std::fs::create_dir_all(posts.join("guides")).unwrap();
        std::fs::write(posts.join("a.md"), "---\ntitle: A\ndate: 2024-01-01\norder: 5\n---\nA").unwrap();
        std::fs::write(
            posts.join("b.md"),
            "---\ntitle: B\ndate: 2024-01-02\ncategories: Guides\norder: 1\n---\nB",
        )
        .unwrap();
        std::fs::write(
            posts.join("guides/c.md"),
            "---\ntitle: C\ndate: 2024-01-03\ncategories: [Guides, Setup, Extra]\norder: 2\n---\nC",
        )
        .unwrap();
        std::fs::write(posts.join("d.md"), "---\ntitle: D\ndate: 2024-01-04\n---\nD").unwrap();
        dir
    }

    fn kb_json(root: &Path) -> serde_json::Value {
        let raw = std::fs::read_to_string(root.join("public/api/kb.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn slugs(value: &serde_json::Value) -> Vec<String> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn build_writes_knowledge_base() {
        let dir = project("");
        let config = SiteConfig::load(dir.path()).unwrap();
        let stats = run(dir.path(), &config, BuildParams::default()).unwrap();

        assert_eq!(stats.posts, 4);
        assert_eq!(stats.categories, 2);
        // kb.json + 4 篇文章页 + 文章列表
        assert_eq!(stats.outputs, 6);

        let kb = kb_json(dir.path());
        let cats = &kb["categories"];
        assert_eq!(slugs(&cats[UNCATEGORIZED]["posts"]), ["a", "d"]);
        assert_eq!(slugs(&cats["Guides"]["posts"]), ["b"]);
        assert_eq!(slugs(&cats["Guides"]["subcategories"]["Setup"]["posts"]), ["c"]);
        assert_eq!(cats[UNCATEGORIZED]["posts"][1]["order"], 999);
        assert_eq!(cats["Guides"]["posts"][0]["path"], "2024/01/02/b/");
        assert_eq!(cats["Guides"]["posts"][0]["date"], "2024-01-02");
        assert!(
            cats["Guides"]["posts"][0]["content"]
                .as_str()
                .unwrap()
                .contains("<p>B</p>")
        );

        assert!(dir.path().join("public/2024/01/03/c/index.html").exists());
        let index = std::fs::read_to_string(dir.path().join("public/articles/index.html")).unwrap();
        assert!(index.find("/2024/01/04/d/").unwrap() < index.find("/2024/01/01/a/").unwrap());
    }

    #[test]
    fn moved_post_leaves_no_stale_page() {
        let dir = project("");
        let config = SiteConfig::load(dir.path()).unwrap();
        run(dir.path(), &config, BuildParams::default()).unwrap();
        let old_page = dir.path().join("public/2024/01/02/b/index.html");
        assert!(old_page.exists());

        std::fs::write(
            dir.path().join("content/posts/b.md"),
            "---\ntitle: B\ndate: 2024-02-10\ncategories: Guides\norder: 1\n---\nB",
        )
        .unwrap();
        let stats = run(dir.path(), &config, BuildParams::default()).unwrap();

        assert_eq!(stats.removed, 1);
        assert!(!old_page.exists());
        assert!(!dir.path().join("public/2024/01/02").exists());
        assert!(dir.path().join("public/2024/02/10/b/index.html").exists());
        assert_eq!(kb_json(dir.path())["categories"]["Guides"]["posts"][0]["path"], "2024/02/10/b/");

        let cache = std::fs::read_to_string(dir.path().join(".kb-cache/hashes.json")).unwrap();
        assert!(!cache.contains("2024/01/02/b/index.html"));
        assert!(cache.contains("2024/02/10/b/index.html"));
    }

    #[test]
    fn rebuild_without_changes_writes_nothing() {
        let dir = project("");
        let config = SiteConfig::load(dir.path()).unwrap();
        run(dir.path(), &config, BuildParams::default()).unwrap();
        let first = kb_json(dir.path());

        let stats = run(dir.path(), &config, BuildParams::default()).unwrap();
        assert_eq!(stats.written, 0);
        assert_eq!(stats.unchanged, stats.outputs);
        assert_eq!(kb_json(dir.path()), first);

        let forced = run(dir.path(), &config, BuildParams { force: true, clean: false }).unwrap();
        assert_eq!(forced.written, forced.outputs);
    }

    #[test]
    fn clean_removes_stale_outputs() {
        let dir = project("");
        let config = SiteConfig::load(dir.path()).unwrap();
        let stale: PathBuf = dir.path().join("public/stale.html");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        run(dir.path(), &config, BuildParams { clean: true, force: false }).unwrap();
        assert!(!stale.exists());
        assert!(dir.path().join("public/api/kb.json").exists());
    }

    #[test]
    fn articles_can_be_disabled() {
        let dir = project("[articles]\nenabled = false\n[kb]\noutput_path = \"data/tree.json\"\n");
        let config = SiteConfig::load(dir.path()).unwrap();
        let stats = run(dir.path(), &config, BuildParams::default()).unwrap();
        assert_eq!(stats.outputs, 1);
        assert!(dir.path().join("public/data/tree.json").exists());
        assert!(!dir.path().join("public/2024").exists());
    }

    #[test]
    fn invalid_post_aborts_without_output() {
        let dir = project("");
        std::fs::write(
            dir.path().join("content/posts/broken.md"),
            "---\ndate: not-a-date\n---\nx",
        )
        .unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        assert!(run(dir.path(), &config, BuildParams::default()).is_err());
        assert!(!dir.path().join("public/api/kb.json").exists());
    }
}
