use crate::build::incremental::{BuildStats, HashCache};
use crate::build::stages;
use crate::config::SiteConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// 执行构建管道：加载 → 分类树 → 文章页 → 写出
///
/// 所有输出先在内存中生成完毕再落盘，任一阶段失败都不会留下半成品 kb.json。
/// `force` 为 true 时忽略哈希缓存，全部重写
pub fn execute(project_root: &Path, config: &SiteConfig, force: bool) -> Result<BuildStats> {
    tracing::info!("开始构建...");
    let start = std::time::Instant::now();

    let output_dir = project_root.join(&config.build.output_dir);
    let cache_dir = project_root.join(&config.build.cache_dir);
    let mut hash_cache = HashCache::load(&cache_dir);
    if force {
        tracing::info!("已指定强制重建，忽略缓存");
        hash_cache.force_rewrite();
    }

    let posts = stages::load::load_posts(project_root, config)?;

    let document = stages::knowledge::generate(&posts);
    let kb_json = document
        .to_json(config.kb.pretty)
        .context("序列化 kb.json 失败")?;

    let articles = if config.articles.enabled {
        let mut pages = stages::articles::render_articles(project_root, config, &posts)?;
        if config.articles.index {
            pages.push(stages::articles::render_index(project_root, config, &posts)?);
        }
        pages
    } else {
        Vec::new()
    };

    let mut stats = BuildStats {
        posts: posts.len(),
        categories: document.categories.len(),
        ..Default::default()
    };

    hash_cache.emit(&mut stats, &output_dir, &config.kb.output_path, kb_json.as_bytes())?;
    tracing::info!("已生成 {}", config.kb.output_path);

    for page in &articles {
        hash_cache.emit(&mut stats, &output_dir, &page.output_path, page.html.as_bytes())?;
    }

    stats.removed = hash_cache.prune(&output_dir)?;

    if let Err(e) = hash_cache.save() {
        tracing::warn!("保存哈希缓存失败：{}", e);
    }

    tracing::info!(
        "构建完成，耗时 {:.2}s（{} 篇文章，{} 个分类，写入 {}，未变更 {}，删除 {}）",
        start.elapsed().as_secs_f64(),
        stats.posts,
        stats.categories,
        stats.written,
        stats.unchanged,
        stats.removed,
    );

    Ok(stats)
}
