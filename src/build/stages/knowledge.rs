use crate::content::{Post, PostRecord};
use crate::kb::{self, KbDocument, UNCATEGORIZED};

/// 从已加载的文章生成知识库文档
pub fn generate(posts: &[Post]) -> KbDocument {
    let records: Vec<PostRecord> = posts.iter().map(Post::to_record).collect();

    for record in &records {
        let dropped = kb::dropped_categories(record);
        if !dropped.is_empty() {
            tracing::warn!(
                "文章 {} 的分类超过两级，已忽略：{}",
                record.slug,
                dropped.join(" / ")
            );
        }
    }

    let document = KbDocument::new(kb::build(&records));
    if document.categories.is_empty() {
        tracing::warn!("没有可发布的文章，kb.json 将不包含任何分类");
        return document;
    }
    if let Some(node) = document.categories.get(UNCATEGORIZED) {
        tracing::info!("{} 篇文章未设置分类，归入「{}」", node.post_count(), UNCATEGORIZED);
    }
    for (name, node) in document.categories.iter() {
        tracing::debug!(
            "分类 {}：{} 篇文章，{} 个子分类",
            name,
            node.post_count(),
            node.subcategories.len()
        );
    }
    tracing::info!(
        "知识库：{} 个顶级分类，{} 篇文章",
        document.categories.len(),
        document.categories.post_count()
    );
    document
}
