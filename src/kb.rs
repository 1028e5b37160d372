//! 知识库分类树：把文章归入两级分类，生成 `api/kb.json` 的数据结构。

use crate::content::PostRecord;
use indexmap::IndexMap;
use serde::Serialize;

/// 没有任何分类的文章归入此分类
pub const UNCATEGORIZED: &str = "未分类";

/// 未指定 order 的文章排在最后
pub const DEFAULT_ORDER: i64 = 999;

/// kb.json 中的单篇文章条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    /// YYYY-MM-DD
    pub date: String,
    pub content: String,
    pub path: String,
    pub order: i64,
}

impl From<&PostRecord> for PostSummary {
    fn from(post: &PostRecord) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            date: post.date.format("%Y-%m-%d").to_string(),
            content: post.content.clone(),
            path: post.path.clone(),
            order: post.order.unwrap_or(DEFAULT_ORDER),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryNode {
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub posts: Vec<PostSummary>,
    pub subcategories: IndexMap<String, SubcategoryNode>,
}

impl CategoryNode {
    pub fn subcategory_mut(&mut self, name: &str) -> &mut SubcategoryNode {
        self.subcategories.entry(name.to_owned()).or_default()
    }

    /// 本分类及其子分类下的文章总数
    pub fn post_count(&self) -> usize {
        self.posts.len()
            + self
                .subcategories
                .values()
                .map(|sub| sub.posts.len())
                .sum::<usize>()
    }

    fn sort_posts(&mut self) {
        // sort_by_key 是稳定排序，同 order 保持输入顺序
        self.posts.sort_by_key(|p| p.order);
        for sub in self.subcategories.values_mut() {
            sub.posts.sort_by_key(|p| p.order);
        }
    }
}

/// 顶级分类名 → 分类节点。键顺序为首次出现顺序，消费方不应依赖
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryTree(IndexMap<String, CategoryNode>);

impl CategoryTree {
    pub fn category_mut(&mut self, name: &str) -> &mut CategoryNode {
        self.0.entry(name.to_owned()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&CategoryNode> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryNode)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn post_count(&self) -> usize {
        self.0.values().map(CategoryNode::post_count).sum()
    }
}

/// kb.json 的顶层文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KbDocument {
    pub categories: CategoryTree,
}

impl KbDocument {
    pub fn new(categories: CategoryTree) -> Self {
        Self { categories }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// 超出两级的分类名（第三个及之后），构建时会被忽略
pub fn dropped_categories(post: &PostRecord) -> &[String] {
    post.categories.get(2..).unwrap_or_default()
}

/// 按分类归档所有文章：
/// - 无分类 → `未分类` 的直属文章
/// - 一个分类 → 该分类的直属文章
/// - 两个及以上 → 第一个为顶级分类，第二个为子分类，其余忽略
///
/// 每个文章列表按 order 升序稳定排序。
pub fn build(posts: &[PostRecord]) -> CategoryTree {
    let mut tree = CategoryTree::default();

    for post in posts {
        let summary = PostSummary::from(post);
        match post.categories.as_slice() {
            [] => tree.category_mut(UNCATEGORIZED).posts.push(summary),
            [category] => tree.category_mut(category).posts.push(summary),
            [category, subcategory, ..] => tree
                .category_mut(category)
                .subcategory_mut(subcategory)
                .posts
                .push(summary),
        }
    }

    for node in tree.0.values_mut() {
        node.sort_posts();
    }

    tree
}
