use crate::config::CONFIG_FILE;
use anyhow::Result;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"[site]
title = "我的知识库"
description = ""
url = "https://example.com"
language = "zh-CN"

[build]
output_dir = "public"
content_dir = "content/posts"

[routes]
permalink = "{year}/{month}/{day}/{slug}/"

[kb]
output_path = "api/kb.json"
pretty = false

[articles]
enabled = true
template = "templates/article.html"
index = true
index_path = "articles/index.html"

# 分类名 → 页面上显示的标签
[articles.labels]

[log]
level = "info"
"#;

const SAMPLE_POST: &str = r#"---
title: 你好，知识库
categories: [入门, 快速开始]
order: 1
---

## 写作约定

`categories` 的第一项是顶级分类，第二项是子分类，更多层级会被忽略。
没有分类的文章归入「未分类」，`order` 越小越靠前。
"#;

/// 检测项目是否已初始化，未初始化则创建骨架。
/// 返回 `true` 表示执行了初始化，`false` 表示已存在。
pub fn ensure_initialized(root: &Path) -> Result<bool> {
    if root.join(CONFIG_FILE).exists() {
        return Ok(false);
    }

    fs::create_dir_all(root.join("content/posts"))?;
    fs::write(root.join(CONFIG_FILE), DEFAULT_CONFIG)?;

    let sample = root.join("content/posts/hello-kb.md");
    if !sample.exists() {
        fs::write(sample, SAMPLE_POST)?;
    }

    Ok(true)
}
