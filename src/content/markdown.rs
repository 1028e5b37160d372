use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use std::collections::HashSet;
use std::sync::OnceLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// 文档中的一个标题及其锚点 id
struct HeadingAnchor {
    level: u8,
    text: String,
    id: String,
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// 按出现顺序为所有标题分配 id：`{#id}` 优先，否则由文本生成；
/// 重复的 id 追加 `-1`、`-2` 后缀。正文和 TOC 共用这一结果
fn heading_anchors(source: &str) -> Vec<HeadingAnchor> {
    let mut anchors = Vec::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in Parser::new_ext(source, parser_options()) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((level_number(level), id.map(|id| id.to_string()), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                let Some((level, explicit, text)) = current.take() else {
                    continue;
                };
                let base = explicit.unwrap_or_else(|| {
                    let slug = slugify_heading(&text);
                    if slug.is_empty() { "section".to_string() } else { slug }
                });
                let mut id = base.clone();
                let mut n = 0;
                while used.contains(&id) {
                    n += 1;
                    id = format!("{base}-{n}");
                }
                used.insert(id.clone());
                anchors.push(HeadingAnchor { level, text, id });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            _ => {}
        }
    }
    anchors
}

/// 解析 Markdown 为 HTML。代码块使用 syntect 生成带 CSS class 的高亮，
/// 标题补上与 TOC 一致的锚点 id
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, parser_options());
    let mut anchors = heading_anchors(source).into_iter();

    let mut in_code_block = false;
    let mut code_lang = String::new();
    let mut code_text = String::new();

    let mut events: Vec<Event> = Vec::new();

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                code_text.clear();
                code_lang = match &kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                let html = if code_lang.is_empty() {
                    None
                } else {
                    highlight_code(&code_text, &code_lang)
                }
                .unwrap_or_else(|| {
                    format!(
                        "<pre><code class=\"language-{}\">{}</code></pre>",
                        html_escape_code(&code_lang),
                        html_escape_code(&code_text)
                    )
                });
                events.push(Event::Html(CowStr::from(html)));
            }
            Event::Text(text) if in_code_block => {
                code_text.push_str(&text);
            }
            Event::Start(Tag::Heading { level, id, classes, attrs }) => {
                let id = anchors.next().map(|a| CowStr::from(a.id)).or(id);
                events.push(Event::Start(Tag::Heading { level, id, classes, attrs }));
            }
            _ => {
                events.push(event);
            }
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

fn highlight_code(code: &str, lang: &str) -> Option<String> {
    let syntax_set = syntax_set();
    let syntax = syntax_set.find_syntax_by_token(lang)?;
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .ok()?;
    }
    let highlighted = generator.finalize();
    Some(format!(
        "<pre class=\"code-highlight\"><code class=\"language-{}\">{highlighted}</code></pre>",
        html_escape_code(lang)
    ))
}

fn html_escape_code(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 从 Markdown 内容提取 TOC（h2-h4 的目录 HTML）
pub fn extract_toc(source: &str) -> Option<String> {
    let headings: Vec<HeadingAnchor> = heading_anchors(source)
        .into_iter()
        .filter(|h| (2..=4).contains(&h.level))
        .collect();

    if headings.is_empty() {
        return None;
    }

    let mut toc = String::from("<ul class=\"toc-list\">\n");
    for heading in &headings {
        let indent = "  ".repeat((heading.level as usize).saturating_sub(2));
        toc.push_str(&format!(
            "{}<li><a href=\"#{}\">{}</a></li>\n",
            indent,
            html_escape_code(&heading.id),
            html_escape_code(&heading.text)
        ));
    }
    toc.push_str("</ul>");

    Some(toc)
}

fn slugify_heading(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
