/// 句末标点，摘要优先在这些位置截断
const SENTENCE_ENDS: [char; 6] = ['。', '？', '！', '.', '?', '!'];

/// 截断点最多向前回溯的字符数
const LOOKBACK: usize = 30;

/// 从渲染后的 HTML 中提取纯文本摘要，用于文章页的 description
pub fn extract_excerpt(html: &str, max_chars: usize) -> String {
    let plain = collapse_whitespace(&strip_html_tags(html));
    let chars: Vec<char> = plain.trim().chars().collect();
    if chars.len() <= max_chars {
        return chars.into_iter().collect();
    }

    let end = (max_chars.saturating_sub(LOOKBACK)..max_chars)
        .rev()
        .find(|&i| SENTENCE_ENDS.contains(&chars[i]))
        .map_or(max_chars, |i| i + 1);

    let mut excerpt: String = chars[..end].iter().collect();
    excerpt.push('…');
    excerpt
}

fn decode_entity(entity: &str) -> Option<char> {
    Some(match entity {
        "&amp;" => '&',
        "&lt;" => '<',
        "&gt;" => '>',
        "&quot;" => '"',
        "&#39;" | "&apos;" => '\'',
        "&nbsp;" => ' ',
        _ => return None,
    })
}

fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut entity: Option<String> = None;

    for ch in html.chars() {
        if in_tag {
            in_tag = ch != '>';
            continue;
        }
        if let Some(buf) = entity.as_mut() {
            buf.push(ch);
            if ch == ';' {
                match decode_entity(buf) {
                    Some(c) => result.push(c),
                    None => result.push_str(buf),
                }
                entity = None;
            }
            continue;
        }
        match ch {
            '<' => in_tag = true,
            '&' => entity = Some(String::from("&")),
            _ => result.push(ch),
        }
    }
    if let Some(rest) = entity {
        result.push_str(&rest);
    }
    result
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
