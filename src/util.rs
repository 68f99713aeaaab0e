use lazy_static::lazy_static;
use regex::Regex;

use crate::param::STATUS_CODES;

lazy_static! {
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9\s\-_]+").unwrap();
    static ref SLUG_GAPS: Regex = Regex::new(r"[\s\-_]+").unwrap();
}

/// 生成简单的错误页
pub struct HtmlBuilder {
    title: String,
    css: String,
    body: String,
}

impl HtmlBuilder {
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let title = format!("{}", code);
        let css = r"
            body {
                width: 35em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }
            "
        .to_string();
        let description = note
            .or_else(|| STATUS_CODES.get(&code).copied())
            .unwrap_or("Unknown Status");
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code, description
        );
        Self { title, css, body }
    }

    pub fn build(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>{}</style>
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.title, self.css, self.body
        )
    }
}

/// 把标题转换为 URL 友好的片段：`"Hello, World!"` → `"hello-world"`
pub fn url_title(title: &str, separator: char) -> String {
    let lower = title.to_lowercase();
    let cleaned = NON_SLUG.replace_all(&lower, "");
    let joined = SLUG_GAPS.replace_all(&cleaned, separator.to_string().as_str());
    joined.trim_matches(separator).to_string()
}

/// 把 URI 拼接到站点基础路径上，保证恰好一个斜杠
pub fn site_url(base: &str, uri: &str) -> String {
    let base = base.trim_end_matches('/');
    let uri = uri.trim_start_matches('/');
    if uri.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, uri)
    }
}

/// 截取前 `limit` 个单词，被截断时追加 `end_char`
pub fn limit_words(text: &str, limit: usize, end_char: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return words.join(" ");
    }
    format!("{}{}", words[..limit].join(" "), end_char)
}
