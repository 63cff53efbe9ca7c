use askama::Template;
use pulldown_cmark::{html, Options, Parser};

/// Convert markdown text to HTML
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    // Raw HTML from users is shown as text, never rendered
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        pulldown_cmark::Event::Html(text) => pulldown_cmark::Event::Text(text),
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

/// Python strategy skeleton; the blocks arrive pre-indented
#[derive(Template)]
#[template(path = "strategy_template.py", escape = "none")]
pub struct StrategyTemplate {
    pub strategy_name: String,
    pub class_name: String,
    pub timeframe: String,
    pub startup_candle_count: u32,
    pub indicator_block: String,
    pub entry_block: String,
    pub exit_block: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html("**Order** rejected:\n\n- step one\n- step two");
        assert!(html.contains("<strong>Order</strong>"));
        assert!(html.contains("<li>step one</li>"));
    }

    #[test]
    fn test_markdown_escapes_raw_html() {
        let html = markdown_to_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
