//! Body rendering.
//!
//! Rendering is a pure text transform applied once per document after the
//! front matter is stripped. [`Markdown`] produces HTML with pulldown-cmark;
//! [`Passthrough`] sends the body as written, for sites that render markdown
//! server-side.

use pulldown_cmark::{html, Options, Parser};

use crate::config::Config;

pub trait Renderer: Send + Sync {
    fn render(&self, body: &str) -> String;
}

pub struct Markdown;

impl Renderer for Markdown {
    fn render(&self, body: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(body, options);
        let mut out = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

pub struct Passthrough;

impl Renderer for Passthrough {
    fn render(&self, body: &str) -> String {
        body.to_string()
    }
}

pub fn renderer_for(config: &Config) -> Box<dyn Renderer> {
    if config.render.markdown {
        Box::new(Markdown)
    } else {
        Box::new(Passthrough)
    }
}
