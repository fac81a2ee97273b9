//! One-shot inline markup helpers.
//!
//! Each function builds a throwaway fragment and returns its markup, for
//! callers that only need a snippet inside a larger string.

use crate::html5::{Element, Html5};
use crate::markup::OutputMode;

fn snippet(build: impl FnOnce(&mut Element<'_>)) -> String {
    let mut sub = Html5::create_sub(OutputMode::Html);
    build(&mut sub.root());
    sub.render_compact()
}

macro_rules! phrasing {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(content: &str) -> String {
                snippet(|root| {
                    root.$name(content);
                })
            }
        )*
    };
}

phrasing!(
    em, strong, small, s, cite, code, var, samp, kbd, sub, sup, i, b, u, mark, span, ruby, rt,
    rp
);

pub fn a(content: &str, href: &str) -> String {
    snippet(|root| {
        root.a(content, href);
    })
}

pub fn q(content: &str, cite: Option<&str>) -> String {
    snippet(|root| {
        root.q(content, cite);
    })
}

pub fn dfn(content: &str, title: Option<&str>) -> String {
    snippet(|root| {
        root.dfn(content, title);
    })
}

pub fn abbr(content: &str, title: Option<&str>) -> String {
    snippet(|root| {
        root.abbr(content, title);
    })
}

pub fn data(content: &str, value: Option<&str>) -> String {
    snippet(|root| {
        root.data(content, value);
    })
}

pub fn time(content: &str, datetime: Option<&str>) -> String {
    snippet(|root| {
        root.time(content, datetime);
    })
}

pub fn bdi(content: &str, dir: Option<&str>) -> String {
    snippet(|root| {
        root.bdi(content, dir);
    })
}

pub fn bdo(content: &str, dir: Option<&str>) -> String {
    snippet(|root| {
        root.bdo(content, dir);
    })
}

pub fn ins(content: &str, datetime: Option<&str>, cite: Option<&str>) -> String {
    snippet(|root| {
        root.ins(content, datetime, cite);
    })
}

pub fn del(content: &str, datetime: Option<&str>, cite: Option<&str>) -> String {
    snippet(|root| {
        root.del(content, datetime, cite);
    })
}

pub fn br() -> String {
    snippet(|root| {
        root.br();
    })
}

pub fn wbr() -> String {
    snippet(|root| {
        root.wbr();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_snippets() {
        assert_eq!(a("Home", "/"), "<a href=\"/\">Home</a>");
        assert_eq!(em("really"), "<em>really</em>");
        assert_eq!(kbd("Ctrl"), "<kbd>Ctrl</kbd>");
        assert_eq!(br(), "<br>");
        assert_eq!(
            abbr("ISO", Some("International Organization for Standardization")),
            "<abbr title=\"International Organization for Standardization\">ISO</abbr>"
        );
        assert_eq!(time("today", None), "<time>today</time>");
        assert_eq!(
            ins("new", Some("2015-10-01"), None),
            "<ins datetime=\"2015-10-01\">new</ins>"
        );
    }

    #[test]
    fn ruby_annotations() {
        assert_eq!(ruby("漢"), "<ruby>漢</ruby>");
        assert_eq!(rt("kan"), "<rt>kan</rt>");
        assert_eq!(rp("("), "<rp>(</rp>");
    }

    #[test]
    fn snippet_content_is_escaped() {
        assert_eq!(code("a<b"), "<code>a&lt;b</code>");
    }
}
