//! Deterministic page extraction from well-structured markup.
//!
//! Content-bearing elements are first collected in document order into a
//! flat list of [`ContentElement`]s and then folded into a [`PageRecord`].

use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;
use tracing::error;

use crate::error::{ExtractError, ExtractResult};
use crate::pipeline::document::{element_text, ParsedDocument};
use crate::types::page::{ContentBlock, ExtractionMethod, PageRecord, Section};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid h1 selector"));
static META_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("valid meta selector")
});
static MAIN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main").expect("valid main selector"));
static CONTENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3, p, ul, ol, blockquote").expect("valid content selector")
});
static LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("valid li selector"));

/// A content-bearing element, reduced to its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentElement {
    /// `h2`
    Heading(String),
    /// `h3`
    Subheading(String),
    /// `p` or `blockquote`
    Paragraph(String),
    /// `ul` or `ol`: full text plus the non-empty item texts
    List { text: String, items: Vec<String> },
}

impl ContentElement {
    fn from_element(element: ElementRef<'_>) -> Option<Self> {
        let text = element_text(element);
        match element.value().name() {
            "h2" => Some(Self::Heading(text)),
            "h3" => Some(Self::Subheading(text)),
            "p" | "blockquote" => Some(Self::Paragraph(text)),
            "ul" | "ol" => {
                let items = element
                    .select(&LIST_ITEM)
                    .map(element_text)
                    .filter(|t| !t.is_empty())
                    .collect();
                Some(Self::List { text, items })
            }
            _ => None,
        }
    }

    /// Whole text of the element, as used for intro paragraphs.
    fn text(&self) -> &str {
        match self {
            Self::Heading(t) | Self::Subheading(t) | Self::Paragraph(t) => t,
            Self::List { text, .. } => text,
        }
    }
}

/// Intro paragraphs and sections accumulated so far.
#[derive(Debug, Default)]
struct Outline {
    intro: Vec<String>,
    sections: Vec<Section>,
    current: Option<Section>,
}

impl Outline {
    fn push(mut self, element: ContentElement) -> Self {
        if let ContentElement::Heading(heading) = element {
            self.flush();
            self.current = Some(Section {
                heading,
                content_blocks: Vec::new(),
            });
            return self;
        }

        let Some(section) = self.current.as_mut() else {
            let text = element.text();
            if !text.is_empty() {
                self.intro.push(text.to_string());
            }
            return self;
        };

        let block = match element {
            ContentElement::Paragraph(text) if !text.is_empty() => {
                Some(ContentBlock::Paragraph { text })
            }
            ContentElement::Subheading(text) if !text.is_empty() => {
                Some(ContentBlock::Subheading { text })
            }
            ContentElement::List { items, .. } if !items.is_empty() => {
                Some(ContentBlock::List { items })
            }
            _ => None,
        };
        if let Some(block) = block {
            section.content_blocks.push(block);
        }
        self
    }

    /// Close the open section; sections without blocks are dropped.
    fn flush(&mut self) {
        if let Some(section) = self.current.take() {
            if !section.content_blocks.is_empty() {
                self.sections.push(section);
            }
        }
    }

    fn finish(mut self) -> (Vec<String>, Vec<Section>) {
        self.flush();
        (self.intro, self.sections)
    }
}

/// Content elements under `root` in document order.
///
/// Elements nested inside an already collected paragraph, quote or list are
/// part of that element's text and are not collected again.
pub fn collect_elements(root: ElementRef<'_>) -> Vec<ContentElement> {
    let mut containers = HashSet::new();
    let mut elements = Vec::new();

    for element in root.select(&CONTENT) {
        if element.ancestors().any(|a| containers.contains(&a.id())) {
            continue;
        }
        if matches!(element.value().name(), "p" | "blockquote" | "ul" | "ol") {
            containers.insert(element.id());
        }
        if let Some(content) = ContentElement::from_element(element) {
            elements.push(content);
        }
    }
    elements
}

/// Fold collected elements into intro paragraphs and sections.
pub fn fold_elements(
    elements: impl IntoIterator<Item = ContentElement>,
) -> (Vec<String>, Vec<Section>) {
    elements
        .into_iter()
        .fold(Outline::default(), Outline::push)
        .finish()
}

fn extract_inner(markup: &str, url: &str) -> PageRecord {
    let mut doc = ParsedDocument::parse(markup);
    doc.strip_boilerplate();

    let mut record = PageRecord::new(url, ExtractionMethod::Structural);
    record.page_title = doc.first_text(&TITLE);
    record.h1 = doc.first_text(&H1);
    record.meta_description = doc.first_attr(&META_DESCRIPTION, "content");

    let Some(root) = doc.first(&MAIN).or_else(|| doc.body()) else {
        return record;
    };

    let (intro, sections) = fold_elements(collect_elements(root));
    record.intro_content = intro;
    record.content_structure = sections;
    record
}

/// Extract a [`PageRecord`] from markup.
///
/// Any unexpected failure while walking the document is returned as
/// [`ExtractError::Parse`] instead of propagating.
pub fn extract_structure(markup: &str, url: &str) -> ExtractResult<PageRecord> {
    contain_panics(url, || Ok(extract_inner(markup, url)))
}

fn contain_panics<T>(url: &str, work: impl FnOnce() -> ExtractResult<T>) -> ExtractResult<T> {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(url = %url, error = %message, "Structural extraction failed unexpectedly");
        Err(ExtractError::Parse(format!(
            "structural extractor failed unexpectedly: {message}"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_during_extraction_becomes_parse_error() {
        let result: ExtractResult<PageRecord> =
            contain_panics("https://example.com", || panic!("selector exploded"));

        match result {
            Err(ExtractError::Parse(message)) => assert!(message.contains("selector exploded")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    const PAGE: &str = r#"
<html>
<head>
  <title>  Acme   Consulting </title>
  <meta name="description" content="We   help small firms grow.">
</head>
<body>
  <header><h1>Header logo</h1></header>
  <nav><ul><li>Home</li><li>About</li></ul></nav>
  <main>
    <h1>Acme Consulting</h1>
    <p>Welcome to Acme.</p>
    <ul><li>Fast</li><li>Friendly</li></ul>
    <h2>Services</h2>
    <p>We offer <strong>strategy</strong> work.</p>
    <h3>Workshops</h3>
    <ol><li>Discovery</li><li> </li><li>Roadmap</li></ol>
    <blockquote>Great team! <p>Nested line</p></blockquote>
    <h2>Empty section</h2>
    <h2>Contact</h2>
    <ul></ul>
    <p>Call us.</p>
  </main>
  <footer><p>Imprint</p></footer>
</body>
</html>"#;

    #[test]
    fn extracts_full_outline() {
        let record = extract_structure(PAGE, "https://acme.example").unwrap();

        assert_eq!(record.url, "https://acme.example");
        assert_eq!(record.page_title, "Acme Consulting");
        assert_eq!(record.meta_description, "We help small firms grow.");
        assert_eq!(record.h1, "Acme Consulting");
        assert_eq!(record.intro_content, vec!["Welcome to Acme.", "FastFriendly"]);
        assert_eq!(record.parsing_method, ExtractionMethod::Structural);

        assert_eq!(record.content_structure.len(), 2);
        let services = &record.content_structure[0];
        assert_eq!(services.heading, "Services");
        assert_eq!(
            services.content_blocks,
            vec![
                ContentBlock::Paragraph {
                    text: "We offer strategy work.".into()
                },
                ContentBlock::Subheading {
                    text: "Workshops".into()
                },
                ContentBlock::List {
                    items: vec!["Discovery".into(), "Roadmap".into()]
                },
                ContentBlock::Paragraph {
                    text: "Great team! Nested line".into()
                },
            ]
        );

        let contact = &record.content_structure[1];
        assert_eq!(contact.heading, "Contact");
        assert_eq!(
            contact.content_blocks,
            vec![ContentBlock::Paragraph {
                text: "Call us.".into()
            }]
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = serde_json::to_string(&extract_structure(PAGE, "u").unwrap()).unwrap();
        let second = serde_json::to_string(&extract_structure(PAGE, "u").unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn falls_back_to_body_without_main() {
        let record = extract_structure(
            "<html><body><p>Intro</p><h2>A</h2><p>Text</p></body></html>",
            "u",
        )
        .unwrap();
        assert_eq!(record.intro_content, vec!["Intro"]);
        assert_eq!(record.content_structure[0].heading, "A");
    }

    #[test]
    fn empty_markup_yields_full_shape() {
        let record = extract_structure("", "https://example.com").unwrap();
        let value = serde_json::to_value(&record).unwrap();
        for key in [
            "url",
            "page_title",
            "meta_description",
            "h1",
            "intro_content",
            "content_structure",
            "parsing_method",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert!(record.is_empty());
    }

    #[test]
    fn fold_drops_every_empty_section() {
        let (intro, sections) = fold_elements(vec![
            ContentElement::Heading("One".into()),
            ContentElement::Heading("Two".into()),
            ContentElement::Paragraph("Body".into()),
            ContentElement::Heading("Three".into()),
            ContentElement::Paragraph(String::new()),
        ]);

        assert!(intro.is_empty());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Two");
    }
}
