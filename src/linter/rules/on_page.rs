//! On-page content rules: titles, meta descriptions, headings, images.

use crate::linter::rules::{first_attr, first_text, inside_svg, select};
use crate::linter::{Category, Registry, Rule, Severity, Tag};

pub(crate) fn register(reg: &mut Registry) {
    reg.register(Rule {
        id: "missing-title",
        name: "Title tag is missing",
        severity: Severity::Critical,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| {
            if select(&ctx.doc, "head title").is_empty() {
                vec![String::new()]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "empty-title",
        name: "Title tag is empty",
        severity: Severity::Critical,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| match first_text(&ctx.doc, "head title") {
            Some(title) if title.is_empty() => vec![String::new()],
            _ => Vec::new(),
        },
    });

    reg.register(Rule {
        id: "multiple-titles",
        name: "Multiple title tags",
        severity: Severity::High,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| {
            let count = select(&ctx.doc, "title")
                .iter()
                .filter(|el| !inside_svg(el))
                .count();
            if count > 1 {
                vec![format!("Found {} title tags", count)]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "title-outside-head",
        name: "Title tag outside of head",
        severity: Severity::Critical,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| {
            select(&ctx.doc, "body title")
                .iter()
                .filter(|el| !inside_svg(el))
                .map(|_| String::new())
                .collect()
        },
    });

    reg.register(Rule {
        id: "empty-html",
        name: "HTML is missing or empty",
        severity: Severity::Critical,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| match first_text(&ctx.doc, "body") {
            Some(text) if !text.is_empty() => Vec::new(),
            _ => vec![String::new()],
        },
    });

    reg.register(Rule {
        id: "short-title",
        name: "Title tag length too short",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            let title = first_text(&ctx.doc, "head title").unwrap_or_default();
            if !title.is_empty() && title.len() < 40 {
                vec![format!("{} chars: {}", title.len(), title)]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "long-title",
        name: "Title tag length too long",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            let title = first_text(&ctx.doc, "head title").unwrap_or_default();
            if title.len() > 60 {
                vec![format!("{} chars: {}", title.len(), title)]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "meta-description-outside-head",
        name: "Meta description outside of head",
        severity: Severity::High,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| {
            if select(&ctx.doc, r#"body meta[name="description"]"#).is_empty() {
                Vec::new()
            } else {
                vec![String::new()]
            }
        },
    });

    reg.register(Rule {
        id: "meta-description-empty",
        name: "Meta description is empty",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            match first_attr(&ctx.doc, r#"head meta[name="description"]"#, "content") {
                Some(content) if content.trim().is_empty() => vec![String::new()],
                _ => Vec::new(),
            }
        },
    });

    reg.register(Rule {
        id: "multiple-meta-descriptions",
        name: "Multiple meta descriptions",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| {
            let count = select(&ctx.doc, r#"head meta[name="description"]"#).len();
            if count > 1 {
                vec![format!("Found {} meta descriptions", count)]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "meta-description-too-short",
        name: "Meta description length too short",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            match first_attr(&ctx.doc, r#"head meta[name="description"]"#, "content") {
                Some(content) if !content.trim().is_empty() && content.len() < 110 => {
                    vec![format!("{} characters", content.len())]
                }
                _ => Vec::new(),
            }
        },
    });

    reg.register(Rule {
        id: "meta-description-too-long",
        name: "Meta description length too long",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            match first_attr(&ctx.doc, r#"head meta[name="description"]"#, "content") {
                Some(content) if content.len() > 320 => {
                    vec![format!("{} characters", content.len())]
                }
                _ => Vec::new(),
            }
        },
    });

    reg.register(Rule {
        id: "title-description-same",
        name: "Title and meta description are the same",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            let title = first_text(&ctx.doc, "head title").unwrap_or_default();
            let Some(desc) = first_attr(&ctx.doc, r#"head meta[name="description"]"#, "content")
            else {
                return Vec::new();
            };
            let desc = desc.trim();
            if !title.is_empty() && !desc.is_empty() && title == desc {
                vec![title]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "missing-h1",
        name: "H1 tag is missing",
        severity: Severity::Medium,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            if select(&ctx.doc, "h1").is_empty() {
                vec![String::new()]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "multiple-h1",
        name: "Multiple H1 tags",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::PotentialIssue,
        check: |ctx| {
            let count = select(&ctx.doc, "h1").len();
            if count > 1 {
                vec![format!("Found {} H1 tags", count)]
            } else {
                Vec::new()
            }
        },
    });

    reg.register(Rule {
        id: "short-h1",
        name: "H1 length too short",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            select(&ctx.doc, "h1")
                .iter()
                .filter_map(|el| {
                    let text = el.text().collect::<String>().trim().to_string();
                    let words = text.split_whitespace().count();
                    if words > 0 && words < 3 {
                        Some(format!("{} words: {}", words, text))
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "long-h1",
        name: "H1 length too long",
        severity: Severity::Low,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            select(&ctx.doc, "h1")
                .iter()
                .filter_map(|el| {
                    let text = el.text().collect::<String>().trim().to_string();
                    let words = text.split_whitespace().count();
                    if words > 10 {
                        Some(format!("{} words: {}", words, text))
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "missing-alt",
        name: "Image with missing alt text",
        severity: Severity::Medium,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            select(&ctx.doc, "img")
                .iter()
                .filter_map(|img| {
                    // Decorative images are exempt.
                    if img.value().attr("role") == Some("presentation") {
                        return None;
                    }
                    let alt = img.value().attr("alt").unwrap_or("");
                    if alt.trim().is_empty() {
                        Some(img.value().attr("src").unwrap_or("").to_string())
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "short-alt-text",
        name: "Image alt text too short",
        severity: Severity::High,
        category: Category::OnPage,
        tag: Tag::Opportunity,
        check: |ctx| {
            select(&ctx.doc, "img[alt]")
                .iter()
                .filter_map(|img| {
                    let alt = img.value().attr("alt").unwrap_or("").trim().to_string();
                    if !alt.is_empty() && alt.len() < 10 {
                        Some(alt)
                    } else {
                        None
                    }
                })
                .collect()
        },
    });

    reg.register(Rule {
        id: "lorem-ipsum",
        name: "Contains Lorem Ipsum dummy text",
        severity: Severity::Medium,
        category: Category::OnPage,
        tag: Tag::Issue,
        check: |ctx| {
            let body = first_text(&ctx.doc, "body").unwrap_or_default();
            if body.to_lowercase().contains("lorem ipsum") {
                vec![String::new()]
            } else {
                Vec::new()
            }
        },
    });
}
