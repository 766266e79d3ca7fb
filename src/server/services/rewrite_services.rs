use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::Context;
use lol_html::errors::{AttributeNameError, RewritingError};
use lol_html::html_content::{ContentType, Element, EndTag};
use lol_html::{HandlerResult, RewriteStrSettings, Selector, element, rewrite_str, text};
use tracing::{debug, warn};

use crate::profile::{DenyList, ProxyProfile};

// stamped on text rule candidates by the first pass and always stripped by the second
const MARK_ATTR: &str = "data-embed-proxy-mark";
const MARK_SELECTOR: &str = "[data-embed-proxy-mark]";

#[derive(Debug, Clone)]
pub enum Predicate {
    Always,
    AttrContainsAny { attr: String, needles: Vec<String> },
    /// any attribute at all, covers data-src, srcset, inline handlers and style
    AnyAttrContainsAny { needles: Vec<String> },
    AttrStartsWithAny { attr: String, prefixes: Vec<String> },
    AttrEqualsIgnoreCase { attr: String, values: Vec<String> },
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, el: &Element<'_, '_>) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::AttrContainsAny { attr, needles } => el
                .get_attribute(attr)
                .is_some_and(|value| needles.iter().any(|n| value.contains(n.as_str()))),
            Predicate::AnyAttrContainsAny { needles } => el.attributes().iter().any(|attr| {
                let value = attr.value();
                needles.iter().any(|n| value.contains(n.as_str()))
            }),
            Predicate::AttrStartsWithAny { attr, prefixes } => el
                .get_attribute(attr)
                .is_some_and(|value| prefixes.iter().any(|p| value.starts_with(p.as_str()))),
            Predicate::AttrEqualsIgnoreCase { attr, values } => {
                el.get_attribute(attr).is_some_and(|value| {
                    values.iter().any(|v| value.trim().eq_ignore_ascii_case(v))
                })
            }
            Predicate::All(predicates) => predicates.iter().all(|p| p.matches(el)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Remove,
    SetAttribute { attr: String, value: String },
}

impl Action {
    fn apply(&self, el: &mut Element<'_, '_>) -> Result<(), AttributeNameError> {
        match self {
            Action::Remove => el.remove(),
            Action::SetAttribute { attr, value } => el.set_attribute(attr, value)?,
        }
        Ok(())
    }
}

/// one (selector, predicate, action) step, rules run in the order they are listed
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: String,
    pub selector: String,
    pub predicate: Predicate,
    pub action: Action,
}

impl RewriteRule {
    pub fn new(name: &str, selector: &str, predicate: Predicate, action: Action) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            predicate,
            action,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TextCheck {
    /// deny list domains, inline markers and guarded markers
    InlineDeny,
    /// deny list domains only, for raw text that isn't script
    DeniedDomain,
    Contains(String),
}

/// removes elements by what they contain rather than by their attributes
#[derive(Debug, Clone)]
pub struct TextRule {
    pub selector: String,
    pub check: TextCheck,
}

impl TextRule {
    fn flags(&self, text: &str, deny_list: &DenyList) -> bool {
        match &self.check {
            TextCheck::InlineDeny => deny_list.inline_denied(text),
            TextCheck::DeniedDomain => deny_list.domain_denied(text),
            TextCheck::Contains(needle) => text.contains(needle.as_str()),
        }
    }
}

/// strips ad and anti adblock markup and drops the bypass block in
///
/// never fails, anything lol_html can't handle falls back to the untouched input with the
/// injection still added
pub struct PageRewriter {
    rules: Vec<RewriteRule>,
    text_rules: Vec<TextRule>,
    deny_list: DenyList,
    injection: String,
}

impl PageRewriter {
    pub fn new(
        rules: Vec<RewriteRule>,
        text_rules: Vec<TextRule>,
        deny_list: DenyList,
        injection: String,
    ) -> anyhow::Result<Self> {
        // element!/text! unwrap the selector parse, so everything gets checked here instead
        let selectors = rules
            .iter()
            .map(|rule| rule.selector.as_str())
            .chain(text_rules.iter().map(|rule| rule.selector.as_str()));
        for selector in selectors {
            selector
                .parse::<Selector>()
                .with_context(|| format!("invalid rewrite selector: {}", selector))?;
        }

        Ok(Self {
            rules,
            text_rules,
            deny_list,
            injection,
        })
    }

    pub fn from_profile(profile: &ProxyProfile, injection: String) -> anyhow::Result<Self> {
        Self::new(
            Self::profile_rules(profile),
            Self::profile_text_rules(profile),
            profile.deny_list.clone(),
            injection,
        )
    }

    /// deny list, broken css, pinned/broken scripts, frame blocking meta. order matters: a pinned
    /// script no longer starts with its broken prefix by the time the broken script rule looks
    pub fn profile_rules(profile: &ProxyProfile) -> Vec<RewriteRule> {
        let deny = &profile.deny_list;
        let fixes = &profile.resource_fixes;

        // challenge paths only ever mean the cloudflare challenge script, /cdn-cgi/ also serves
        // resized images and email protection links that have to stay
        let mut rules = vec![
            RewriteRule::new(
                "denied-domain",
                "*",
                Predicate::AnyAttrContainsAny {
                    needles: non_empty(&deny.domains),
                },
                Action::Remove,
            ),
            RewriteRule::new(
                "challenge-script",
                "script[src]",
                Predicate::AttrContainsAny {
                    attr: "src".to_string(),
                    needles: non_empty(&deny.challenge_paths),
                },
                Action::Remove,
            ),
        ];

        for selector in &deny.banner_selectors {
            rules.push(RewriteRule::new(
                "adblock-banner",
                selector,
                Predicate::Always,
                Action::Remove,
            ));
        }

        rules.push(RewriteRule::new(
            "broken-css",
            "link[href]",
            Predicate::AttrStartsWithAny {
                attr: "href".to_string(),
                prefixes: non_empty(&fixes.broken_css_prefixes),
            },
            Action::Remove,
        ));

        for pin in &fixes.script_pins {
            rules.push(RewriteRule::new(
                "pinned-script",
                "script[src]",
                Predicate::All(vec![
                    Predicate::AttrStartsWithAny {
                        attr: "src".to_string(),
                        prefixes: vec![pin.path_prefix.clone()],
                    },
                    Predicate::AttrContainsAny {
                        attr: "src".to_string(),
                        needles: vec![pin.needle.clone()],
                    },
                ]),
                Action::SetAttribute {
                    attr: "src".to_string(),
                    value: pin.cdn_url.clone(),
                },
            ));
        }

        rules.push(RewriteRule::new(
            "broken-script",
            "script[src]",
            Predicate::AttrStartsWithAny {
                attr: "src".to_string(),
                prefixes: non_empty(&fixes.broken_script_prefixes),
            },
            Action::Remove,
        ));

        rules.push(RewriteRule::new(
            "frame-options-meta",
            "meta[http-equiv]",
            Predicate::AttrEqualsIgnoreCase {
                attr: "http-equiv".to_string(),
                values: vec!["x-frame-options".to_string()],
            },
            Action::Remove,
        ));
        rules.push(RewriteRule::new(
            "frame-ancestors-meta",
            "meta[http-equiv]",
            Predicate::All(vec![
                Predicate::AttrEqualsIgnoreCase {
                    attr: "http-equiv".to_string(),
                    values: vec!["content-security-policy".to_string()],
                },
                Predicate::AttrContainsAny {
                    attr: "content".to_string(),
                    needles: vec!["frame-ancestors".to_string()],
                },
            ]),
            Action::Remove,
        ));

        rules
    }

    pub fn profile_text_rules(profile: &ProxyProfile) -> Vec<TextRule> {
        // style and noscript are raw text to the parser, so markup inside them never reaches
        // the attribute rules
        let mut text_rules = vec![
            TextRule {
                selector: "script".to_string(),
                check: TextCheck::InlineDeny,
            },
            TextRule {
                selector: "style".to_string(),
                check: TextCheck::DeniedDomain,
            },
            TextRule {
                selector: "noscript".to_string(),
                check: TextCheck::DeniedDomain,
            },
        ];

        for banner in &profile.deny_list.banner_texts {
            text_rules.push(TextRule {
                selector: banner.selector.clone(),
                check: TextCheck::Contains(banner.text.clone()),
            });
        }

        text_rules
    }

    pub fn injection(&self) -> &str {
        &self.injection
    }

    /// strips, then injects inside the same pass: before the </head> end tag, else right after
    /// the <body> start tag. pages with neither (or that lol_html rejects) get the block in front
    pub fn rewrite(&self, html: &str) -> String {
        match self.strip(html) {
            Ok((stripped, true)) => stripped,
            Ok((stripped, false)) => format!("{}{}", self.injection, stripped),
            Err(e) => {
                warn!("html rewrite failed, serving the page untouched: {}", e);
                format!("{}{}", self.injection, html)
            }
        }
    }

    fn strip(&self, html: &str) -> Result<(String, bool), RewritingError> {
        if self.text_rules.is_empty() {
            return self.apply_rules(html, &HashSet::new());
        }

        let (marked, flagged) = self.mark_text_candidates(html)?;
        debug!("{} element(s) flagged by their content", flagged.len());

        self.apply_rules(&marked, &flagged)
    }

    /// first pass, stamps every text rule candidate with an id and collects its text. the id
    /// survives into the second pass as an attribute so nothing depends on visit order
    fn mark_text_candidates(
        &self,
        html: &str,
    ) -> Result<(String, HashSet<usize>), RewritingError> {
        let next_id = Cell::new(0usize);
        let collected: Vec<RefCell<Vec<(usize, String)>>> = self
            .text_rules
            .iter()
            .map(|_| RefCell::new(Vec::new()))
            .collect();

        let mut handlers = Vec::with_capacity(self.text_rules.len() * 2 + 1);

        // a page can't bring its own marks
        handlers.push(element!(MARK_SELECTOR, |el| {
            el.remove_attribute(MARK_ATTR);
            Ok(())
        }));

        for (rule, texts) in self.text_rules.iter().zip(collected.iter()) {
            let next_id = &next_id;

            handlers.push(element!(rule.selector.as_str(), move |el| {
                let id = match el
                    .get_attribute(MARK_ATTR)
                    .and_then(|value| value.parse::<usize>().ok())
                {
                    Some(id) => id,
                    None => {
                        let id = next_id.get();
                        next_id.set(id + 1);
                        el.set_attribute(MARK_ATTR, &id.to_string())?;
                        id
                    }
                };
                texts.borrow_mut().push((id, String::new()));
                Ok(())
            }));

            handlers.push(text!(rule.selector.as_str(), move |chunk| {
                if let Some((_, buffer)) = texts.borrow_mut().last_mut() {
                    buffer.push_str(chunk.as_str());
                }
                Ok(())
            }));
        }

        let marked = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                ..RewriteStrSettings::new()
            },
        )?;

        let mut flagged = HashSet::new();
        for (rule, texts) in self.text_rules.iter().zip(collected.iter()) {
            for (id, text) in texts.borrow().iter() {
                if rule.flags(text, &self.deny_list) {
                    flagged.insert(*id);
                }
            }
        }

        Ok((marked, flagged))
    }

    /// second pass, returns the page and whether the injection went in
    fn apply_rules(
        &self,
        html: &str,
        flagged: &HashSet<usize>,
    ) -> Result<(String, bool), RewritingError> {
        // end tag handlers have to be 'static, hence the rc
        let injected = Rc::new(Cell::new(false));
        let mut handlers = Vec::with_capacity(self.rules.len() + 3);

        handlers.push(element!(MARK_SELECTOR, move |el| {
            let hit = el
                .get_attribute(MARK_ATTR)
                .and_then(|value| value.parse::<usize>().ok())
                .is_some_and(|id| flagged.contains(&id));
            el.remove_attribute(MARK_ATTR);
            if hit {
                debug!("removing <{}> flagged by its content", el.tag_name());
                el.remove();
            }
            Ok(())
        }));

        for rule in &self.rules {
            handlers.push(element!(rule.selector.as_str(), move |el| {
                if el.removed() || !rule.predicate.matches(el) {
                    return Ok(());
                }
                debug!("rule {} hit <{}>", rule.name, el.tag_name());
                rule.action.apply(el)?;
                Ok(())
            }));
        }

        // registered after the rules so a removed head/body is already known. lol_html skips end
        // tag handlers of implicitly closed elements, the body fallback covers that
        let head_injected = Rc::clone(&injected);
        let head_injection = self.injection.clone();
        handlers.push(element!("head", move |el: &mut Element<'_, '_>| {
            if el.removed() || head_injected.get() {
                return Ok(());
            }
            let injected = Rc::clone(&head_injected);
            let injection = head_injection.clone();
            el.on_end_tag(Box::new(move |end: &mut EndTag<'_>| -> HandlerResult {
                if !injected.get() {
                    end.before(&injection, ContentType::Html);
                    injected.set(true);
                }
                Ok(())
            }))
        }));

        let body_injected = Rc::clone(&injected);
        handlers.push(element!("body", move |el: &mut Element<'_, '_>| {
            if el.removed() || body_injected.get() {
                return Ok(());
            }
            el.prepend(&self.injection, ContentType::Html);
            body_injected.set(true);
            Ok(())
        }));

        let output = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                ..RewriteStrSettings::new()
            },
        )?;

        Ok((output, injected.get()))
    }
}

fn non_empty(values: &[String]) -> Vec<String> {
    values.iter().filter(|v| !v.is_empty()).cloned().collect()
}
