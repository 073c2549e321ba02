//! Allow-list HTML sanitizer.
//!
//! Re-tokenizes the input with the editor's lenient tokenizer and writes back
//! only what the policy allows. Output is always well-formed: unknown end
//! tags are dropped and open elements are closed at the end.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use miette::Diagnostic;
use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_html, escape_html_body_text};
use scribe_editor_core::html::{Attribute, Token, Tokenizer, is_void_element};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use url::Url;

/// Attributes whose values are URLs and get scheme-checked.
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum SanitizeError {
    /// Policy JSON could not be decoded
    #[error("failed to read sanitize policy: {0}")]
    #[diagnostic(code(scribe::sanitize::policy))]
    Policy(#[from] serde_json::Error),

    #[error("invalid sanitize policy: {0}")]
    #[diagnostic(code(scribe::sanitize::policy::invalid))]
    InvalidPolicy(String),
}

/// What the sanitizer lets through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizePolicy {
    /// Allowed elements, each with its allowed attributes.
    pub tags: BTreeMap<String, BTreeSet<String>>,
    /// Schemes allowed in URL attributes.
    pub url_schemes: BTreeSet<String>,
    /// Whether URLs without a scheme (`/post/1`, `#top`) are kept.
    pub allow_relative_urls: bool,
    /// `rel` added to every link. Replaces any `rel` in the input.
    pub link_rel: Option<String>,
    /// Elements dropped together with their content.
    pub clean_content_tags: BTreeSet<String>,
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        let mut tags = BTreeMap::new();
        for tag in [
            "p", "br", "b", "strong", "i", "em", "u", "ins", "h1", "h2", "h3", "h4", "h5", "h6",
            "ul", "ol", "li", "blockquote", "pre", "code", "hr",
        ] {
            tags.insert(tag.to_string(), BTreeSet::new());
        }
        tags.insert("a".to_string(), set(&["href", "title"]));
        tags.insert("img".to_string(), set(&["src", "alt", "title"]));

        Self {
            tags,
            url_schemes: set(&["http", "https", "mailto"]),
            allow_relative_urls: true,
            link_rel: Some("noopener noreferrer".to_string()),
            clean_content_tags: set(&[
                "script", "style", "iframe", "object", "embed", "template", "noscript", "textarea",
                "title",
            ]),
        }
    }
}

impl SanitizePolicy {
    /// Decode and validate a JSON policy. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SanitizeError> {
        let policy: Self = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), SanitizeError> {
        if let Some(tag) = self
            .clean_content_tags
            .iter()
            .find(|tag| self.tags.contains_key(*tag))
        {
            return Err(SanitizeError::InvalidPolicy(format!(
                "`{tag}` is both allowed and content-dropped"
            )));
        }
        if let Some(tag) = self.tags.keys().find(|tag| *tag != &tag.to_ascii_lowercase()) {
            return Err(SanitizeError::InvalidPolicy(format!(
                "tag names must be lowercase, got `{tag}`"
            )));
        }
        Ok(())
    }

    fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    fn allows_attribute(&self, tag: &str, attr: &str) -> bool {
        self.tags.get(tag).is_some_and(|attrs| attrs.contains(attr))
    }

    /// Whether a URL attribute value may be kept.
    pub fn allows_url(&self, value: &str) -> bool {
        match Url::parse(value.trim()) {
            Ok(url) => self.url_schemes.contains(url.scheme()),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.allow_relative_urls,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    policy: SanitizePolicy,
}

impl Sanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SanitizePolicy {
        &self.policy
    }

    /// Sanitize an HTML fragment.
    pub fn clean(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        // Writing into a String cannot fail.
        let _ = self.clean_to(FmtWriter(&mut out), html);
        out
    }

    /// Sanitize into any writer.
    pub fn clean_to<W: StrWrite>(&self, mut w: W, html: &str) -> Result<(), W::Error> {
        let mut open: Vec<SmolStr> = Vec::new();
        let mut skip: Option<(SmolStr, usize)> = None;

        for token in Tokenizer::new(html) {
            if let Some((tag, depth)) = &mut skip {
                match &token {
                    Token::StartTag {
                        name, self_closing, ..
                    } if name == tag && !self_closing => *depth += 1,
                    Token::EndTag { name } if name == tag => *depth -= 1,
                    _ => {}
                }
                if *depth == 0 {
                    skip = None;
                }
                continue;
            }

            match token {
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    if self.policy.clean_content_tags.contains(name.as_str()) {
                        tracing::debug!(tag = %name, "dropping element with content");
                        if !self_closing && !is_void_element(&name) {
                            skip = Some((name, 1));
                        }
                        continue;
                    }
                    if !self.policy.allows_tag(&name) {
                        tracing::trace!(tag = %name, "unwrapping disallowed element");
                        continue;
                    }
                    self.write_start_tag(&mut w, &name, &attrs)?;
                    if !is_void_element(&name) {
                        open.push(name);
                    }
                }
                Token::EndTag { name } => {
                    let Some(pos) = open.iter().rposition(|tag| *tag == name) else {
                        continue;
                    };
                    for tag in open.drain(pos..).rev() {
                        write_end_tag(&mut w, &tag)?;
                    }
                }
                Token::Text(text) => escape_html_body_text(&mut w, &text)?,
                Token::Comment(_) | Token::Declaration(_) => {}
            }
        }

        for tag in open.iter().rev() {
            write_end_tag(&mut w, tag)?;
        }
        Ok(())
    }

    fn write_start_tag<W: StrWrite>(
        &self,
        w: &mut W,
        name: &str,
        attrs: &[Attribute],
    ) -> Result<(), W::Error> {
        let link_rel = if name == "a" {
            self.policy.link_rel.as_deref()
        } else {
            None
        };

        w.write_str("<")?;
        w.write_str(name)?;
        let mut written: Vec<&str> = Vec::new();
        for attr in attrs {
            let attr_name = attr.name.as_str();
            if written.contains(&attr_name) || !self.policy.allows_attribute(name, attr_name) {
                continue;
            }
            if link_rel.is_some() && attr_name == "rel" {
                continue;
            }
            if URL_ATTRIBUTES.contains(&attr_name) && !self.policy.allows_url(&attr.value) {
                tracing::debug!(attr = attr_name, value = %attr.value, "dropping disallowed url");
                continue;
            }
            write_attribute(w, attr_name, &attr.value)?;
            written.push(attr_name);
        }
        if let Some(rel) = link_rel {
            write_attribute(w, "rel", rel)?;
        }
        w.write_str(">")
    }
}

fn write_attribute<W: StrWrite>(w: &mut W, name: &str, value: &str) -> Result<(), W::Error> {
    w.write_str(" ")?;
    w.write_str(name)?;
    w.write_str("=\"")?;
    escape_html(&mut *w, value)?;
    w.write_str("\"")
}

fn write_end_tag<W: StrWrite>(w: &mut W, name: &str) -> Result<(), W::Error> {
    w.write_str("</")?;
    w.write_str(name)?;
    w.write_str(">")
}

/// Sanitize with the default policy.
pub fn sanitize(html: &str) -> String {
    static DEFAULT: OnceLock<Sanitizer> = OnceLock::new();
    DEFAULT.get_or_init(Sanitizer::default).clean(html)
}
