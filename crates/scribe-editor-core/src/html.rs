//! HTML fragment codec for the document model.
//!
//! - `Tokenizer`: a lenient HTML tokenizer, shared with the sanitizer
//! - `parse`: builds a `RichDocument` from a fragment, unwrapping markup the
//!   model cannot represent
//! - `serialize`: writes the canonical, always well-formed fragment

use std::borrow::Cow;
use std::ops::Range;

use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_html, escape_html_body_text};
use smol_str::SmolStr;

use crate::document::RichDocument;
use crate::types::{BlockKind, ListKind, Mark, MarkSpan, NBSP, SOFT_BREAK};

// === Tokenizer ===

/// An attribute on a start tag. Names are lowercased, values decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag {
        name: SmolStr,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: SmolStr,
    },
    /// Character data with references decoded. Raw text elements
    /// (`script`, `style`, ...) yield their content undecoded.
    Text(Cow<'a, str>),
    Comment(&'a str),
    /// `<!DOCTYPE ...>`, `<?...>` and other markup declarations.
    Declaration(&'a str),
}

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title", "xmp"];

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Lenient tokenizer over an HTML fragment. Malformed markup degrades to
/// text rather than failing.
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    raw_text_end: Option<SmolStr>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            raw_text_end: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn raw_text(&mut self, tag: &str) -> Option<Token<'a>> {
        let rest = self.rest();
        let needle = format!("</{tag}");
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(Token::Text(Cow::Borrowed(&rest[..end])))
    }

    fn text(&mut self) -> Token<'a> {
        let rest = self.rest();
        // A '<' that did not start markup is plain text.
        let skip = usize::from(rest.starts_with('<'));
        let end = rest[skip..].find('<').map_or(rest.len(), |i| i + skip);
        self.pos += end;
        Token::Text(decode_entities(&rest[..end]))
    }

    fn until(&mut self, start: usize, terminator: &str) -> &'a str {
        let rest = self.rest();
        match rest[start..].find(terminator) {
            Some(i) => {
                self.pos += start + i + terminator.len();
                &rest[start..start + i]
            }
            None => {
                self.pos += rest.len();
                &rest[start..]
            }
        }
    }

    fn end_tag(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        let name_len = tag_name_len(&rest[2..]);
        if name_len == 0 {
            return None;
        }
        let name = SmolStr::new(rest[2..2 + name_len].to_ascii_lowercase());
        self.until(2 + name_len, ">");
        Some(Token::EndTag { name })
    }

    fn start_tag(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        let name_len = tag_name_len(&rest[1..]);
        if name_len == 0 {
            return None;
        }
        let name = SmolStr::new(rest[1..1 + name_len].to_ascii_lowercase());
        let bytes = rest.as_bytes();
        let mut i = 1 + name_len;
        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    i += 1;
                    if bytes.get(i) == Some(&b'>') {
                        self_closing = true;
                        i += 1;
                        break;
                    }
                    continue;
                }
                _ => {}
            }

            let name_start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let attr_name = rest[name_start..i].to_ascii_lowercase();
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            let mut value = String::new();
            if bytes.get(i) == Some(&b'=') {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                match bytes.get(i) {
                    Some(&quote) if quote == b'"' || quote == b'\'' => {
                        let value_start = i + 1;
                        let value_end = rest[value_start..]
                            .find(quote as char)
                            .map_or(rest.len(), |j| value_start + j);
                        value = decode_entities(&rest[value_start..value_end]).into_owned();
                        i = (value_end + 1).min(rest.len());
                    }
                    Some(_) => {
                        let value_start = i;
                        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>'
                        {
                            i += 1;
                        }
                        value = decode_entities(&rest[value_start..i]).into_owned();
                    }
                    None => {}
                }
            }
            if !attr_name.is_empty() {
                attrs.push(Attribute {
                    name: attr_name.into(),
                    value,
                });
            }
        }

        self.pos += i;
        if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text_end = Some(name.clone());
        }
        Some(Token::StartTag {
            name,
            attrs,
            self_closing,
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(tag) = self.raw_text_end.take() {
            if let Some(token) = self.raw_text(&tag) {
                return Some(token);
            }
        }
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        if rest.starts_with("<!--") {
            return Some(Token::Comment(self.until(4, "-->")));
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            return Some(Token::Declaration(self.until(2, ">")));
        }
        if rest.starts_with("</") {
            if let Some(token) = self.end_tag() {
                return Some(token);
            }
        } else if rest.starts_with('<') {
            if let Some(token) = self.start_tag() {
                return Some(token);
            }
        }
        Some(self.text())
    }
}

fn tag_name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b':'))
        .count()
}

/// Decode character references. Unknown references are left as written.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 32)
            .and_then(|semi| decode_reference(&rest[1..1 + semi]).map(|c| (c, semi + 2)));
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'));
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(NBSP),
        _ => None,
    }
}

// === Parsing ===

/// Parse an HTML fragment into the document model.
pub fn parse(html: &str) -> RichDocument {
    let mut builder = DocumentBuilder::default();
    for token in Tokenizer::new(html) {
        builder.token(token);
    }
    builder.finish()
}

/// Elements dropped together with their content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "template", "noscript", "head", "title"];

struct OpenInline {
    tag: SmolStr,
    marks: Vec<Mark>,
    start: usize,
}

#[derive(Default)]
struct DocumentBuilder {
    text: String,
    len: usize,
    blocks: Vec<BlockKind>,
    block_start: usize,
    in_block: bool,
    inline: Vec<OpenInline>,
    marks: Vec<MarkSpan>,
    lists: Vec<ListKind>,
    skip: Option<(SmolStr, usize)>,
}

impl DocumentBuilder {
    fn token(&mut self, token: Token<'_>) {
        if let Some((tag, depth)) = &mut self.skip {
            match &token {
                Token::StartTag {
                    name, self_closing, ..
                } if name == tag && !self_closing => *depth += 1,
                Token::EndTag { name } if name == tag => *depth -= 1,
                _ => {}
            }
            if *depth == 0 {
                self.skip = None;
            }
            return;
        }

        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.start_tag(name, &attrs, self_closing),
            Token::EndTag { name } => self.end_tag(&name),
            Token::Text(text) => self.push_text(&text),
            Token::Comment(_) | Token::Declaration(_) => {}
        }
    }

    fn start_tag(&mut self, name: SmolStr, attrs: &[Attribute], self_closing: bool) {
        match name.as_str() {
            "p" | "div" | "blockquote" | "pre" | "section" | "article" | "header" | "footer" => {
                // `<li><p>..</p></li>` stays a list item.
                let empty_list_item = self.in_block
                    && self.len == self.block_start
                    && matches!(self.blocks.last(), Some(BlockKind::ListItem(_)));
                if !empty_list_item {
                    self.begin_block(BlockKind::Paragraph);
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name.as_bytes()[1] - b'0';
                self.begin_block(BlockKind::Heading(level));
            }
            "ul" | "ol" => {
                self.end_block();
                self.lists.push(if name == "ol" {
                    ListKind::Ordered
                } else {
                    ListKind::Unordered
                });
            }
            "li" => {
                let kind = self.lists.last().copied().unwrap_or(ListKind::Unordered);
                self.begin_block(BlockKind::ListItem(kind));
            }
            "br" => {
                self.ensure_block();
                self.push_char(SOFT_BREAK);
            }
            "b" | "strong" => self.open_inline(name, vec![Mark::Bold]),
            "i" | "em" => self.open_inline(name, vec![Mark::Italic]),
            "u" | "ins" => self.open_inline(name, vec![Mark::Underline]),
            "a" => {
                let marks = attr(attrs, "href")
                    .map(|href| vec![Mark::Link(href.into())])
                    .unwrap_or_default();
                self.open_inline(name, marks);
            }
            "span" => {
                let marks = attr(attrs, "style").map(style_marks).unwrap_or_default();
                self.open_inline(name, marks);
            }
            tag if SKIPPED_ELEMENTS.contains(&tag) => {
                if !self_closing {
                    self.skip = Some((name, 1));
                }
            }
            other => tracing::trace!(tag = other, "unwrapping unsupported element"),
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "p" | "div" | "blockquote" | "pre" | "section" | "article" | "header" | "footer"
            | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" => self.end_block(),
            "ul" | "ol" => {
                self.end_block();
                self.lists.pop();
            }
            "b" | "strong" | "i" | "em" | "u" | "ins" | "a" | "span" => self.close_inline(name),
            _ => {}
        }
    }

    fn open_inline(&mut self, tag: SmolStr, marks: Vec<Mark>) {
        self.inline.push(OpenInline {
            tag,
            marks,
            start: self.len,
        });
    }

    fn close_inline(&mut self, tag: &str) {
        let Some(pos) = self.inline.iter().rposition(|open| open.tag == tag) else {
            tracing::trace!(tag, "ignoring unmatched end tag");
            return;
        };
        if pos + 1 < self.inline.len() {
            tracing::warn!(tag, "closing mis-nested inline elements");
        }
        let closed = self.inline.split_off(pos);
        for open in closed {
            self.emit(open);
        }
    }

    fn emit(&mut self, open: OpenInline) {
        for mark in open.marks {
            self.marks.push(MarkSpan::new(open.start, self.len, mark));
        }
    }

    fn begin_block(&mut self, kind: BlockKind) {
        self.end_block();
        if !self.blocks.is_empty() {
            self.push_char('\n');
        }
        self.blocks.push(kind);
        self.block_start = self.len;
        self.in_block = true;
    }

    fn end_block(&mut self) {
        if !self.in_block {
            return;
        }
        self.in_block = false;
        // A trailing `<br>` renders no line of its own: it either keeps an
        // empty block open or pairs with the soft break before it.
        if self.len > self.block_start && self.text.ends_with(SOFT_BREAK) {
            self.text.pop();
            self.len -= 1;
            let len = self.len;
            for span in &mut self.marks {
                span.start = span.start.min(len);
                span.end = span.end.min(len);
            }
            for open in &mut self.inline {
                open.start = open.start.min(len);
            }
        }
    }

    fn ensure_block(&mut self) {
        if !self.in_block {
            self.begin_block(BlockKind::Paragraph);
        }
    }

    fn push_char(&mut self, c: char) {
        self.text.push(c);
        self.len += 1;
    }

    fn push_text(&mut self, text: &str) {
        if !self.in_block && text.trim().is_empty() {
            return;
        }
        self.ensure_block();
        for c in text.chars() {
            let c = match c {
                '\r' | '\n' | '\t' | SOFT_BREAK => ' ',
                c => c,
            };
            self.push_char(c);
        }
    }

    fn finish(mut self) -> RichDocument {
        self.end_block();
        let open = std::mem::take(&mut self.inline);
        for open in open {
            self.emit(open);
        }
        if self.blocks.is_empty() {
            self.blocks.push(BlockKind::Paragraph);
        }
        RichDocument::from_parts(&self.text, self.blocks, self.marks)
    }
}

fn attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| attr.name == name)
        .map(|attr| attr.value.as_str())
}

/// Inline marks expressed through a `style` attribute.
fn style_marks(style: &str) -> Vec<Mark> {
    let mut marks = Vec::new();
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim().to_ascii_lowercase();
        match property.trim().to_ascii_lowercase().as_str() {
            "font-weight" => {
                if matches!(value.as_str(), "bold" | "bolder" | "600" | "700" | "800" | "900") {
                    marks.push(Mark::Bold);
                }
            }
            "font-style" => {
                if matches!(value.as_str(), "italic" | "oblique") {
                    marks.push(Mark::Italic);
                }
            }
            "text-decoration" | "text-decoration-line" => {
                if value.contains("underline") {
                    marks.push(Mark::Underline);
                }
            }
            _ => {}
        }
    }
    marks
}

// === Serialization ===

/// Serialize a document to its canonical HTML fragment.
pub fn serialize(doc: &RichDocument) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_document(FmtWriter(&mut out), doc);
    out
}

/// Write a document as HTML. A single empty paragraph writes nothing.
pub fn write_document<W: StrWrite>(mut w: W, doc: &RichDocument) -> Result<(), W::Error> {
    if doc.is_empty() {
        return Ok(());
    }
    let mut open_list: Option<ListKind> = None;
    for (index, kind) in doc.blocks().iter().enumerate() {
        let list = kind.list_kind();
        if open_list != list {
            if let Some(prev) = open_list {
                w.write_str("</")?;
                w.write_str(prev.tag())?;
                w.write_str(">")?;
            }
            if let Some(next) = list {
                w.write_str("<")?;
                w.write_str(next.tag())?;
                w.write_str(">")?;
            }
            open_list = list;
        }
        w.write_str("<")?;
        w.write_str(kind.tag())?;
        w.write_str(">")?;
        let range = doc.block_range(index);
        let trailing_break = !range.is_empty() && doc.char_at(range.end - 1) == Some(SOFT_BREAK);
        write_inline(&mut w, doc, range)?;
        if trailing_break {
            w.write_str("<br>")?;
        }
        w.write_str("</")?;
        w.write_str(kind.tag())?;
        w.write_str(">")?;
    }
    if let Some(prev) = open_list {
        w.write_str("</")?;
        w.write_str(prev.tag())?;
        w.write_str(">")?;
    }
    Ok(())
}

/// Write one block's content. Overlapping marks are closed and reopened at
/// segment boundaries so the output always nests properly.
fn write_inline<W: StrWrite>(
    w: &mut W,
    doc: &RichDocument,
    range: Range<usize>,
) -> Result<(), W::Error> {
    if range.is_empty() {
        return w.write_str("<br>");
    }

    let spans: Vec<&MarkSpan> = doc
        .marks()
        .iter()
        .filter(|span| span.start < range.end && span.end > range.start)
        .collect();
    let mut boundaries = vec![range.start, range.end];
    for span in &spans {
        boundaries.push(span.start.max(range.start));
        boundaries.push(span.end.min(range.end));
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut stack: Vec<&Mark> = Vec::new();
    for pair in boundaries.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let mut active: Vec<&Mark> = spans
            .iter()
            .filter(|span| span.start <= start && span.end >= end)
            .map(|span| &span.mark)
            .collect();
        active.sort_by_key(|mark| mark.rank());

        let keep = stack
            .iter()
            .take_while(|mark| active.contains(*mark))
            .count();
        while stack.len() > keep {
            if let Some(mark) = stack.pop() {
                close_mark(w, mark)?;
            }
        }
        for mark in active {
            if !stack.contains(&mark) {
                open_mark(w, mark)?;
                stack.push(mark);
            }
        }

        if let Some(text) = doc.slice(start..end) {
            write_text(w, &text)?;
        }
    }
    while let Some(mark) = stack.pop() {
        close_mark(w, mark)?;
    }
    Ok(())
}

fn open_mark<W: StrWrite>(w: &mut W, mark: &Mark) -> Result<(), W::Error> {
    match mark {
        Mark::Bold => w.write_str("<b>"),
        Mark::Italic => w.write_str("<i>"),
        Mark::Underline => w.write_str("<u>"),
        Mark::Link(url) => {
            w.write_str("<a href=\"")?;
            escape_html(&mut *w, url)?;
            w.write_str("\">")
        }
    }
}

fn close_mark<W: StrWrite>(w: &mut W, mark: &Mark) -> Result<(), W::Error> {
    w.write_str(match mark {
        Mark::Bold => "</b>",
        Mark::Italic => "</i>",
        Mark::Underline => "</u>",
        Mark::Link(_) => "</a>",
    })
}

fn write_text<W: StrWrite>(w: &mut W, text: &str) -> Result<(), W::Error> {
    let mut rest = text;
    while let Some(i) = rest.find([SOFT_BREAK, NBSP]) {
        escape_html_body_text(&mut *w, &rest[..i])?;
        let special = rest[i..].chars().next().unwrap_or(SOFT_BREAK);
        w.write_str(if special == NBSP { "&nbsp;" } else { "<br>" })?;
        rest = &rest[i + special.len_utf8()..];
    }
    escape_html_body_text(&mut *w, rest)
}
