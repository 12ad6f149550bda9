use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;
use tracing::debug;

use crate::size::parse_dimension;

const ANDROID_PREFIX: &str = "android";

/// Android Vector Drawable XML text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDocument {
    xml: String,
}

impl VectorDocument {
    pub fn from_string(xml: impl Into<String>) -> Self {
        VectorDocument { xml: xml.into() }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_string(xml))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.xml)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }

    /// Value of the root attribute whose local name is `local`, any prefix.
    pub fn root_attribute(&self, local: &str) -> Result<Option<String>> {
        let mut reader = Reader::from_str(&self.xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.local_name().as_ref() == local.as_bytes() {
                            return Ok(Some(attr.unescape_value()?.into_owned()));
                        }
                    }
                    return Ok(None);
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Replace black fills (`#000000` / `#000`) with `#ffffff`.
    ///
    /// Applies to `android:fillColor` and plain `fill` attributes on every element.
    pub fn recolor_black_fills(&self) -> Result<Self> {
        let mut replaced = 0usize;
        let xml = rewrite(&self.xml, |event| match event {
            Event::Start(e) => {
                let (e, n) = recolor_element(&e)?;
                replaced += n;
                Ok(vec![Event::Start(e)])
            }
            Event::Empty(e) => {
                let (e, n) = recolor_element(&e)?;
                replaced += n;
                Ok(vec![Event::Empty(e)])
            }
            other => Ok(vec![other]),
        })?;
        debug!("Recolored {} black fills", replaced);
        Ok(Self::from_string(xml))
    }
}

/// Set the four size attributes on the root element and optionally record the
/// intended usage as a comment after the XML declaration.
///
/// `width` and `height` must be non-negative integers; anything else fails
/// with `InvalidSize` before the document is touched. Re-annotating replaces
/// the attribute values, while each call with a label adds another comment.
pub fn annotate(doc: &VectorDocument, width: &str, height: &str, usage: Option<&str>) -> Result<VectorDocument> {
    let w = parse_dimension(width)?;
    let h = parse_dimension(height)?;

    let sizes = [
        ("width", format!("{}px", w)),
        ("height", format!("{}px", h)),
        ("viewportWidth", w.to_string()),
        ("viewportHeight", h.to_string()),
    ];
    let comment = usage
        .filter(|label| !label.is_empty())
        .map(|label| format!(" intended-usage: {} ", label));

    let mut comment_pending = comment.is_some();
    let mut root_done = false;

    let xml = rewrite(doc.as_str(), |event| {
        let mut out = Vec::new();

        match event {
            Event::Decl(decl) => {
                out.push(Event::Decl(decl));
                if let Some(text) = comment.as_deref().filter(|_| comment_pending) {
                    out.push(Event::Text(BytesText::from_escaped("\n")));
                    out.push(Event::Comment(BytesText::from_escaped(text.to_string())));
                    comment_pending = false;
                }
                return Ok(out);
            }
            other => {
                // No declaration: the comment opens the document
                if let Some(text) = comment.as_deref().filter(|_| comment_pending) {
                    out.push(Event::Comment(BytesText::from_escaped(text.to_string())));
                    out.push(Event::Text(BytesText::from_escaped("\n")));
                    comment_pending = false;
                }
                match other {
                    Event::Start(e) if !root_done => {
                        root_done = true;
                        out.push(Event::Start(upsert_attributes(&e, &sizes)?));
                    }
                    Event::Empty(e) if !root_done => {
                        root_done = true;
                        out.push(Event::Empty(upsert_attributes(&e, &sizes)?));
                    }
                    other => out.push(other),
                }
            }
        }

        Ok(out)
    })?;

    if !root_done {
        anyhow::bail!("vector document has no root element");
    }

    Ok(VectorDocument::from_string(xml))
}

/// Annotate the drawable at `path` in place.
pub fn annotate_file(path: &Path, width: &str, height: &str, usage: Option<&str>) -> Result<()> {
    let doc = VectorDocument::read(path)?;
    let annotated = annotate(&doc, width, height, usage)
        .with_context(|| format!("Failed to annotate {}", path.display()))?;
    annotated.write(path)
}

/// Stream every event of `xml` through `map` and serialize the result.
fn rewrite<'a, F>(xml: &'a str, mut map: F) -> Result<String>
where
    F: FnMut(Event<'a>) -> Result<Vec<Event<'a>>>,
{
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());

    loop {
        let event = reader.read_event().context("Malformed vector drawable XML")?;
        if let Event::Eof = event {
            break;
        }
        for out in map(event)? {
            writer.write_event(out)?;
        }
    }

    String::from_utf8(writer.into_inner()).context("Vector drawable is not UTF-8")
}

/// Rebuild `element` with each `(local, value)` either replacing the existing
/// attribute of that local name or appended with the `android:` prefix.
fn upsert_attributes(element: &BytesStart, updates: &[(&str, String)]) -> Result<BytesStart<'static>> {
    let name = std::str::from_utf8(element.name().as_ref())?.to_string();
    let mut rebuilt = BytesStart::new(name);
    let mut seen = vec![false; updates.len()];

    for attr in element.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let local = attr.key.local_name();

        match updates.iter().position(|(name, _)| name.as_bytes() == local.as_ref()) {
            // Duplicates of an already-updated attribute are dropped
            Some(i) if seen[i] => {}
            Some(i) => {
                seen[i] = true;
                rebuilt.push_attribute((key, updates[i].1.as_str()));
            }
            None => {
                let value = attr.unescape_value()?;
                rebuilt.push_attribute((key, &*value));
            }
        }
    }

    for (i, (local, value)) in updates.iter().enumerate() {
        if !seen[i] {
            let key = format!("{}:{}", ANDROID_PREFIX, local);
            rebuilt.push_attribute((key.as_str(), value.as_str()));
        }
    }

    Ok(rebuilt)
}

fn is_black(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("#000000") || value.eq_ignore_ascii_case("#000")
}

fn recolor_element<'a>(element: &BytesStart<'a>) -> Result<(BytesStart<'a>, usize)> {
    let mut hits = 0usize;
    for attr in element.attributes() {
        let attr = attr?;
        let local = attr.key.local_name();
        if matches!(local.as_ref(), b"fillColor" | b"fill") && is_black(&attr.unescape_value()?) {
            hits += 1;
        }
    }
    if hits == 0 {
        return Ok((element.clone(), 0));
    }

    let name = std::str::from_utf8(element.name().as_ref())?.to_string();
    let mut rebuilt = BytesStart::new(name);
    for attr in element.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?;
        let is_fill = matches!(attr.key.local_name().as_ref(), b"fillColor" | b"fill");
        if is_fill && is_black(&value) {
            rebuilt.push_attribute((key, "#ffffff"));
        } else {
            rebuilt.push_attribute((key, &*value));
        }
    }
    Ok((rebuilt.into_owned(), hits))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAWABLE: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<vector xmlns:android="http://schemas.android.com/apk/res/android"
    android:width="24dp"
    android:height="24dp"
    android:viewportWidth="24"
    android:viewportHeight="24">
    <path android:fillColor="#000000" android:pathData="M0,0h24v24h-24z"/>
    <path android:fillColor="#FF0000" android:pathData="M4,4h4v4h-4z"/>
</vector>
"##;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_annotate_replaces_existing_attributes() {
        let doc = VectorDocument::from_string(DRAWABLE);
        let out = annotate(&doc, "320", "180", None).unwrap();

        assert_eq!(out.root_attribute("width").unwrap().as_deref(), Some("320px"));
        assert_eq!(out.root_attribute("height").unwrap().as_deref(), Some("180px"));
        assert_eq!(out.root_attribute("viewportWidth").unwrap().as_deref(), Some("320"));
        assert_eq!(out.root_attribute("viewportHeight").unwrap().as_deref(), Some("180"));
        assert!(!out.as_str().contains("24dp"));
        assert!(!out.as_str().contains("intended-usage"));
        // Children are untouched
        assert!(out.as_str().contains(r#"android:pathData="M4,4h4v4h-4z""#));
    }

    #[test]
    fn test_annotate_appends_missing_attributes() {
        let doc = VectorDocument::from_string(
            r#"<vector xmlns:android="http://schemas.android.com/apk/res/android" android:width="10dp"><path/></vector>"#,
        );
        let out = annotate(&doc, "108", "108", None).unwrap();

        assert!(out.as_str().contains(r#"android:width="108px""#));
        assert!(out.as_str().contains(r#"android:height="108px""#));
        assert!(out.as_str().contains(r#"android:viewportWidth="108""#));
        assert!(out.as_str().contains(r#"android:viewportHeight="108""#));
    }

    #[test]
    fn test_annotate_is_idempotent_on_attributes() {
        let doc = VectorDocument::from_string(DRAWABLE);
        let once = annotate(&doc, "320", "180", None).unwrap();
        let twice = annotate(&once, "320", "180", None).unwrap();
        assert_eq!(once, twice);

        let resized = annotate(&twice, "64", "48", None).unwrap();
        for name in ["android:width=", "android:height=", "android:viewportWidth=", "android:viewportHeight="] {
            assert_eq!(count(resized.as_str(), name), 1, "{}", name);
        }
        assert_eq!(resized.root_attribute("width").unwrap().as_deref(), Some("64px"));
        assert_eq!(resized.root_attribute("viewportHeight").unwrap().as_deref(), Some("48"));
    }

    #[test]
    fn test_usage_comment_follows_declaration() {
        let doc = VectorDocument::from_string(DRAWABLE);
        let out = annotate(&doc, "320", "180", Some("banner")).unwrap();

        assert!(out
            .as_str()
            .starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!-- intended-usage: banner -->\n<vector"));
        assert_eq!(count(out.as_str(), "intended-usage: banner"), 1);

        // The comment is not deduplicated
        let again = annotate(&out, "320", "180", Some("banner")).unwrap();
        assert_eq!(count(again.as_str(), "intended-usage: banner"), 2);
    }

    #[test]
    fn test_usage_comment_without_declaration() {
        let doc = VectorDocument::from_string(r#"<vector android:width="1dp"/>"#);
        let out = annotate(&doc, "108", "108", Some("icon")).unwrap();
        assert!(out.as_str().starts_with("<!-- intended-usage: icon -->\n<vector "));
    }

    #[test]
    fn test_empty_usage_adds_no_comment() {
        let doc = VectorDocument::from_string(DRAWABLE);
        let out = annotate(&doc, "1", "2", Some("")).unwrap();
        assert!(!out.as_str().contains("<!--"));
    }

    #[test]
    fn test_invalid_size_leaves_document_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawable.xml");
        std::fs::write(&path, DRAWABLE).unwrap();

        for (w, h) in [("-5", "10"), ("10", "1.5"), ("abc", "10"), ("", "10"), ("10", "10px")] {
            let err = annotate_file(&path, w, h, Some("banner")).unwrap_err();
            assert!(
                matches!(crate::IconError::find(&err), Some(crate::IconError::InvalidSize(_))),
                "{:?}",
                (w, h)
            );
            assert_eq!(std::fs::read_to_string(&path).unwrap(), DRAWABLE);
        }
    }

    #[test]
    fn test_annotate_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawable.xml");
        std::fs::write(&path, DRAWABLE).unwrap();

        annotate_file(&path, "108", "108", Some("icon")).unwrap();

        let doc = VectorDocument::read(&path).unwrap();
        assert_eq!(doc.root_attribute("width").unwrap().as_deref(), Some("108px"));
        assert!(doc.as_str().contains("<!-- intended-usage: icon -->"));
    }

    #[test]
    fn test_recolor_black_fills() {
        let doc = VectorDocument::from_string(
            r##"<vector><path android:fillColor="#000000"/><path android:fillColor="#000"/><path android:fillColor="#FF0000"/><group><path fill="#000000" android:strokeColor="#000000"/></group></vector>"##,
        );
        let out = doc.recolor_black_fills().unwrap();

        assert_eq!(count(out.as_str(), "#ffffff"), 3);
        assert!(out.as_str().contains(r##"android:fillColor="#FF0000""##));
        // Only fills change
        assert!(out.as_str().contains(r##"android:strokeColor="#000000""##));
    }

    #[test]
    fn test_recolor_is_case_insensitive_and_exact() {
        let doc = VectorDocument::from_string(
            r##"<vector><path android:fillColor="#000"/><path android:fillColor="#00000000"/></vector>"##,
        );
        let out = doc.recolor_black_fills().unwrap();
        assert!(out.as_str().contains(r##"android:fillColor="#ffffff""##));
        // Transparent black is not plain black
        assert!(out.as_str().contains(r##"android:fillColor="#00000000""##));
    }

    #[test]
    fn test_document_without_root_is_rejected() {
        let doc = VectorDocument::from_string("<?xml version=\"1.0\"?>\n");
        assert!(annotate(&doc, "1", "1", None).is_err());
    }
}
