use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use crate::github::ReleaseRecord;
use crate::util::write_atomic;

/// Default output file for `--opml`.
pub const DEFAULT_OPML_FILE: &str = "feed.opml";

const OPML_TITLE: &str = "GitHub starred releases";

/// Outline label for a repository's release feed.
pub fn outline_title(record: &ReleaseRecord) -> String {
    format!("Release from {}", record.full_name)
}

/// Renders records as an OPML 2.0 document.
///
/// Each record becomes one flat `<outline type="rss">` pointing at the
/// repository's release feed, with the release page as `htmlUrl`.
/// Attribute values are escaped by the writer.
pub fn export_opml(records: &[ReleaseRecord]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut opml = BytesStart::new("opml");
    opml.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(opml))
        .context("Failed to write opml element")?;

    // <head><title>...</title></head>
    writer
        .write_event(Event::Start(BytesStart::new("head")))
        .context("Failed to write head element")?;
    writer
        .write_event(Event::Start(BytesStart::new("title")))
        .context("Failed to write title element")?;
    writer
        .write_event(Event::Text(BytesText::new(OPML_TITLE)))
        .context("Failed to write title text")?;
    writer
        .write_event(Event::End(BytesEnd::new("title")))
        .context("Failed to write title end")?;
    writer
        .write_event(Event::End(BytesEnd::new("head")))
        .context("Failed to write head end")?;

    writer
        .write_event(Event::Start(BytesStart::new("body")))
        .context("Failed to write body element")?;

    for record in records {
        let title = outline_title(record);
        let mut outline = BytesStart::new("outline");
        outline.push_attribute(("type", "rss"));
        outline.push_attribute(("text", title.as_str()));
        outline.push_attribute(("title", title.as_str()));
        outline.push_attribute(("xmlUrl", record.feed_url.as_str()));
        outline.push_attribute(("htmlUrl", record.html_url.as_str()));
        writer
            .write_event(Event::Empty(outline))
            .context("Failed to write outline element")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("body")))
        .context("Failed to write body end")?;
    writer
        .write_event(Event::End(BytesEnd::new("opml")))
        .context("Failed to write opml end")?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).context("OPML output is not valid UTF-8")
}

/// Writes the OPML document to `path`, replacing any existing file.
///
/// SEC-009: the document is written to a fresh temp file beside `path`
/// and renamed over it, so readers never see a half-written file.
pub fn export_to_file(records: &[ReleaseRecord], path: &Path) -> Result<()> {
    let content = export_opml(records)?;
    write_atomic(path, content.as_bytes())
        .with_context(|| format!("Failed to write OPML to '{}'", path.display()))?;
    tracing::info!(path = %path.display(), outlines = records.len(), "Wrote OPML");
    Ok(())
}
