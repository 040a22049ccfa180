use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::StructMapBuilder;
use crate::error::MetadataError;
use crate::xml::{attr, attr_text, declares_xlink, prefix_of, xml_error, XLINK_NS};

/// The submission package's structural metadata, used as the template for
/// the output document.
#[derive(Debug, Clone)]
pub struct MetsTemplate {
    path: PathBuf,
    raw: String,
    object_id: Option<String>,
    finding_aid_href: String,
}

impl MetsTemplate {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let raw = std::fs::read_to_string(path).map_err(|e| MetadataError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, raw)
    }

    /// Fails when the document does not reference a finding aid through an
    /// `mdRef` of type `EAD`, or carries no `fileSec`.
    pub fn parse(path: &Path, raw: String) -> Result<Self, MetadataError> {
        let mut reader = Reader::from_str(&raw);
        let mut object_id = None;
        let mut finding_aid_href = None;
        let mut has_file_sec = false;
        let mut seen_root = false;

        loop {
            match reader.read_event().map_err(|e| xml_error(path, e))? {
                Event::Start(e) | Event::Empty(e) => {
                    if !seen_root {
                        seen_root = true;
                        object_id = attr(&e, "OBJID").filter(|id| !id.trim().is_empty());
                    }
                    match e.local_name().as_ref() {
                        b"mdRef" if finding_aid_href.is_none() => {
                            let is_ead = attr(&e, "MDTYPE").is_some_and(|t| t.eq_ignore_ascii_case("EAD"));
                            if is_ead {
                                finding_aid_href = attr(&e, "href").filter(|h| !h.trim().is_empty());
                            }
                        }
                        b"fileSec" => has_file_sec = true,
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let finding_aid_href =
            finding_aid_href.ok_or_else(|| MetadataError::MissingFindingAidReference(path.to_path_buf()))?;
        if !has_file_sec {
            return Err(MetadataError::OldStyleTemplate(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            raw,
            object_id,
            finding_aid_href,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    /// Finding-aid location, relative hrefs resolved against the template's
    /// directory.
    pub fn finding_aid_path(&self) -> PathBuf {
        let href = self.finding_aid_href.trim();
        let href = href.strip_prefix("file://").unwrap_or(href);
        match self.path.parent() {
            Some(dir) => dir.join(href),
            None => PathBuf::from(href),
        }
    }

    /// Configured id if any, otherwise the template's `OBJID`.
    pub fn package_id(&self, configured: Option<&str>) -> Result<String, MetadataError> {
        configured
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .or(self.object_id())
            .map(str::to_string)
            .ok_or_else(|| MetadataError::MissingBaseIdentifier(self.path.clone()))
    }

    /// Copies the template, replacing its `fileSec` and `structMap` with the
    /// builder's content and stamping `metsHdr/@LASTMODDATE`.
    pub fn render(&self, builder: &StructMapBuilder, now: DateTime<Utc>) -> Result<String, MetadataError> {
        let mut reader = Reader::from_str(&self.raw);
        let mut writer = Writer::new(Vec::new());
        let last_modified = now.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut prefix = String::new();
        let mut root_depth: Option<usize> = None;
        let mut depth = 0usize;
        let mut skip_depth: Option<usize> = None;
        let mut struct_map_written = false;

        loop {
            let event = reader.read_event().map_err(|e| xml_error(&self.path, e))?;

            if let Some(target) = skip_depth {
                match event {
                    Event::Start(_) => depth += 1,
                    Event::End(_) => {
                        depth -= 1;
                        if depth == target {
                            skip_depth = None;
                        }
                    }
                    Event::Eof => break,
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(e) => {
                    let replace = self.replacement(&e, &prefix, builder, &mut struct_map_written)?;
                    match replace {
                        Some(content) => {
                            write_raw(&mut writer, &content).map_err(|err| xml_error(&self.path, err))?;
                            skip_depth = Some(depth);
                            depth += 1;
                        }
                        None => {
                            let e = if root_depth.is_none() {
                                root_depth = Some(depth);
                                prefix = prefix_of(e.name().as_ref());
                                with_xlink(e)
                            } else {
                                stamp(e, &last_modified)
                            };
                            depth += 1;
                            self.write(&mut writer, Event::Start(e))?;
                        }
                    }
                }
                Event::Empty(e) => {
                    match self.replacement(&e, &prefix, builder, &mut struct_map_written)? {
                        Some(content) => {
                            write_raw(&mut writer, &content).map_err(|err| xml_error(&self.path, err))?;
                        }
                        None => self.write(&mut writer, Event::Empty(stamp(e, &last_modified)))?,
                    }
                }
                Event::End(e) => {
                    depth -= 1;
                    if Some(depth) == root_depth && !struct_map_written {
                        struct_map_written = true;
                        let content = struct_map_xml(builder, &prefix).map_err(|err| xml_error(&self.path, err))?;
                        write_raw(&mut writer, &content).map_err(|err| xml_error(&self.path, err))?;
                    }
                    self.write(&mut writer, Event::End(e))?;
                }
                Event::Eof => break,
                other => self.write(&mut writer, other)?,
            }
        }

        String::from_utf8(writer.into_inner()).map_err(|e| xml_error(&self.path, e))
    }

    /// Generated markup standing in for `element`, if it is replaced.
    /// Structural maps after the first are dropped.
    fn replacement(
        &self,
        element: &BytesStart,
        prefix: &str,
        builder: &StructMapBuilder,
        struct_map_written: &mut bool,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        let content = match element.local_name().as_ref() {
            b"fileSec" => file_sec_xml(builder, prefix),
            b"structMap" if *struct_map_written => Ok(Vec::new()),
            b"structMap" => {
                *struct_map_written = true;
                struct_map_xml(builder, prefix)
            }
            _ => return Ok(None),
        };
        content.map(Some).map_err(|e| xml_error(&self.path, e))
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>, event: Event) -> Result<(), MetadataError> {
        writer
            .write_event(event)
            .map(|_| ())
            .map_err(|e| xml_error(&self.path, e))
    }
}

fn write_raw(writer: &mut Writer<Vec<u8>>, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    writer.get_mut().write_all(content)
}

fn with_xlink(root: BytesStart<'_>) -> BytesStart<'static> {
    let mut owned = root.into_owned();
    if !declares_xlink(&owned) {
        owned.push_attribute(("xmlns:xlink", XLINK_NS));
    }
    owned
}

/// Sets `LASTMODDATE` on a `metsHdr`; other elements pass through.
fn stamp(element: BytesStart<'_>, last_modified: &str) -> BytesStart<'static> {
    if element.local_name().as_ref() != b"metsHdr" {
        return element.into_owned();
    }

    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut stamped = BytesStart::new(name);
    for attribute in element.attributes().flatten() {
        if attribute.key.as_ref() == b"LASTMODDATE" {
            continue;
        }
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attr_text(&attribute);
        stamped.push_attribute((key.as_str(), value.as_str()));
    }
    stamped.push_attribute(("LASTMODDATE", last_modified));
    stamped
}

fn file_sec_xml(builder: &StructMapBuilder, prefix: &str) -> std::io::Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    let element = |local: &str| BytesStart::new(format!("{}{}", prefix, local));

    let file_sec = element("fileSec");
    writer.write_event(Event::Start(file_sec.clone())).map_err(to_io)?;
    for (usage, files) in builder.file_groups() {
        let mut group = element("fileGrp");
        group.push_attribute(("USE", usage.as_str()));
        writer.write_event(Event::Start(group.clone())).map_err(to_io)?;

        for file in files {
            let mut entry = element("file");
            entry.push_attribute(("ID", file.id.as_str()));
            entry.push_attribute(("MIMETYPE", file.mime_type.as_str()));
            writer.write_event(Event::Start(entry.clone())).map_err(to_io)?;

            let mut location = element("FLocat");
            location.push_attribute(("LOCTYPE", "URL"));
            location.push_attribute(("xlink:href", file.href.as_str()));
            writer.write_event(Event::Empty(location)).map_err(to_io)?;

            writer.write_event(Event::End(entry.to_end())).map_err(to_io)?;
        }
        writer.write_event(Event::End(group.to_end())).map_err(to_io)?;
    }
    writer.write_event(Event::End(file_sec.to_end())).map_err(to_io)?;

    Ok(writer.into_inner())
}

fn struct_map_xml(builder: &StructMapBuilder, prefix: &str) -> std::io::Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    let element = |local: &str| BytesStart::new(format!("{}{}", prefix, local));

    let mut struct_map = element("structMap");
    struct_map.push_attribute(("TYPE", "logical"));
    writer.write_event(Event::Start(struct_map.clone())).map_err(to_io)?;

    let mut root = element("div");
    root.push_attribute(("ID", builder.package_id()));
    root.push_attribute(("TYPE", "collection"));
    writer.write_event(Event::Start(root.clone())).map_err(to_io)?;

    for section in builder.sections() {
        let section_id = builder.section_id(section.number);
        let section_label = section.path.relative_string();
        let mut div = element("div");
        div.push_attribute(("ID", section_id.as_str()));
        div.push_attribute(("TYPE", "section"));
        div.push_attribute(("ORDER", section.number.to_string().as_str()));
        div.push_attribute(("LABEL", section_label.as_str()));
        writer.write_event(Event::Start(div.clone())).map_err(to_io)?;

        for item in &section.items {
            let item_id = builder.item_id(section.number, item.order);
            let mut item_div = element("div");
            item_div.push_attribute(("ID", item_id.as_str()));
            item_div.push_attribute(("TYPE", item.kind.as_str()));
            item_div.push_attribute(("ORDER", item.order.to_string().as_str()));
            item_div.push_attribute(("LABEL", item.label.as_str()));
            writer.write_event(Event::Start(item_div.clone())).map_err(to_io)?;

            for file in &item.files {
                let mut pointer = element("fptr");
                pointer.push_attribute(("FILEID", file.id.as_str()));
                writer.write_event(Event::Empty(pointer)).map_err(to_io)?;
            }
            writer.write_event(Event::End(item_div.to_end())).map_err(to_io)?;
        }
        writer.write_event(Event::End(div.to_end())).map_err(to_io)?;
    }

    writer.write_event(Event::End(root.to_end())).map_err(to_io)?;
    writer.write_event(Event::End(struct_map.to_end())).map_err(to_io)?;
    Ok(writer.into_inner())
}

fn to_io<E: std::fmt::Display>(e: E) -> std::io::Error {
    std::io::Error::other(e.to_string())
}
