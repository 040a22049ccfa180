use std::collections::{BTreeMap, BTreeSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::parse::is_component_name;
use super::FindingAid;
use crate::error::MetadataError;
use crate::xml::{attr, declares_xlink, prefix_of, xml_error, XLINK_NS};

/// Digital-object references to attach, keyed by component index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigitalObjectRefs {
    refs: BTreeMap<usize, Vec<String>>,
}

impl DigitalObjectRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, component: usize, href: impl Into<String>) {
        let href = href.into();
        let entry = self.refs.entry(component).or_default();
        if !entry.contains(&href) {
            entry.push(href);
        }
    }

    pub fn get(&self, component: usize) -> &[String] {
        self.refs.get(&component).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.refs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

enum Frame {
    Component(usize),
    Did {
        owner: usize,
        prefix: String,
        existing: BTreeSet<String>,
    },
    Other,
}

impl FindingAid {
    /// Re-serializes the finding aid with a `dao` element appended to the
    /// `did` of every referenced component. References already present in a
    /// `did` are not repeated.
    pub fn render_with_references(&self, refs: &DigitalObjectRefs) -> Result<String, MetadataError> {
        let mut reader = Reader::from_str(self.raw());
        let mut writer = Writer::new(Vec::new());
        let mut frames: Vec<Frame> = Vec::new();
        let mut next_index = 0usize;
        let mut xlink_declared = false;
        let mut seen_root = false;

        loop {
            let event = reader.read_event().map_err(|e| xml_error(self.path(), e))?;
            match event {
                Event::Start(e) => {
                    if !seen_root {
                        seen_root = true;
                        xlink_declared = declares_xlink(&e);
                    }
                    let frame = open_frame(&e, &frames, &mut next_index);
                    if let Frame::Other = frame {
                        record_existing_dao(&e, &mut frames);
                    }
                    frames.push(frame);
                    writer
                        .write_event(Event::Start(e))
                        .map_err(|err| xml_error(self.path(), err))?;
                }
                Event::Empty(e) => {
                    if !seen_root {
                        seen_root = true;
                    }
                    match open_frame(&e, &frames, &mut next_index) {
                        Frame::Did { owner, prefix, .. } if !refs.get(owner).is_empty() => {
                            writer
                                .write_event(Event::Start(e.clone()))
                                .map_err(|err| xml_error(self.path(), err))?;
                            for href in refs.get(owner) {
                                write_dao(&mut writer, &prefix, href, xlink_declared)
                                    .map_err(|err| xml_error(self.path(), err))?;
                            }
                            writer
                                .write_event(Event::End(e.to_end()))
                                .map_err(|err| xml_error(self.path(), err))?;
                        }
                        _ => {
                            record_existing_dao(&e, &mut frames);
                            writer
                                .write_event(Event::Empty(e))
                                .map_err(|err| xml_error(self.path(), err))?;
                        }
                    }
                }
                Event::End(e) => {
                    if let Some(Frame::Did {
                        owner,
                        prefix,
                        existing,
                    }) = frames.pop()
                    {
                        for href in refs.get(owner) {
                            if !existing.contains(href) {
                                write_dao(&mut writer, &prefix, href, xlink_declared)
                                    .map_err(|err| xml_error(self.path(), err))?;
                            }
                        }
                    }
                    writer
                        .write_event(Event::End(e))
                        .map_err(|err| xml_error(self.path(), err))?;
                }
                Event::Eof => break,
                other => writer
                    .write_event(other)
                    .map_err(|err| xml_error(self.path(), err))?,
            }
        }

        String::from_utf8(writer.into_inner()).map_err(|e| xml_error(self.path(), e))
    }
}

fn open_frame(element: &BytesStart, frames: &[Frame], next_index: &mut usize) -> Frame {
    let local = element.local_name();
    if is_component_name(local.as_ref()) {
        let index = *next_index;
        *next_index += 1;
        return Frame::Component(index);
    }

    match frames.last() {
        Some(Frame::Component(owner)) if local.as_ref() == b"did" => Frame::Did {
            owner: *owner,
            prefix: prefix_of(element.name().as_ref()),
            existing: BTreeSet::new(),
        },
        _ => Frame::Other,
    }
}

fn record_existing_dao(element: &BytesStart, frames: &mut [Frame]) {
    if element.local_name().as_ref() != b"dao" {
        return;
    }
    if let Some(Frame::Did { existing, .. }) = frames.last_mut() {
        if let Some(href) = attr(element, "href") {
            existing.insert(href);
        }
    }
}

fn write_dao<W: std::io::Write>(
    writer: &mut Writer<W>,
    prefix: &str,
    href: &str,
    xlink_declared: bool,
) -> std::io::Result<()> {
    let mut dao = BytesStart::new(format!("{}dao", prefix));
    if !xlink_declared {
        dao.push_attribute(("xmlns:xlink", XLINK_NS));
    }
    dao.push_attribute(("xlink:type", "simple"));
    dao.push_attribute(("xlink:href", href));
    writer
        .write_event(Event::Empty(dao))
        .map_err(|e| std::io::Error::other(e.to_string()))
}
