use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Component, Container, FindingAid};
use crate::error::MetadataError;
use crate::xml::{attr, xml_error};

pub fn parse_finding_aid(path: &Path) -> Result<FindingAid, MetadataError> {
    let raw = std::fs::read_to_string(path).map_err(|e| MetadataError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_finding_aid_str(path, raw)
}

pub fn parse_finding_aid_str(path: &Path, raw: String) -> Result<FindingAid, MetadataError> {
    let components = ComponentParser::default().run(path, &raw)?;
    Ok(FindingAid {
        path: path.to_path_buf(),
        raw,
        components,
    })
}

/// `c` and the numbered `c01` .. `c12` forms.
pub(crate) fn is_component_name(local: &[u8]) -> bool {
    match local {
        b"c" => true,
        [b'c', a, b] => a.is_ascii_digit() && b.is_ascii_digit(),
        _ => false,
    }
}

enum Field {
    Title,
    Date,
    Container,
}

enum Frame {
    Component(usize),
    Did,
    Capture(Field),
    Other,
}

#[derive(Default)]
struct ComponentParser {
    components: Vec<Component>,
    frames: Vec<Frame>,
    pending: Option<Container>,
    text: String,
}

impl ComponentParser {
    fn run(mut self, path: &Path, raw: &str) -> Result<Vec<Component>, MetadataError> {
        let mut reader = Reader::from_str(raw);

        loop {
            match reader.read_event().map_err(|e| xml_error(path, e))? {
                Event::Start(e) => {
                    let frame = self.open(&e);
                    self.frames.push(frame);
                }
                Event::Empty(e) => {
                    let frame = self.open(&e);
                    self.close(frame);
                }
                Event::End(_) => {
                    if let Some(frame) = self.frames.pop() {
                        self.close(frame);
                    }
                }
                Event::Text(e) => {
                    if self.capturing() {
                        let text = e.decode().map_err(|err| xml_error(path, err))?;
                        self.text.push_str(&text);
                    }
                }
                Event::GeneralRef(e) => {
                    if self.capturing() {
                        if let Some(ch) = e.resolve_char_ref().map_err(|err| xml_error(path, err))? {
                            self.text.push(ch);
                        } else {
                            let name = e.decode().map_err(|err| xml_error(path, err))?;
                            if let Some(value) = resolve_predefined_entity(&name) {
                                self.text.push_str(value);
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    if self.capturing() {
                        self.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(self.components)
    }

    fn capturing(&self) -> bool {
        self.frames.iter().any(|f| matches!(f, Frame::Capture(_)))
    }

    fn owner(&self) -> Option<usize> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Component(i) => Some(*i),
            _ => None,
        })
    }

    fn open(&mut self, element: &BytesStart) -> Frame {
        let local = element.local_name();
        let local = local.as_ref();

        if is_component_name(local) {
            let index = self.components.len();
            let parent = self.owner();
            let depth = parent.map(|p| self.components[p].depth + 1).unwrap_or(1);
            self.components.push(Component {
                index,
                id: attr(element, "id"),
                level: attr(element, "level"),
                parent,
                depth,
                ..Default::default()
            });
            if let Some(p) = parent {
                self.components[p].children.push(index);
            }
            return Frame::Component(index);
        }

        match (self.frames.last(), local) {
            (Some(Frame::Component(_)), b"did") => Frame::Did,
            (Some(Frame::Did), b"container") => {
                self.pending = Some(Container {
                    id: attr(element, "id"),
                    kind: attr(element, "type"),
                    custom_label: attr(element, "label"),
                    parent: attr(element, "parent"),
                    label: String::new(),
                });
                self.text.clear();
                Frame::Capture(Field::Container)
            }
            (Some(Frame::Did), b"unittitle") => {
                self.text.clear();
                Frame::Capture(Field::Title)
            }
            (Some(Frame::Did), b"unitdate") => {
                self.text.clear();
                Frame::Capture(Field::Date)
            }
            _ => Frame::Other,
        }
    }

    fn close(&mut self, frame: Frame) {
        let Frame::Capture(field) = frame else {
            return;
        };
        let value = self.text.split_whitespace().collect::<Vec<_>>().join(" ");
        self.text.clear();

        let Some(owner) = self.owner() else {
            return;
        };
        let component = &mut self.components[owner];
        match field {
            Field::Title => {
                if component.title.is_none() && !value.is_empty() {
                    component.title = Some(value);
                }
            }
            Field::Date => {
                if component.date.is_none() && !value.is_empty() {
                    component.date = Some(value);
                }
            }
            Field::Container => {
                if let Some(mut container) = self.pending.take() {
                    container.label = value;
                    component.containers.push(container);
                }
            }
        }
    }
}
