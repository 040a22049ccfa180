//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use dipgen::{load_config_from_str, PackageConfig};

/// Builder for `PackageConfig` instances.
pub struct PackageConfigBuilder {
    config: PackageConfig,
}

impl PackageConfigBuilder {
    /// Minimal valid config; every optional field at its default.
    pub fn new(structural_metadata: &str, source_root: &str, output_root: &str) -> Self {
        let json = serde_json::json!({
            "version": "1.0",
            "structural_metadata": structural_metadata,
            "source_root": source_root,
            "output_root": output_root,
        });
        let config = load_config_from_str(&json.to_string()).expect("Minimal config must load");
        Self { config }
    }

    pub fn ocr_required(mut self, enabled: bool) -> Self {
        self.config.ocr_required = enabled;
        self
    }

    pub fn pdf_master(mut self, enabled: bool) -> Self {
        self.config.pdf_master = enabled;
        self
    }

    pub fn object_type(mut self, object_type: &str) -> Self {
        self.config.object_type = object_type.to_string();
        self
    }

    pub fn output_id(mut self, id: &str) -> Self {
        self.config.output_id = Some(id.to_string());
        self
    }

    pub fn subdirectory(mut self, subdirectory: &str) -> Self {
        self.config.subdirectory = Some(subdirectory.to_string());
        self
    }

    pub fn display_format(mut self, format: &str) -> Self {
        self.config.display_format = Some(format.to_string());
        self
    }

    pub fn mime_allow_list(mut self, types: &[&str]) -> Self {
        self.config.mime_allow_list = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn build(self) -> PackageConfig {
        self.config
    }
}

/// One `<container>` element.
#[derive(Clone)]
pub struct ContainerFixture {
    id: Option<String>,
    kind: Option<String>,
    label: String,
    parent: Option<String>,
    custom_label: Option<String>,
}

pub fn container(kind: &str, label: &str) -> ContainerFixture {
    ContainerFixture {
        id: None,
        kind: Some(kind.to_string()),
        label: label.to_string(),
        parent: None,
        custom_label: None,
    }
}

impl ContainerFixture {
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn custom_label(mut self, label: &str) -> Self {
        self.custom_label = Some(label.to_string());
        self
    }

    fn to_xml(&self) -> String {
        let mut attributes = String::new();
        for (name, value) in [
            ("id", &self.id),
            ("type", &self.kind),
            ("parent", &self.parent),
            ("label", &self.custom_label),
        ] {
            if let Some(value) = value {
                attributes.push_str(&format!(r#" {}="{}""#, name, value));
            }
        }
        format!("<container{}>{}</container>", attributes, self.label)
    }
}

/// Builder for EAD finding aids with one `c01` per component.
#[derive(Default)]
pub struct EadBuilder {
    components: Vec<String>,
}

impl EadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, title: Option<&str>, containers: &[ContainerFixture]) -> Self {
        let title = title
            .map(|t| format!("<unittitle>{}</unittitle>", t))
            .unwrap_or_default();
        let containers: String = containers.iter().map(ContainerFixture::to_xml).collect();
        self.components
            .push(format!("<c01 level=\"file\"><did>{}{}</did></c01>", title, containers));
        self
    }

    /// Adds pre-built component markup verbatim.
    pub fn raw_component(mut self, xml: &str) -> Self {
        self.components.push(xml.to_string());
        self
    }

    pub fn build(self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ead xmlns="urn:isbn:1-931666-22-9" xmlns:xlink="http://www.w3.org/1999/xlink">
  <eadheader><eadid>ms1</eadid></eadheader>
  <archdesc level="collection">
    <did><unittitle>Papers</unittitle></did>
    <dsc>{}</dsc>
  </archdesc>
</ead>"#,
            self.components.join("\n")
        )
    }
}

/// Structural-metadata template referencing `ead_href`.
pub fn mets_template(object_id: Option<&str>, ead_href: &str) -> String {
    let objid = object_id
        .map(|id| format!(r#" OBJID="{}""#, id))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:xlink="http://www.w3.org/1999/xlink"{}>
  <mets:metsHdr CREATEDATE="2020-01-01T00:00:00Z"/>
  <mets:dmdSec ID="dmd1">
    <mets:mdRef LOCTYPE="URL" MDTYPE="EAD" xlink:href="{}"/>
  </mets:dmdSec>
  <mets:fileSec/>
</mets:mets>"#,
        objid, ead_href
    )
}
