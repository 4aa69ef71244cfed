use anyhow::{Context, Result};
use magtek_types::{DeviceInfo, ReportField, ReportFormat};
use serde_json::Value;
use xmltree::{Element, EmitterConfig, XMLNode};

pub struct Report<'a> {
    pub info: &'a DeviceInfo,
    pub fields: &'a [ReportField],
    pub raw: bool,
    pub minimal: bool,
}

impl Report<'_> {
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Csv => Ok(self.csv()),
            ReportFormat::Nvp => Ok(self.nvp()),
            ReportFormat::Json => self.json(),
            ReportFormat::Xml => self.xml(),
        }
    }

    fn csv(&self) -> String {
        let mut out = String::new();
        if !self.raw {
            let keys: Vec<&str> = self.fields.iter().map(ReportField::key).collect();
            out.push_str(&keys.join(","));
            out.push('\n');
        }

        let values: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{:?}", self.info.field(*field)))
            .collect();
        out.push_str(&values.join(","));
        out.push('\n');
        out
    }

    fn nvp(&self) -> String {
        let mut out = String::new();
        for field in self.fields {
            if !self.raw {
                out.push_str(field.key());
                out.push(':');
            }
            out.push_str(self.info.field(*field));
            out.push('\n');
        }
        out
    }

    fn document(&self) -> DeviceInfo {
        if self.minimal {
            self.info.minimal()
        } else {
            self.info.clone()
        }
    }

    fn json(&self) -> Result<String> {
        let document = self.document();
        let json = if self.raw {
            serde_json::to_string(&document)
        } else {
            serde_json::to_string_pretty(&document)
        };
        json.context("Unable to serialise device report")
    }

    fn xml(&self) -> Result<String> {
        let value = serde_json::to_value(self.document())?;

        let mut root = Element::new("DeviceInfo");
        if let Value::Object(map) = value {
            for (name, value) in map {
                let mut child = Element::new(&name);
                if let Value::String(text) = value {
                    child.children.push(XMLNode::Text(text));
                }
                root.children.push(XMLNode::Element(child));
            }
        }

        let mut out = Vec::new();
        root.write_with_config(&mut out, EmitterConfig::new().perform_indent(!self.raw))
            .context("Unable to write XML device report")?;
        Ok(String::from_utf8(out)?)
    }
}
