/*
[INPUT]:  Presentation documents attached to a create call
[OUTPUT]: `<modules>` XML request body
[POS]:    XML layer - request body encoding for create
[UPDATE]: When the server's module preload format changes
*/

use serde::Serialize;

use crate::http::{BbbError, Result};
use crate::types::Presentation;

#[derive(Serialize)]
#[serde(rename = "modules")]
struct ModulesXml<'a> {
    module: Vec<ModuleXml<'a>>,
}

#[derive(Serialize)]
struct ModuleXml<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    document: Vec<DocumentXml<'a>>,
}

#[derive(Serialize)]
struct DocumentXml<'a> {
    #[serde(rename = "@url", skip_serializing_if = "is_blank")]
    url: &'a str,
    #[serde(rename = "@name", skip_serializing_if = "is_blank")]
    name: &'a str,
    #[serde(rename = "$text", skip_serializing_if = "is_blank")]
    content: &'a str,
}

fn is_blank(value: &&str) -> bool {
    value.is_empty()
}

/// Build `<modules><module name="presentation"><document .../></module></modules>`
pub fn presentation_modules(documents: &[Presentation]) -> Result<String> {
    let modules = ModulesXml {
        module: vec![ModuleXml {
            name: "presentation",
            document: documents
                .iter()
                .map(|doc| DocumentXml {
                    url: &doc.url,
                    name: &doc.name,
                    content: &doc.content,
                })
                .collect(),
        }],
    };

    quick_xml::se::to_string(&modules)
        .map_err(|err| BbbError::Decode(format!("encode presentation modules: {err}")))
}
