pub mod http;
#[cfg(test)]
pub(crate) mod mock;

use std::fmt;

use dt_xsd_tree::{MaxOccurs, Occurrences};
use serde::Deserialize;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    InsertElementSequence,
    DeleteElement,
    RenameElement,
    ChangeXsdType,
    GetElementOccurrences,
    SetElementOccurrences,
    SaveTemplate,
    SaveType,
    ChangeRootTypeName,
    DeleteBucket,
    ResolveDependencies,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InsertElementSequence => "insertElementSequence",
            Self::DeleteElement => "deleteElement",
            Self::RenameElement => "renameElement",
            Self::ChangeXsdType => "changeXsdType",
            Self::GetElementOccurrences => "getElementOccurrences",
            Self::SetElementOccurrences => "setElementOccurrences",
            Self::SaveTemplate => "saveTemplate",
            Self::SaveType => "saveType",
            Self::ChangeRootTypeName => "changeRootTypeName",
            Self::DeleteBucket => "deleteBucket",
            Self::ResolveDependencies => "resolveDependencies",
        };
        f.write_str(name)
    }
}

/// An `import`/`include` of an uploaded type, mapped onto a type already known to the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub schema_location: String,
    pub type_id: String,
}

/// An operation descriptor for the composer service, with its operation-specific fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    InsertElementSequence {
        type_id: String,
        xpath: String,
        type_name: String,
        namespace: String,
        path: String,
    },
    DeleteElement {
        xpath: String,
    },
    RenameElement {
        xpath: String,
        new_name: String,
    },
    ChangeXsdType {
        xpath: String,
        new_type: String,
    },
    GetElementOccurrences {
        xpath: String,
    },
    SetElementOccurrences {
        xpath: String,
        min_occurs: String,
        max_occurs: String,
    },
    SaveTemplate {
        template_name: String,
    },
    SaveType {
        type_name: String,
        template_id: String,
    },
    ChangeRootTypeName {
        type_name: String,
    },
    DeleteBucket {
        bucket_id: String,
    },
    /// Uploads a type whose imports and includes point at existing types.
    ResolveDependencies {
        name: String,
        filename: String,
        version_manager_id: String,
        /// The schema text, escaped the way the upload page embeds it.
        xsd_content: String,
        dependencies: Vec<Dependency>,
        buckets: Vec<String>,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::InsertElementSequence { .. } => Operation::InsertElementSequence,
            Self::DeleteElement { .. } => Operation::DeleteElement,
            Self::RenameElement { .. } => Operation::RenameElement,
            Self::ChangeXsdType { .. } => Operation::ChangeXsdType,
            Self::GetElementOccurrences { .. } => Operation::GetElementOccurrences,
            Self::SetElementOccurrences { .. } => Operation::SetElementOccurrences,
            Self::SaveTemplate { .. } => Operation::SaveTemplate,
            Self::SaveType { .. } => Operation::SaveType,
            Self::ChangeRootTypeName { .. } => Operation::ChangeRootTypeName,
            Self::DeleteBucket { .. } => Operation::DeleteBucket,
            Self::ResolveDependencies { .. } => Operation::ResolveDependencies,
        }
    }

    /// The XPath this request addresses, if any.
    pub fn xpath(&self) -> Option<&str> {
        match self {
            Self::InsertElementSequence { xpath, .. }
            | Self::DeleteElement { xpath }
            | Self::RenameElement { xpath, .. }
            | Self::ChangeXsdType { xpath, .. }
            | Self::GetElementOccurrences { xpath }
            | Self::SetElementOccurrences { xpath, .. } => Some(xpath.as_str()),
            _ => None,
        }
    }

    /// Form fields as posted by the composer's own page.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::InsertElementSequence {
                type_id,
                xpath,
                type_name,
                namespace,
                path,
            } => vec![
                ("typeID", type_id.as_str()),
                ("xpath", xpath.as_str()),
                ("typeName", type_name.as_str()),
                ("namespace", namespace.as_str()),
                ("path", path.as_str()),
            ],
            Self::DeleteElement { xpath } | Self::GetElementOccurrences { xpath } => {
                vec![("xpath", xpath.as_str())]
            }
            Self::RenameElement { xpath, new_name } => {
                vec![("xpath", xpath.as_str()), ("newName", new_name.as_str())]
            }
            Self::ChangeXsdType { xpath, new_type } => {
                vec![("xpath", xpath.as_str()), ("newType", new_type.as_str())]
            }
            Self::SetElementOccurrences {
                xpath,
                min_occurs,
                max_occurs,
            } => vec![
                ("xpath", xpath.as_str()),
                ("minOccurs", min_occurs.as_str()),
                ("maxOccurs", max_occurs.as_str()),
            ],
            Self::SaveTemplate { template_name } => vec![("templateName", template_name.as_str())],
            Self::SaveType {
                type_name,
                template_id,
            } => vec![("typeName", type_name.as_str()), ("templateID", template_id.as_str())],
            Self::ChangeRootTypeName { type_name } => vec![("typeName", type_name.as_str())],
            Self::DeleteBucket { bucket_id } => vec![("bucket_id", bucket_id.as_str())],
            Self::ResolveDependencies {
                name,
                filename,
                version_manager_id,
                xsd_content,
                dependencies,
                buckets,
            } => {
                let mut fields = vec![
                    ("xsd_content", xsd_content.as_str()),
                    ("name", name.as_str()),
                    ("filename", filename.as_str()),
                    ("version_manager_id", version_manager_id.as_str()),
                ];
                // list fields repeat their key, as jQuery serializes arrays
                for dependency in dependencies {
                    fields.push(("schemaLocations[]", dependency.schema_location.as_str()));
                    fields.push(("dependencies[]", dependency.type_id.as_str()));
                }
                fields.extend(buckets.iter().map(|bucket| ("buckets[]", bucket.as_str())));
                fields
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Ack,
    NewElement { markup: String },
    Occurrences(Occurrences),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with a failure status; the body is shown to the user as is.
    #[error("{0}")]
    Rejected(String),
    #[error("could not reach the composer service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response to {operation}: {reason}")]
    Decode {
        operation: Operation,
        reason: String,
    },
    #[error("invalid endpoint {0:?}: {1}")]
    InvalidEndpoint(String, String),
    #[error("{0:?} cannot be sent as a header value")]
    InvalidCredentials(String),
}

/// The remote side that owns the composed schema.
pub trait SchemaService {
    fn call(&self, request: &Request) -> Result<Response, ServiceError>;

    /// Current composed schema as XSD text.
    fn download_schema(&self) -> Result<String, ServiceError>;
}

#[derive(Deserialize)]
pub(crate) struct NewElementBody {
    pub new_element: String,
}

/// The service reports occurrences either as numbers or as attribute text.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum OccursValue {
    Number(u64),
    Text(String),
}

impl OccursValue {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OccurrencesBody {
    pub min_occurs: OccursValue,
    pub max_occurs: OccursValue,
}

impl OccurrencesBody {
    pub(crate) fn into_occurrences(self) -> Result<Occurrences, String> {
        let min = self.min_occurs.as_text();
        let max = self.max_occurs.as_text();
        let min = min
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid minOccurs {min:?}"))?;
        let max = MaxOccurs::parse(&max).map_err(|e| e.to_string())?;
        Ok(Occurrences::new(min, max))
    }
}

/// Decodes the success body of `operation`.
pub(crate) fn decode_body(operation: Operation, body: &str) -> Result<Response, ServiceError> {
    let decode_error = |reason: String| ServiceError::Decode { operation, reason };
    match operation {
        Operation::InsertElementSequence => {
            let body: NewElementBody =
                serde_json::from_str(body).map_err(|e| decode_error(e.to_string()))?;
            Ok(Response::NewElement {
                markup: body.new_element,
            })
        }
        Operation::GetElementOccurrences => {
            let body: OccurrencesBody =
                serde_json::from_str(body).map_err(|e| decode_error(e.to_string()))?;
            body.into_occurrences()
                .map(Response::Occurrences)
                .map_err(decode_error)
        }
        _ => Ok(Response::Ack),
    }
}
