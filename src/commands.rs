//! Runs one CLI command against a schema tree and a composer service.

use std::path::Path;

use dt_xsd_tree::{read_tree, NodeId, Occurrences, SchemaTree, XPath};
use encoding_rs::{Encoding, UTF_8};
use tracing::info;

use crate::cli::Command;
use crate::dispatcher::{Dispatcher, DocumentIntent, EditIntent};
use crate::error::AppError;
use crate::service::SchemaService;

/// What is left to print once a command went through.
#[derive(Debug, PartialEq)]
pub enum Report {
    /// The schema projection, after any edit.
    Schema,
    Occurrences(Occurrences),
    Done,
}

/// Reads a text file, honoring a byte order mark.
pub fn read_text(path: &Path) -> Result<String, AppError> {
    let buf = std::fs::read(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (decoded, _, _) = Encoding::decode(UTF_8, &buf);
    Ok(decoded.into_owned())
}

/// Loads the schema to edit from `path`, or the composed one from the service.
pub fn load_schema(
    path: Option<&Path>,
    allow_dtd: bool,
    service: &impl SchemaService,
) -> Result<SchemaTree, AppError> {
    let text = match path {
        Some(path) => read_text(path)?,
        None => service.download_schema()?,
    };

    let options = roxmltree::ParsingOptions {
        allow_dtd,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(&text, options)?;
    Ok(read_tree(&document)?)
}

pub fn find(tree: &SchemaTree, target: &str) -> Result<NodeId, AppError> {
    let xpath: XPath = target.parse()?;
    tree.find(&xpath)
        .ok_or_else(|| AppError::NoSuchNode(target.to_string()))
}

pub fn execute<S: SchemaService>(
    dispatcher: &mut Dispatcher<S>,
    tree: &mut SchemaTree,
    command: &Command,
) -> Result<Report, AppError> {
    let outcome = match command {
        Command::Show => return Ok(Report::Schema),
        Command::Insert {
            target,
            type_id,
            type_name,
        } => {
            let node = find(tree, target)?;
            let intent = EditIntent::Insert {
                type_id: type_id.clone(),
                type_name: type_name.clone(),
            };
            dispatcher.run(tree, node, &intent)?
        }
        Command::Delete { target } => {
            let node = find(tree, target)?;
            dispatcher.run(tree, node, &EditIntent::Delete)?
        }
        Command::Rename { target, name } => {
            let node = find(tree, target)?;
            let intent = EditIntent::Rename {
                new_name: name.clone(),
            };
            dispatcher.run(tree, node, &intent)?
        }
        Command::Retype { target, new_type } => {
            let node = find(tree, target)?;
            let intent = EditIntent::Retype {
                new_type: new_type.clone(),
            };
            dispatcher.run(tree, node, &intent)?
        }
        Command::Occurrences { target, min, max } => {
            let node = find(tree, target)?;
            let (Some(min), Some(max)) = (min, max) else {
                let occurs = dispatcher.load_occurrences(tree, node)?;
                return Ok(Report::Occurrences(occurs));
            };
            let intent = EditIntent::SetOccurrences {
                min_occurs: min.clone(),
                max_occurs: max.clone(),
            };
            dispatcher.run(tree, node, &intent)?
        }
        Command::SaveTemplate { name } => {
            let intent = DocumentIntent::SaveTemplate { name: name.clone() };
            dispatcher.run_document(tree, &intent)?
        }
        Command::SaveType { name, template_id } => {
            let intent = DocumentIntent::SaveType {
                name: name.clone(),
                template_id: template_id.clone(),
            };
            dispatcher.run_document(tree, &intent)?
        }
        Command::RenameRootType { name } => {
            let intent = DocumentIntent::ChangeRootTypeName { name: name.clone() };
            dispatcher.run_document(tree, &intent)?
        }
        Command::DeleteBucket { id } => {
            let intent = DocumentIntent::DeleteBucket {
                bucket_id: id.clone(),
            };
            dispatcher.run_document(tree, &intent)?
        }
        Command::ResolveDependencies {
            xsd,
            name,
            filename,
            version_manager_id,
            dependencies,
            buckets,
        } => {
            let filename = match filename {
                Some(filename) => filename.clone(),
                None => xsd
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            let intent = DocumentIntent::ResolveDependencies {
                name: name.clone(),
                filename,
                version_manager_id: version_manager_id.clone(),
                xsd_content: read_text(xsd)?,
                dependencies: dependencies.clone(),
                buckets: buckets.clone(),
            };
            dispatcher.run_document(tree, &intent)?
        }
    };

    info!("{outcome:?}");
    Ok(if command.needs_schema() {
        Report::Schema
    } else {
        Report::Done
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatchError;
    use crate::service::mock::Recording;
    use crate::service::{Dependency, Request, Response};
    use dt_xsd_tree::{MaxOccurs, TreeError};
    use std::path::PathBuf;

    const PERSON: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="person" type="Person"/>
  <xs:complexType name="Person">
    <xs:sequence>
      <xs:element name="first" type="xs:string"/>
      <xs:element name="last" type="xs:string"/>
      <xs:element name="nick" type="xs:string" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    const NICK: &str = "xs:complexType/xs:sequence/xs:element[3]";

    fn session(service: Recording) -> (Dispatcher<Recording>, SchemaTree) {
        let service = service.with_schema(PERSON);
        let tree = load_schema(None, false, &service).unwrap();
        (Dispatcher::new(service), tree)
    }

    /// A file under the temp directory that is removed again on drop.
    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str, contents: &[u8]) -> Self {
            let path = std::env::temp_dir().join(format!("{}-{name}", std::process::id()));
            std::fs::write(&path, contents).unwrap();
            Self(path)
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn delete_by_xpath_renumbers_the_sequence() {
        let (mut dispatcher, mut tree) = session(Recording::default());
        let command = Command::Delete {
            target: "xs:complexType/xs:sequence/xs:element[2]".into(),
        };

        let report = execute(&mut dispatcher, &mut tree, &command).unwrap();
        assert_eq!(report, Report::Schema);
        assert_eq!(
            dispatcher.service().requests(),
            vec![Request::DeleteElement {
                xpath: "xs:complexType/xs:sequence/xs:element[2]".into()
            }]
        );

        let moved = find(&tree, "xs:complexType/xs:sequence/xs:element[2]").unwrap();
        assert_eq!(tree.get(moved).unwrap().name.as_deref(), Some("nick"));
        assert!(matches!(
            find(&tree, NICK),
            Err(AppError::NoSuchNode(target)) if target == NICK
        ));
    }

    #[test]
    fn occurrences_without_bounds_are_fetched() {
        let occurs = Occurrences::new(0, MaxOccurs::Count(1));
        let service = Recording::answering(vec![Ok(Response::Occurrences(occurs))]);
        let (mut dispatcher, mut tree) = session(service);
        let command = Command::Occurrences {
            target: NICK.into(),
            min: None,
            max: None,
        };

        let report = execute(&mut dispatcher, &mut tree, &command).unwrap();
        assert_eq!(report, Report::Occurrences(occurs));
        assert_eq!(
            dispatcher.service().requests(),
            vec![Request::GetElementOccurrences { xpath: NICK.into() }]
        );
    }

    #[test]
    fn occurrences_with_bounds_are_set() {
        let (mut dispatcher, mut tree) = session(Recording::default());
        let command = Command::Occurrences {
            target: NICK.into(),
            min: Some("0".into()),
            max: Some("unbounded".into()),
        };

        execute(&mut dispatcher, &mut tree, &command).unwrap();
        let nick = find(&tree, NICK).unwrap();
        assert_eq!(
            tree.get(nick).unwrap().occurs,
            Some(Occurrences::new(0, MaxOccurs::Unbounded))
        );
    }

    #[test]
    fn unknown_targets_send_nothing() {
        let (mut dispatcher, mut tree) = session(Recording::default());
        let command = Command::Delete {
            target: "xs:complexType/xs:sequence/xs:element[4]".into(),
        };
        assert!(matches!(
            execute(&mut dispatcher, &mut tree, &command),
            Err(AppError::NoSuchNode(_))
        ));

        let command = Command::Rename {
            target: "xs:element[0]".into(),
            name: "x".into(),
        };
        assert!(matches!(
            execute(&mut dispatcher, &mut tree, &command),
            Err(AppError::Tree(TreeError::InvalidSegment(_)))
        ));
        assert!(dispatcher.service().requests().is_empty());
    }

    #[test]
    fn local_validation_surfaces_as_a_dispatch_error() {
        let (mut dispatcher, mut tree) = session(Recording::default());
        let command = Command::Rename {
            target: NICK.into(),
            name: String::new(),
        };
        assert!(matches!(
            execute(&mut dispatcher, &mut tree, &command),
            Err(AppError::Dispatch(DispatchError::LocalValidation { .. }))
        ));
    }

    #[test]
    fn show_only_prints() {
        let (mut dispatcher, mut tree) = session(Recording::default());
        assert_eq!(
            execute(&mut dispatcher, &mut tree, &Command::Show).unwrap(),
            Report::Schema
        );
        assert!(dispatcher.service().requests().is_empty());
    }

    #[test]
    fn schema_files_may_start_with_a_byte_order_mark() {
        let mut contents = b"\xEF\xBB\xBF".to_vec();
        contents.extend_from_slice(PERSON.as_bytes());
        let file = TempFile::new("person.xsd", &contents);

        let tree = load_schema(Some(&file.0), false, &Recording::default()).unwrap();
        assert!(find(&tree, NICK).is_ok());
    }

    #[test]
    fn missing_files_are_io_errors() {
        let path = std::env::temp_dir().join("no-such-dir-for-xsd-composer/a.xsd");
        assert!(matches!(
            load_schema(Some(&path), false, &Recording::default()),
            Err(AppError::Io { .. })
        ));
    }

    #[test]
    fn upload_reads_the_file_and_names_it() {
        let file = TempFile::new("address.xsd", PERSON.as_bytes());
        let mut dispatcher = Dispatcher::new(Recording::default());
        let mut tree = SchemaTree::new(dt_xsd_tree::Segment::prefixed("xs", "schema"));
        let command = Command::ResolveDependencies {
            xsd: file.0.clone(),
            name: "Address".into(),
            filename: None,
            version_manager_id: None,
            dependencies: vec![Dependency {
                schema_location: "street.xsd".into(),
                type_id: "7".into(),
            }],
            buckets: vec![],
        };

        let report = execute(&mut dispatcher, &mut tree, &command).unwrap();
        assert_eq!(report, Report::Done);
        let requests = dispatcher.service().requests();
        let Request::ResolveDependencies {
            filename,
            xsd_content,
            ..
        } = &requests[0]
        else {
            panic!("sent {requests:?}");
        };
        assert_eq!(filename, &format!("{}-address.xsd", std::process::id()));
        assert!(xsd_content.starts_with("&lt;xs:schema"));
    }
}
