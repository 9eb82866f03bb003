use std::time::Duration;

use reqwest::Url;

use crate::cli::Cli;
use crate::error::AppError;
use crate::service::{Operation, ServiceError};

/// Endpoint paths of the composer service, relative to its base URL.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub insert_element_sequence: String,
    pub delete_element: String,
    pub rename_element: String,
    pub change_xsd_type: String,
    pub get_element_occurrences: String,
    pub set_element_occurrences: String,
    pub save_template: String,
    pub save_type: String,
    pub change_root_type_name: String,
    pub delete_bucket: String,
    pub resolve_dependencies: String,
    pub download_xsd: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            insert_element_sequence: "insert-element-sequence".into(),
            delete_element: "delete-element".into(),
            rename_element: "rename-element".into(),
            change_xsd_type: "change-xsd-type".into(),
            get_element_occurrences: "get-element-occurrences".into(),
            set_element_occurrences: "set-element-occurrences".into(),
            save_template: "save-template".into(),
            save_type: "save-type".into(),
            change_root_type_name: "change-root-type-name".into(),
            delete_bucket: "bucket/delete".into(),
            resolve_dependencies: "type/resolve-dependencies".into(),
            download_xsd: "download-xsd".into(),
        }
    }
}

impl Endpoints {
    pub fn path(&self, operation: Operation) -> &str {
        match operation {
            Operation::InsertElementSequence => &self.insert_element_sequence,
            Operation::DeleteElement => &self.delete_element,
            Operation::RenameElement => &self.rename_element,
            Operation::ChangeXsdType => &self.change_xsd_type,
            Operation::GetElementOccurrences => &self.get_element_occurrences,
            Operation::SetElementOccurrences => &self.set_element_occurrences,
            Operation::SaveTemplate => &self.save_template,
            Operation::SaveType => &self.save_type,
            Operation::ChangeRootTypeName => &self.change_root_type_name,
            Operation::DeleteBucket => &self.delete_bucket,
            Operation::ResolveDependencies => &self.resolve_dependencies,
        }
    }
}

/// Connection settings for [`HttpSchemaService`](crate::service::http::HttpSchemaService).
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub timeout: Duration,
    pub session_id: Option<String>,
    pub csrf_token: Option<String>,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn new(server: &str) -> Result<Self, AppError> {
        let mut base_url =
            Url::parse(server).map_err(|e| AppError::InvalidServer(server.into(), e.to_string()))?;
        // Url::join replaces the last path segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(30),
            session_id: None,
            csrf_token: None,
            endpoints: Endpoints::default(),
        })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        let mut config = Self::new(&cli.server)?;
        config.timeout = Duration::from_secs(cli.timeout);
        config.session_id = cli.session_id.clone();
        config.csrf_token = cli.csrf_token.clone();
        Ok(config)
    }

    pub fn url(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::InvalidEndpoint(path.into(), e.to_string()))
    }
}
