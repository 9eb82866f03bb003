use std::path::PathBuf;

use dt_xsd_tree::TreeError;
use thiserror::Error;

use crate::dispatcher::DispatchError;
use crate::service::ServiceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid server URL {0:?}: {1}")]
    InvalidServer(String, String),
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("the schema failed to parse: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no node at {0:?}")]
    NoSuchNode(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
