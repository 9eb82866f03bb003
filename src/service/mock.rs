use std::cell::RefCell;
use std::collections::VecDeque;

use super::{Request, Response, SchemaService, ServiceError};

/// Records every request and answers from a script, acknowledging once the script runs out.
#[derive(Default)]
pub(crate) struct Recording {
    requests: RefCell<Vec<Request>>,
    answers: RefCell<VecDeque<Result<Response, ServiceError>>>,
    schema: Option<String>,
}

impl Recording {
    pub(crate) fn answering(answers: Vec<Result<Response, ServiceError>>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            ..Self::default()
        }
    }

    /// Serves `schema` from `download_schema`.
    pub(crate) fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

impl SchemaService for Recording {
    fn call(&self, request: &Request) -> Result<Response, ServiceError> {
        self.requests.borrow_mut().push(request.clone());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(Response::Ack))
    }

    fn download_schema(&self) -> Result<String, ServiceError> {
        self.schema
            .clone()
            .ok_or_else(|| ServiceError::Rejected("no composed schema".into()))
    }
}
