//! Turns the user's edit intents into composer service requests and applies the answers to the
//! local schema tree.

pub mod dialog;
pub mod menu;
pub mod validation;

use dt_xsd_tree::{
    next_child_segment, reconcile, resolve, NodeId, Occurrences, SchemaNode, SchemaTree, Segment,
    TreeError,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use self::dialog::{Dialog, DialogKind, Generation};
use self::menu::{Action, Menu};
use crate::service::{Dependency, Request, Response, SchemaService, ServiceError};

pub const INTERNAL_INCONSISTENCY: &str =
    "Internal tree inconsistency: the selected node could not be located in the schema.";
pub const NOT_AVAILABLE: &str = "This action is not available for the selected node.";
/// Prepended to the service's answer when a template is refused.
pub const INVALID_SCHEMA: &str = "Not a valid XML schema.";

/// An edit of the node the user selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditIntent {
    Insert { type_id: String, type_name: String },
    Delete,
    Rename { new_name: String },
    Retype { new_type: String },
    /// Bounds as typed; validated before anything is sent.
    SetOccurrences {
        min_occurs: String,
        max_occurs: String,
    },
}

impl EditIntent {
    fn action(&self) -> Action {
        match self {
            Self::Insert { .. } => Action::Insert,
            Self::Delete => Action::Delete,
            Self::Rename { .. } => Action::Rename,
            Self::Retype { .. } => Action::Retype,
            Self::SetOccurrences { .. } => Action::SetOccurrences,
        }
    }

    pub fn dialog(&self) -> DialogKind {
        match self {
            Self::Insert { .. } => DialogKind::InsertElement,
            Self::Delete => DialogKind::DeleteElement,
            Self::Rename { .. } => DialogKind::RenameElement,
            Self::Retype { .. } => DialogKind::ChangeType,
            Self::SetOccurrences { .. } => DialogKind::Occurrences,
        }
    }
}

/// An operation on the composed document as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentIntent {
    SaveTemplate { name: String },
    SaveType { name: String, template_id: String },
    ChangeRootTypeName { name: String },
    DeleteBucket { bucket_id: String },
    /// Uploads a type, pointing its imports and includes at existing types. Without a
    /// version manager a new one titled `name` is created.
    ResolveDependencies {
        name: String,
        filename: String,
        version_manager_id: Option<String>,
        xsd_content: String,
        dependencies: Vec<Dependency>,
        buckets: Vec<String>,
    },
}

impl DocumentIntent {
    pub fn dialog(&self) -> DialogKind {
        match self {
            Self::SaveTemplate { .. } => DialogKind::SaveTemplate,
            Self::SaveType { .. } => DialogKind::SaveType,
            Self::ChangeRootTypeName { .. } => DialogKind::RootTypeName,
            Self::DeleteBucket { .. } => DialogKind::DeleteBucket,
            Self::ResolveDependencies { .. } => DialogKind::ResolveDependencies,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The input was refused before contacting the service.
    #[error("{}", messages.join("\n"))]
    LocalValidation { messages: Vec<String> },
    #[error("{0}")]
    RemoteRejection(String),
    #[error("{}", INTERNAL_INCONSISTENCY)]
    InternalInconsistency,
    #[error("no {0:?} dialog is open")]
    NoDialog(DialogKind),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Service(ServiceError),
}

impl DispatchError {
    fn local(messages: Vec<String>) -> Self {
        Self::LocalValidation { messages }
    }
}

/// What the answer of a confirmed request does to the tree.
#[derive(Clone, Debug, PartialEq)]
enum Effect {
    Insert { parent: NodeId, type_name: String },
    Delete(NodeId),
    Rename(NodeId, String),
    Retype(NodeId, String),
    SetOccurrences(NodeId, Occurrences),
    RenameRootType(String),
    None,
}

/// A confirmed request waiting for its answer.
#[derive(Clone, Debug)]
pub struct Pending {
    generation: Generation,
    kind: DialogKind,
    request: Request,
    effect: Effect,
}

impl Pending {
    pub fn request(&self) -> &Request {
        &self.request
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Inserted(NodeId),
    /// The detached node, with its subtree already gone from the tree.
    Deleted(SchemaNode),
    Renamed(NodeId),
    Retyped(NodeId),
    OccurrencesSet(NodeId, Occurrences),
    RootTypeRenamed(Option<NodeId>),
    Saved,
    BucketDeleted,
    TypeUploaded,
    /// The answer belonged to a dialog that is no longer waiting for it.
    Stale,
}

pub struct Dispatcher<S> {
    service: S,
    dialog: Dialog,
}

impl<S: SchemaService> Dispatcher<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            dialog: Dialog::default(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn open(&mut self, kind: DialogKind) -> Generation {
        self.dialog.open(kind)
    }

    fn ensure_open(&self, kind: DialogKind) -> Result<(), DispatchError> {
        match self.dialog.state() {
            dialog::DialogState::Open { kind: open, .. } if open == kind => Ok(()),
            _ => Err(DispatchError::NoDialog(kind)),
        }
    }

    /// Resolves `target`, closing the dialog when the tree cannot account for it.
    fn target_path(&mut self, tree: &SchemaTree, target: NodeId) -> Result<String, DispatchError> {
        match resolve(tree, target) {
            Ok(xpath) => Ok(xpath.to_string()),
            Err(TreeError::UnresolvedPath(_) | TreeError::NodeNotFound(_)) => {
                warn!("{target:?} could not be resolved");
                self.dialog.cancel();
                Err(DispatchError::InternalInconsistency)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validates `intent` against the open dialog and turns it into a request.
    ///
    /// Local failures leave the dialog open and send nothing.
    #[instrument(skip(self, tree))]
    pub fn confirm(
        &mut self,
        tree: &SchemaTree,
        target: NodeId,
        intent: &EditIntent,
    ) -> Result<Pending, DispatchError> {
        let kind = intent.dialog();
        self.ensure_open(kind)?;

        let offered = Menu::of(tree, target).is_some_and(|menu| menu.offers(intent.action()));
        if !offered {
            if !tree.contains(target) {
                self.dialog.cancel();
                return Err(DispatchError::InternalInconsistency);
            }
            return Err(DispatchError::local(vec![NOT_AVAILABLE.to_string()]));
        }

        let effect = match intent {
            EditIntent::Insert { type_name, .. } => {
                validation::check_name(type_name).map_err(DispatchError::local)?;
                Effect::Insert {
                    parent: target,
                    type_name: type_name.clone(),
                }
            }
            EditIntent::Delete => Effect::Delete(target),
            EditIntent::Rename { new_name } => {
                validation::check_name(new_name).map_err(DispatchError::local)?;
                Effect::Rename(target, new_name.clone())
            }
            EditIntent::Retype { new_type } => {
                validation::check_name(new_type).map_err(DispatchError::local)?;
                Effect::Retype(target, new_type.clone())
            }
            EditIntent::SetOccurrences {
                min_occurs,
                max_occurs,
            } => {
                let occurs = validation::check_occurrences(min_occurs, max_occurs)
                    .map_err(DispatchError::local)?;
                Effect::SetOccurrences(target, occurs)
            }
        };

        let xpath = self.target_path(tree, target)?;
        let request = match intent {
            EditIntent::Insert { type_id, type_name } => {
                let like = element_like(tree, target)?;
                Request::InsertElementSequence {
                    type_id: type_id.clone(),
                    xpath,
                    type_name: type_name.clone(),
                    namespace: like.namespace_prefix.clone().unwrap_or_default(),
                    path: next_child_segment(tree, target, &like)?.to_string(),
                }
            }
            EditIntent::Delete => Request::DeleteElement { xpath },
            EditIntent::Rename { new_name } => Request::RenameElement {
                xpath,
                new_name: new_name.clone(),
            },
            EditIntent::Retype { new_type } => Request::ChangeXsdType {
                xpath,
                new_type: new_type.clone(),
            },
            EditIntent::SetOccurrences {
                min_occurs,
                max_occurs,
            } => Request::SetElementOccurrences {
                xpath,
                min_occurs: min_occurs.trim().to_string(),
                max_occurs: max_occurs.trim().to_string(),
            },
        };

        self.in_flight(kind, request, effect)
    }

    #[instrument(skip(self))]
    pub fn confirm_document(&mut self, intent: &DocumentIntent) -> Result<Pending, DispatchError> {
        let kind = intent.dialog();
        self.ensure_open(kind)?;

        let (request, effect) = match intent {
            DocumentIntent::SaveTemplate { name } => {
                validation::check_name(name).map_err(DispatchError::local)?;
                let request = Request::SaveTemplate {
                    template_name: name.clone(),
                };
                (request, Effect::None)
            }
            DocumentIntent::SaveType { name, template_id } => {
                validation::check_name(name).map_err(DispatchError::local)?;
                let request = Request::SaveType {
                    type_name: name.clone(),
                    template_id: template_id.clone(),
                };
                (request, Effect::None)
            }
            DocumentIntent::ChangeRootTypeName { name } => {
                validation::check_root_type_name(name).map_err(DispatchError::local)?;
                let request = Request::ChangeRootTypeName {
                    type_name: name.clone(),
                };
                (request, Effect::RenameRootType(name.clone()))
            }
            DocumentIntent::DeleteBucket { bucket_id } => {
                let request = Request::DeleteBucket {
                    bucket_id: bucket_id.clone(),
                };
                (request, Effect::None)
            }
            DocumentIntent::ResolveDependencies {
                name,
                filename,
                version_manager_id,
                xsd_content,
                dependencies,
                buckets,
            } => {
                validation::check_name(filename).map_err(DispatchError::local)?;
                if version_manager_id.is_none() {
                    validation::check_name(name).map_err(DispatchError::local)?;
                }
                let request = Request::ResolveDependencies {
                    name: name.clone(),
                    filename: filename.clone(),
                    version_manager_id: version_manager_id.clone().unwrap_or_default(),
                    xsd_content: escape_html(xsd_content),
                    dependencies: dependencies.clone(),
                    buckets: buckets.clone(),
                };
                (request, Effect::None)
            }
        };

        self.in_flight(kind, request, effect)
    }

    fn in_flight(
        &mut self,
        kind: DialogKind,
        request: Request,
        effect: Effect,
    ) -> Result<Pending, DispatchError> {
        let generation = self
            .dialog
            .confirm(kind)
            .ok_or(DispatchError::NoDialog(kind))?;
        debug!("{} in flight ({generation:?})", request.operation());
        Ok(Pending {
            generation,
            kind,
            request,
            effect,
        })
    }

    /// Applies the service's answer to `pending`.
    ///
    /// Answers for a dialog that was closed or replaced in the meantime are dropped. A failed
    /// request leaves the tree as it was and reopens the dialog.
    #[instrument(skip_all, fields(operation = %pending.request.operation()))]
    pub fn complete(
        &mut self,
        tree: &mut SchemaTree,
        pending: Pending,
        result: Result<Response, ServiceError>,
    ) -> Result<Outcome, DispatchError> {
        if !self.dialog.is_awaiting(pending.generation) {
            debug!("dropping answer for {:?}", pending.generation);
            return Ok(Outcome::Stale);
        }

        let response = match result {
            Ok(response) => response,
            Err(ServiceError::Rejected(message)) => {
                self.dialog.rejected(pending.generation);
                warn!("rejected: {message}");
                let message = match pending.kind {
                    DialogKind::SaveTemplate => format!("{INVALID_SCHEMA}{message}"),
                    _ => message,
                };
                return Err(DispatchError::RemoteRejection(message));
            }
            Err(e) => {
                self.dialog.rejected(pending.generation);
                return Err(DispatchError::Service(e));
            }
        };

        let outcome = match apply(tree, pending.effect, response, pending.kind) {
            Ok(outcome) => outcome,
            Err(e) => {
                // the service holds the change but the local tree cannot follow it
                warn!("could not apply the answer: {e}");
                self.dialog.cancel();
                return Err(DispatchError::InternalInconsistency);
            }
        };
        self.dialog.applied(pending.generation);
        info!("{} applied", pending.request.operation());
        Ok(outcome)
    }

    /// Opens the dialog for `intent`, confirms it and applies the answer.
    pub fn run(
        &mut self,
        tree: &mut SchemaTree,
        target: NodeId,
        intent: &EditIntent,
    ) -> Result<Outcome, DispatchError> {
        self.open(intent.dialog());
        let pending = self.confirm(tree, target, intent)?;
        let result = self.service.call(pending.request());
        self.complete(tree, pending, result)
    }

    pub fn run_document(
        &mut self,
        tree: &mut SchemaTree,
        intent: &DocumentIntent,
    ) -> Result<Outcome, DispatchError> {
        self.open(intent.dialog());
        let pending = self.confirm_document(intent)?;
        let result = self.service.call(pending.request());
        self.complete(tree, pending, result)
    }

    /// Opens the occurrences dialog of `target`, pre-filled with the bounds the service knows.
    #[instrument(skip(self, tree))]
    pub fn load_occurrences(
        &mut self,
        tree: &SchemaTree,
        target: NodeId,
    ) -> Result<Occurrences, DispatchError> {
        self.open(DialogKind::Occurrences);
        if !Menu::of(tree, target).is_some_and(|menu| menu.offers(Action::SetOccurrences)) {
            return Err(DispatchError::local(vec![NOT_AVAILABLE.to_string()]));
        }
        let xpath = self.target_path(tree, target)?;

        match self.service.call(&Request::GetElementOccurrences { xpath }) {
            Ok(Response::Occurrences(occurs)) => Ok(occurs),
            Ok(other) => {
                warn!("expected occurrences, got {other:?}");
                Ok(tree.get(target)?.occurs.unwrap_or_default())
            }
            Err(ServiceError::Rejected(message)) => Err(DispatchError::RemoteRejection(message)),
            Err(e) => Err(DispatchError::Service(e)),
        }
    }
}

/// The upload page embeds the schema as HTML text, which the service unescapes.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// The segment of an element inserted into `sequence`: `element` under the sequence's prefix.
fn element_like(tree: &SchemaTree, sequence: NodeId) -> Result<Segment, TreeError> {
    let prefix = tree.get(sequence)?.segment.namespace_prefix.clone();
    Ok(Segment::new(prefix, "element"))
}

fn apply(
    tree: &mut SchemaTree,
    effect: Effect,
    response: Response,
    kind: DialogKind,
) -> Result<Outcome, TreeError> {
    let outcome = match effect {
        Effect::Insert { parent, type_name } => {
            let like = element_like(tree, parent)?;
            let mut node = SchemaNode::new(next_child_segment(tree, parent, &like)?);
            node.name = Some(type_name.clone());
            node.type_name = Some(type_name);
            node.occurs = Some(Occurrences::default());
            if let Response::NewElement { markup } = response {
                node.markup = Some(markup);
            }
            let id = tree.append(parent, node)?;
            tree.renumber_group(parent, &like, None);
            Outcome::Inserted(id)
        }
        Effect::Delete(target) => {
            reconcile(tree, target)?;
            Outcome::Deleted(tree.detach(target)?)
        }
        Effect::Rename(target, name) => {
            tree.get_mut(target)?.name = Some(name);
            Outcome::Renamed(target)
        }
        Effect::Retype(target, type_name) => {
            tree.get_mut(target)?.type_name = Some(type_name);
            Outcome::Retyped(target)
        }
        Effect::SetOccurrences(target, occurs) => {
            tree.get_mut(target)?.occurs = Some(occurs);
            Outcome::OccurrencesSet(target, occurs)
        }
        Effect::RenameRootType(name) => Outcome::RootTypeRenamed(rename_root_type(tree, &name)?),
        Effect::None => match kind {
            DialogKind::DeleteBucket => Outcome::BucketDeleted,
            DialogKind::ResolveDependencies => Outcome::TypeUploaded,
            _ => Outcome::Saved,
        },
    };
    Ok(outcome)
}

/// Renames the first global type and points the global elements using it at the new name.
fn rename_root_type(tree: &mut SchemaTree, name: &str) -> Result<Option<NodeId>, TreeError> {
    let root = tree.root();
    let globals = tree.children(root).to_vec();
    let Some(root_type) = globals.iter().copied().find(|&id| {
        tree.node(id).is_some_and(|node| {
            matches!(
                node.segment.local_name.as_str(),
                "complexType" | "simpleType"
            )
        })
    }) else {
        debug!("no global type to rename");
        return Ok(None);
    };

    let previous = tree.get_mut(root_type)?.name.replace(name.to_string());
    for id in globals {
        let node = tree.get_mut(id)?;
        if node.segment.local_name == "element" && previous.is_some() && node.type_name == previous
        {
            node.type_name = Some(name.to_string());
        }
    }
    Ok(Some(root_type))
}
