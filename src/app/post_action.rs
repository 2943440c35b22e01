//! The value a finished session hands back to its caller

use crate::mold::RequestMold;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostActionKind {
    CreateSimpleRequest,
    CreateComplexRequest,
    EditRequest,
    PrintRequest,
    RenameRequest,
    CopyRequest,
}

/// What the caller must do once the session has ended
#[derive(Clone, Debug)]
pub struct PostAction {
    pub kind: PostActionKind,
    /// Name for creations, file path for edits, response text for prints
    pub payload: String,
    /// The request the action concerns, when there is one
    pub context: Option<RequestMold>,
}

impl PostAction {
    pub fn new(kind: PostActionKind, payload: impl Into<String>, context: Option<RequestMold>) -> Self {
        PostAction {
            kind,
            payload: payload.into(),
            context,
        }
    }
}
