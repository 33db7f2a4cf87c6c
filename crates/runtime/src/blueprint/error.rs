use std::path::PathBuf;

use thiserror::Error;

use action_node::TreeError;

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("failed to read blueprint {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse blueprint")]
    Parse(#[from] ron::error::SpannedError),

    #[error("node `{node}` references unknown node `{reference}`")]
    UnknownReference { node: String, reference: String },

    #[error("trigger on {trigger} targets unknown node `{target}`")]
    UnknownTarget { trigger: String, target: String },

    #[error("node `{node}` uses unregistered leaf kind `{kind}`")]
    UnknownLeafKind { node: String, kind: String },

    #[error("node `{node}`: {reason}")]
    InvalidParam { node: String, reason: String },

    #[error(transparent)]
    Tree(#[from] TreeError),
}
