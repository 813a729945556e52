use super::request::PipelineRequest;
use crate::error::RequestError;

/// A trait for editor-side documents that can be turned into a `PipelineRequest`.
///
/// This is the extension point for feeding the engine from formats other than the
/// native request JSON. Implement it on your own structs to translate node and
/// edge records into the engine's model.
///
/// # Example
///
/// ```rust,no_run
/// use nagare::prelude::*;
/// use nagare::error::RequestError;
///
/// struct Block { name: String, op: String }
/// struct Sheet { blocks: Vec<Block> }
///
/// impl IntoPipeline for Sheet {
///     fn into_pipeline(self) -> std::result::Result<PipelineRequest, RequestError> {
///         let nodes = self
///             .blocks
///             .into_iter()
///             .map(|b| NodeRecord::new(b.name, b.op))
///             .collect();
///         Ok(PipelineRequest::new(nodes, vec![]))
///     }
/// }
/// ```
pub trait IntoPipeline {
    /// Consumes the document and converts it into an engine request.
    fn into_pipeline(self) -> Result<PipelineRequest, RequestError>;
}

impl IntoPipeline for PipelineRequest {
    fn into_pipeline(self) -> Result<PipelineRequest, RequestError> {
        Ok(self)
    }
}
