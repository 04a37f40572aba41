//! Classification boundary: one image in, one attribute set out, always
//!
//! Every per-image failure (decode, network, malformed response) is
//! converted into the pipeline's sentinel attribute values here, so
//! nothing below the batch driver ever aborts the run and a permanently
//! bad image is recorded once instead of retried forever.

use crate::services::image_loader::{self, PreparedImage};
use crate::services::vision_client::{parse_labeled_response, VisionClient, VisionError};
use crate::types::{Classify, PipelineSpec};
use async_trait::async_trait;
use std::path::Path;

/// Sentinel description for images that could not be decoded
const DECODE_FAILURE_TEXT: &str = "Failed to load image";

/// Classification client wrapping one inference round trip per image
pub struct ClassificationClient {
    vision: VisionClient,
    spec: &'static PipelineSpec,
}

impl ClassificationClient {
    pub fn new(vision: VisionClient, spec: &'static PipelineSpec) -> Self {
        Self { vision, spec }
    }

    async fn call(&self, image: &PreparedImage) -> Result<Vec<String>, VisionError> {
        let text = self.vision.generate(self.spec.instruction, image).await?;
        parse_labeled_response(&text, self.spec.fields)
    }
}

#[async_trait]
impl Classify for ClassificationClient {
    async fn classify(&self, path: &Path) -> Vec<String> {
        let image = match image_loader::prepare_image(path) {
            Ok(image) => image,
            Err(e) => {
                tracing::error!(path = %path.display(), "Error processing image: {}", e);
                return self.spec.sentinel_attributes(DECODE_FAILURE_TEXT);
            }
        };

        match self.call(&image).await {
            Ok(values) => values,
            Err(e) => {
                tracing::error!(path = %path.display(), "Error processing image: {}", e);
                self.spec
                    .sentinel_attributes(&format!("Failed to process: {}", e))
            }
        }
    }
}
