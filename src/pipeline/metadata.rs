//! Document metadata: what the renderer embeds besides the page content.

use crate::config::RenderConfig;
use crate::output::{DocumentMetadata, TextDirection};
use crate::request::RequestContext;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The CMS module that fired the print action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub title: String,
    pub keywords: String,
}

impl ModuleDescriptor {
    pub fn new(title: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            keywords: keywords.into(),
        }
    }
}

/// Derive the metadata for one print request.
///
/// Title and subject both come from the module title. Author and creator
/// come from the initialised render configuration, language and character
/// set from the request.
pub fn document_metadata(
    module: &ModuleDescriptor,
    request: &RequestContext,
    config: &RenderConfig,
) -> DocumentMetadata {
    let meta = DocumentMetadata {
        title: module.title.clone(),
        subject: module.title.clone(),
        keywords: module.keywords.clone(),
        language_code: request.language_code(),
        character_set: request.character_set.clone(),
        author: config.author.clone(),
        creator: config.creator.clone(),
        direction: TextDirection::Ltr,
        page_word: "page".to_string(),
    };
    debug!(title = %meta.title, language = %meta.language_code, "Document metadata derived");
    meta
}
