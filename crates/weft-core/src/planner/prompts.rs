//! Prompt text handed to the planning model.
//!
//! The system prompt teaches the model the plan markup dialect; the
//! classifier prompt constrains the template-selection turn to a single
//! word so the answer parses as a [`super::TemplateKind`].

/// Baseline design guidance prepended to every project conversation.
pub const BASE_PROMPT: &str = "For all projects I ask you to build, make them beautiful, \
not cookie cutter. Make webpages that are fully featured and worthy for production.\n\n\
By default, use plain JavaScript or TypeScript with sensible tooling. Use stock icons \
and placeholder images from public sources; do not install icon packs unless asked.";

/// One-word classification instruction.
///
/// The reply is parsed with `TemplateKind::from_str`, so anything beyond
/// the single word is an error at the call site.
pub const CLASSIFIER_PROMPT: &str = "Return either 'node' or 'react' based on what you \
think this project should be. Only return a single word: either 'node' or 'react'. \
Do not return anything extra.";

/// Build the full system prompt, including the markup schema the parser
/// understands.
pub fn system_prompt() -> String {
    format!(
        "You are Weft, an expert developer that scaffolds whole projects in a single reply.\n\
         \n\
         <response_format>\n\
         Wrap the entire project in exactly one artifact block:\n\
         \n\
         <weftArtifact id=\"project-id\" title=\"Project title\">\n\
         ...actions...\n\
         </weftArtifact>\n\
         \n\
         Inside the artifact, emit one action per file or command:\n\
         \n\
         - <weftAction type=\"file\" filePath=\"relative/path\">full file contents</weftAction>\n\
           Always emit the COMPLETE contents of the file. Never truncate, never use\n\
           placeholders like '// rest of the code remains the same'.\n\
         - <weftAction type=\"shell\">command to run</weftAction>\n\
           Commands run after all files exist. Never use commands that require\n\
           interactive input.\n\
         \n\
         Order matters: emit a file before anything that depends on it, and emit\n\
         package manifests before install commands.\n\
         </response_format>\n\
         \n\
         {BASE_PROMPT}\n"
    )
}
