pub mod cells;
pub mod code_extractor;
pub mod html_to_markdown;
pub mod markdown_renderer;
