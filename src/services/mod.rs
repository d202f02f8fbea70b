// Services module
// Contains business logic separated by domain areas

pub mod merge; // Audio/video composition
pub mod script; // Narration script generation
pub mod tts; // Text-to-Speech services
pub mod video; // Stock video fetch

#[cfg(test)]
mod tests;
