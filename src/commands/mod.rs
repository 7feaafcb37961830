pub mod classify;
pub mod entities;
pub mod extract;
pub mod pdf_text;
pub mod pipeline;
pub mod score;
pub mod segment;
pub mod status;
pub mod survey;
