//! Pipeline stages for printing an article as PDF.
//!
//! Each submodule implements one step. Only [`render`] talks to the outside
//! world; every other stage is a pure function and tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! article HTML ──▶ normalize ──▶ metadata ──▶ render ──▶ filename
//!                  (regex)       (request)    (renderer)  (download name)
//! ```
//!
//! 1. [`normalize`] — ordered regex passes that make CMS markup printable
//! 2. [`metadata`]  — title, keywords, language and author for the PDF
//! 3. [`render`]    — the renderer boundary: [`render::PdfRenderer`] and the
//!    external-program implementation
//! 4. [`filename`]  — standardized, filesystem-safe download name

pub mod filename;
pub mod metadata;
pub mod normalize;
pub mod render;
