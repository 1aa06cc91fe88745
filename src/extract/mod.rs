//! Text and email extraction
//!
//! Pure functions over strings; nothing here touches a render session.

mod emails;
mod text;

pub use emails::{classify_context, extract_emails, scan_into_registry, EmailFinding, EmailScan};
pub use text::{clean_optional_text, clean_text};
