//! These models represent the values passed between the normalizer, the
//! transcript and the remote provider.
//!
//! Uploaded files come in as [`upload::UploadedFile`] and leave the normalizer
//! as a list of [`content::ContentPart`]. Providers convert those parts into
//! their own wire format; the rest of the crate never sees provider JSON.
pub mod content;
pub mod entry;
pub mod speaker;
pub mod upload;
