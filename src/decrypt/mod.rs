//! Decrypt-and-extract pipeline
//!
//! Mirrors an encrypted tree into an output directory: `*.gpg` files are
//! decrypted with the suffix stripped, everything else is copied, and any
//! resulting archive is unpacked next to itself and removed.

pub mod archive;
pub mod gpg;
pub mod pipeline;
pub mod secret;

pub use archive::{archive_kind, handle_archive, ArchiveKind};
pub use gpg::GpgDecryptor;
pub use pipeline::{check_output_outside, DecryptPipeline};
pub use secret::{prompt_secret, read_secret};

// vim: ts=4
