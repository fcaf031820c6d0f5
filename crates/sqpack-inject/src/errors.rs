use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("No {what} path given and no sqpack_path configured")]
    #[diagnostic(
        code(config::sqpack_path_missing),
        help("Pass the path explicitly, or run 'sqpack-inject config set-sqpack-path <path>' (or 'config auto-detect')")
    )]
    SqpackPathMissing { what: &'static str },

    #[error("File not found: {path}")]
    #[diagnostic(
        code(file::not_found),
        help("Make sure the file exists and the path is correct")
    )]
    FileNotFound { path: PathBuf },

    #[error("Invalid sqpack directory: {path}")]
    #[diagnostic(
        code(config::invalid_sqpack_path),
        help("The path must point to the game's 'sqpack' directory, which contains 'ffxiv/000000.win32.index'")
    )]
    InvalidSqpackPath { path: PathBuf },

    #[error("Mod target not found in index: {path}")]
    #[diagnostic(
        code(patch::unresolved_target),
        help("The mod package was built for a different archive or game version. Check the --archive/--index arguments")
    )]
    UnresolvedTarget { path: String },
}

impl CliError {
    pub fn sqpack_path_missing(what: &'static str) -> Self {
        Self::SqpackPathMissing { what }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn invalid_sqpack_path(path: PathBuf) -> Self {
        Self::InvalidSqpackPath { path }
    }

    pub fn unresolved_target(path: String) -> Self {
        Self::UnresolvedTarget { path }
    }
}
