use std::path::Path;

use super::types::OperationOutcome;
use crate::task::{FileAction, FileOperation};

/// Apply one validated file operation through the local filesystem.
/// Callers run `FileOperation::validate` first; this function still
/// degrades to a failed outcome instead of panicking on bad input.
pub async fn apply_file_operation(op: &FileOperation) -> OperationOutcome {
    let started = std::time::Instant::now();
    let source = Path::new(&op.source_path);

    let result = match op.operation {
        FileAction::Create => create_file(source, op.content.as_deref().unwrap_or("")).await,
        FileAction::Delete => delete_path(source).await,
        FileAction::Move | FileAction::Copy => {
            let target = match op.target_path.as_deref() {
                Some(t) if !t.trim().is_empty() => t,
                _ => {
                    return OperationOutcome::failed(
                        format!("file {} failed", op.operation),
                        "target_path missing",
                    )
                }
            };
            if op.operation == FileAction::Move {
                tokio::fs::rename(source, target).await
            } else {
                tokio::fs::copy(source, target).await.map(|_| ())
            }
        }
    };

    match result {
        Ok(()) => OperationOutcome::ok(format!("file {} {}", op.operation, op.source_path))
            .with_duration(started),
        Err(err) => OperationOutcome::failed(format!("file {} failed", op.operation), err.to_string())
            .with_duration(started),
    }
}

async fn create_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, content).await
}

async fn delete_path(path: &Path) -> std::io::Result<()> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}
