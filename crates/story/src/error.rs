use foundation::ids::ChapterId;
use formats::ManifestError;

/// Failure reported by a map or chart surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    UnknownLayer(String),
    UnknownHandle(u64),
    Rejected(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::UnknownLayer(id) => write!(f, "unknown layer {id}"),
            SurfaceError::UnknownHandle(h) => write!(f, "unknown visual handle {h}"),
            SurfaceError::Rejected(reason) => write!(f, "surface rejected call: {reason}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Failure raised by a chapter lifecycle hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    Surface(SurfaceError),
    Failed(String),
}

impl std::fmt::Display for HookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookError::Surface(e) => write!(f, "hook surface call failed: {e}"),
            HookError::Failed(reason) => write!(f, "hook failed: {reason}"),
        }
    }
}

impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HookError::Surface(e) => Some(e),
            HookError::Failed(_) => None,
        }
    }
}

impl From<SurfaceError> for HookError {
    fn from(e: SurfaceError) -> Self {
        HookError::Surface(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoryError {
    UnknownChapter(ChapterId),
    DuplicateChapter(ChapterId),
    Manifest(ManifestError),
}

impl std::fmt::Display for StoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoryError::UnknownChapter(id) => write!(f, "no chapter registered as {id}"),
            StoryError::DuplicateChapter(id) => write!(f, "chapter {id} registered twice"),
            StoryError::Manifest(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoryError::Manifest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ManifestError> for StoryError {
    fn from(e: ManifestError) -> Self {
        StoryError::Manifest(e)
    }
}
