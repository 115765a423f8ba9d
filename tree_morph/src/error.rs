use thiserror::Error;

/// Anything that stops the application from starting or keeps a frame from
/// reaching the screen.  Gesture problems are not here: they degrade to a
/// status message and the UI buttons keep working.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid gesture settings: {0}")]
    Gesture(#[from] hand_signal::ConfigError),
    #[error("invalid scene settings: {0}")]
    Scene(#[from] morph_field::ConfigError),
    #[error("window: {0}")]
    Window(String),
}

impl From<minifb::Error> for AppError {
    fn from(e: minifb::Error) -> Self {
        AppError::Window(e.to_string())
    }
}
