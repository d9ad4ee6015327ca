/// Screens the flow can move to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Camera capture screen, reached after the intake form
    Camera,
    /// Demographics selection screen, carrying the serialized analysis result
    Select { data: String },
    /// Previous screen
    Back,
}

/// Router owned by the UI shell.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Shown when leaving the capture screen would silently discard a photo.
pub const CONFIRM_BEFORE_LEAVING: &str =
    "Please confirm or retake the photo first by using the buttons on screen.";
