pub mod request;
pub mod session;

pub use request::{RenderError, RenderExercise, RenderRequest, RenderResponse, Renderer, SourceVideo};
pub use session::AuthoringSession;
