pub mod mapper;

pub use mapper::{SceneAssignment, SceneBoundary, SceneMapper};
