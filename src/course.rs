//! Courses, shared between the course service and the checklist backend

use csscolorparser::Color;
use serde::{Deserialize, Serialize};

/// The key of a course, in both the course service and the checklist backend
pub type CourseId = u64;

/// A monitored course.
///
/// Its nickname and color are only used by checklist backends (e.g. as the title and color of a note), never by the reconciliation engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub nickname: String,
    #[serde(default = "default_color")]
    pub color: Color,
}

impl Course {
    pub fn new<S: ToString>(id: CourseId, nickname: S, color: Color) -> Self {
        Self { id, nickname: nickname.to_string(), color }
    }
}

fn default_color() -> Color {
    Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
}
