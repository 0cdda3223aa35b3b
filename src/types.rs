//! Common types and data structures

use serde::{Deserialize, Serialize};

/// Skill level hint sent with every request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 3] = [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
        }
    }
}

/// Handler categories; each one carries its own request token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Run,
    Debug,
    Comment,
    Analyze,
    CommentLine,
}

impl ActionKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            ActionKind::Run => "/run-code",
            ActionKind::Debug => "/debug",
            ActionKind::Comment | ActionKind::Analyze => "/comment",
            ActionKind::CommentLine => "/comment-line",
        }
    }
}

/// Body of every POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    pub level: SkillLevel,
}

/// `/run-code` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunResponse {
    pub output: Option<String>,
    pub error: Option<String>,
    pub fixed_code: Option<String>,
}

/// `/debug` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DebugResponse {
    pub fixed_code: Option<String>,
    pub error: Option<String>,
    pub explanation: Option<String>,
    pub suggestion: Option<String>,
}

/// Per-function comment returned by `/comment`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionComment {
    pub name: String,
    pub comment: String,
    #[serde(default)]
    pub level: Option<String>,
}

/// `/comment` and `/comment-line` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentResponse {
    pub comment: String,
    #[serde(default)]
    pub functions: Vec<FunctionComment>,
    #[serde(default)]
    pub voice_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
