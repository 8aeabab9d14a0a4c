use serde::{Deserialize, Serialize};

/// Notification sent by the image registry when a tag is pushed.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PushEvent {
    #[serde(default)]
    pub callback_url: String,
    pub repository: Repository,
    #[serde(rename = "push_data")]
    pub pushed_data: PushedData,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Repository {
    pub repo_name: String,
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PushedData {
    pub tag: String,
    #[serde(default)]
    pub pushed_at: u64,
}

impl PushEvent {
    pub fn repo_name(&self) -> &str {
        &self.repository.repo_name
    }

    pub fn tag(&self) -> &str {
        &self.pushed_data.tag
    }
}
