use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    /// Kept unchanged when absent or blank.
    #[serde(default)]
    pub password: Option<String>,
}
