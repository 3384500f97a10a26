use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl Rider {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }
}
