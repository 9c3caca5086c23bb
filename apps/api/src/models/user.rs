use serde::{Deserialize, Serialize};

use crate::models::character::RecordId;

/// A user account as known to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
}

/// Profile handed over by the identity provider at sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}
