use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend identifier; kept in whichever form the backend sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    Text(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::Text(s) => f.write_str(s),
        }
    }
}

/// Registered profile of the signed-in user.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: Id,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRoom {
    pub room_name: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub datetime: String,
    pub hosts: Vec<Id>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomData {
    pub id: Id,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub hosts: Vec<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    /// Prefer not to say.
    Pnts,
    Others,
}

impl Gender {
    pub const ALL: [Gender; 4] = [Gender::Male, Gender::Female, Gender::Pnts, Gender::Others];

    pub fn code(&self) -> &'static str {
        use Gender::*;
        match self {
            Male => "MALE",
            Female => "FEMALE",
            Pnts => "PNTS",
            Others => "OTHERS",
        }
    }

    pub fn label(&self) -> &'static str {
        use Gender::*;
        match self {
            Male => "男性",
            Female => "女性",
            Pnts => "答えない",
            Others => "その他",
        }
    }

    pub fn from_code(code: &str) -> Option<Gender> {
        Gender::ALL.into_iter().find(|g| g.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub date_of_birth: String,
    pub gender: Gender,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_keep_their_wire_form() {
        let room: RoomData = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(room.id, Id::Number(42));
        assert_eq!(room.id.to_string(), "42");

        let room: RoomData = serde_json::from_str(r#"{"id": "r-9", "hosts": [1, "u2"]}"#).unwrap();
        assert_eq!(room.id.to_string(), "r-9");
        assert_eq!(serde_json::to_string(&room.hosts).unwrap(), r#"[1,"u2"]"#);
    }

    #[test]
    fn gender_codes_match_the_wire_names() {
        for gender in Gender::ALL {
            let json = serde_json::to_string(&gender).unwrap();
            assert_eq!(json, format!("\"{}\"", gender.code()));
            assert_eq!(Gender::from_code(gender.code()), Some(gender));
        }
        assert_eq!(Gender::from_code("male"), None);
    }
}
