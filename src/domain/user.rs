use time::OffsetDateTime;

use crate::domain::display_date;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: OffsetDateTime,
}

impl User {
    /// First and last name joined, falling back to the username when both are blank.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub fn date_joined_display(&self) -> String {
        display_date(self.date_joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first_name: &str, last_name: &str) -> User {
        User {
            id: 1,
            username: "leo".to_string(),
            email: String::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_joined: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn full_name_joins_names() {
        assert_eq!(user("Lev", "Tolstoy").full_name(), "Lev Tolstoy");
        assert_eq!(user("Lev", "").full_name(), "Lev");
    }

    #[test]
    fn full_name_falls_back_to_username() {
        assert_eq!(user(" ", "").full_name(), "leo");
    }
}
