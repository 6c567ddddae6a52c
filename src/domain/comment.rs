use std::borrow::Borrow;

use time::OffsetDateTime;

use crate::domain::display_date;

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub is_published: bool,
    pub created_at: OffsetDateTime,
}

impl Comment {
    pub fn is_authored_by(&self, user_id: impl Borrow<i64>) -> bool {
        self.author_id == *user_id.borrow()
    }

    pub fn created_at_display(&self) -> String {
        display_date(self.created_at)
    }
}
