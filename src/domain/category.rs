use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: OffsetDateTime,
}
