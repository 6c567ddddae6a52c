use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: OffsetDateTime,
}
