use std::borrow::Borrow;

use time::OffsetDateTime;

use crate::domain::display_date;

const EXCERPT_WORDS: usize = 30;

#[derive(Debug, Clone)]
pub struct CategoryRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

#[derive(Debug, Clone)]
pub struct LocationRef {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub is_published: bool,
    pub created_at: OffsetDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub category: Option<CategoryRef>,
    pub location: Option<LocationRef>,
    pub comment_count: i64,
}

impl Post {
    /// Whether the post belongs in the public feeds at `now`: published, filed
    /// under a published category and not scheduled for the future.
    pub fn is_visible_at(&self, now: OffsetDateTime) -> bool {
        let category_published = self
            .category
            .as_ref()
            .map(|category| category.is_published)
            .unwrap_or(false);
        self.is_published && category_published && self.pub_date < now
    }

    /// Hidden posts are still viewable by their author.
    pub fn is_viewable_by(&self, viewer_id: Option<i64>, now: OffsetDateTime) -> bool {
        self.is_visible_at(now) || viewer_id == Some(self.author_id)
    }

    /// Takes the id by value or by reference; templates pass references.
    pub fn is_authored_by(&self, user_id: impl Borrow<i64>) -> bool {
        self.author_id == *user_id.borrow()
    }

    /// Leading words of the text for feed cards, with an ellipsis when cut.
    pub fn excerpt(&self) -> String {
        let mut words = self.text.split_whitespace();
        let mut excerpt = words.by_ref().take(EXCERPT_WORDS).collect::<Vec<_>>().join(" ");
        if words.next().is_some() {
            excerpt.push_str(" …");
        }
        excerpt
    }

    pub fn pub_date_display(&self) -> String {
        display_date(self.pub_date)
    }

    pub fn category_title(&self) -> &str {
        self.category
            .as_ref()
            .map(|category| category.title.as_str())
            .unwrap_or("")
    }

    /// Slug of the category when it is published, so templates only link to live category pages.
    pub fn category_slug(&self) -> &str {
        match &self.category {
            Some(category) if category.is_published => category.slug.as_str(),
            _ => "",
        }
    }

    /// Location name, or empty when there is none or it is hidden.
    pub fn location_name(&self) -> &str {
        match &self.location {
            Some(location) if location.is_published => location.name.as_str(),
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn post(is_published: bool, category_published: Option<bool>, offset: Duration) -> Post {
        let now = OffsetDateTime::now_utc();
        Post {
            id: 5,
            title: "Sunrise".to_string(),
            text: "Over the hills".to_string(),
            pub_date: now + offset,
            is_published,
            created_at: now,
            author_id: 7,
            author_username: "author".to_string(),
            category: category_published.map(|is_published| CategoryRef {
                id: 1,
                title: "Travel".to_string(),
                slug: "travel".to_string(),
                is_published,
            }),
            location: None,
            comment_count: 0,
        }
    }

    #[test]
    fn published_past_post_in_published_category_is_visible() {
        let post = post(true, Some(true), Duration::hours(-1));
        assert!(post.is_visible_at(OffsetDateTime::now_utc()));
    }

    #[test]
    fn each_condition_hides_the_post() {
        let now = OffsetDateTime::now_utc();
        assert!(!post(false, Some(true), Duration::hours(-1)).is_visible_at(now));
        assert!(!post(true, Some(false), Duration::hours(-1)).is_visible_at(now));
        assert!(!post(true, None, Duration::hours(-1)).is_visible_at(now));
        assert!(!post(true, Some(true), Duration::hours(1)).is_visible_at(now));
    }

    #[test]
    fn author_can_view_hidden_post() {
        let now = OffsetDateTime::now_utc();
        let future = post(true, Some(true), Duration::hours(1));
        assert!(future.is_viewable_by(Some(7), now));
        assert!(!future.is_viewable_by(Some(8), now));
        assert!(!future.is_viewable_by(None, now));
    }

    #[test]
    fn excerpt_cuts_long_text() {
        let mut post = post(true, Some(true), Duration::hours(-1));
        assert_eq!(post.excerpt(), "Over the hills");

        post.text = (1..=40).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let excerpt = post.excerpt();
        assert!(excerpt.starts_with("1 2 3"));
        assert!(excerpt.ends_with("30 …"));
    }

    #[test]
    fn hidden_location_and_category_are_not_linked() {
        let mut post = post(true, Some(false), Duration::hours(-1));
        post.location = Some(LocationRef {
            id: 3,
            name: "Moscow".to_string(),
            is_published: false,
        });
        assert_eq!(post.category_slug(), "");
        assert_eq!(post.category_title(), "Travel");
        assert_eq!(post.location_name(), "");
    }
}
