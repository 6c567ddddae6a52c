/// Posts shown per page on every feed.
pub const POSTS_PER_PAGE: i64 = 10;

/// Page selector taken from the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(i64),
    Last,
}

impl PageNumber {
    /// Missing parameter means the first page. Returns `None` for values that
    /// are neither an integer nor `last`.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => Some(Self::Number(1)),
            Some("last") => Some(Self::Last),
            Some(value) => value.parse::<i64>().ok().map(Self::Number),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(total: i64, per_page: i64) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Never below one, so an empty listing still has a first page.
    pub fn num_pages(&self) -> i64 {
        ((self.total + self.per_page - 1) / self.per_page).max(1)
    }

    /// Resolves the requested page to a concrete page number within bounds.
    pub fn resolve(&self, page: PageNumber) -> Option<i64> {
        let number = match page {
            PageNumber::Last => self.num_pages(),
            PageNumber::Number(number) => number,
        };
        (1..=self.num_pages()).contains(&number).then_some(number)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn next_number(&self) -> i64 {
        self.number + 1
    }

    pub fn previous_number(&self) -> i64 {
        self.number - 1
    }
}
