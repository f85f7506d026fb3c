use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::query::SortDirection;
use crate::domain::DomainError;

/// Every list page of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Test,
    Question,
    TestSeries,
    Course,
    Student,
    Video,
    StudyMaterial,
    Webinar,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Test,
        ResourceKind::Question,
        ResourceKind::TestSeries,
        ResourceKind::Course,
        ResourceKind::Student,
        ResourceKind::Video,
        ResourceKind::StudyMaterial,
        ResourceKind::Webinar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Test => "test",
            ResourceKind::Question => "question",
            ResourceKind::TestSeries => "test-series",
            ResourceKind::Course => "course",
            ResourceKind::Student => "student",
            ResourceKind::Video => "video",
            ResourceKind::StudyMaterial => "study-material",
            ResourceKind::Webinar => "webinar",
        }
    }

    /// Human label used in toasts
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Test => "Test",
            ResourceKind::Question => "Question",
            ResourceKind::TestSeries => "Test series",
            ResourceKind::Course => "Course",
            ResourceKind::Student => "Student",
            ResourceKind::Video => "Video",
            ResourceKind::StudyMaterial => "Study material",
            ResourceKind::Webinar => "Webinar",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized || kind.as_str() == singular)
            .ok_or_else(|| DomainError::UnknownResourceKind(s.to_string()))
    }
}

/// How a sortable field compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKind {
    /// Natural, case-insensitive ordering ("Ch2" before "Ch10")
    Text,
    Numeric,
    /// RFC 3339 timestamps
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub key: String,
    pub path: String,
    pub kind: SortKind,
}

impl SortField {
    pub fn new(key: &str, kind: SortKind) -> Self {
        Self::at(key, key, kind)
    }

    pub fn at(key: &str, path: &str, kind: SortKind) -> Self {
        Self {
            key: key.to_string(),
            path: path.to_string(),
            kind,
        }
    }
}

/// A facet name and the record field it filters on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetField {
    pub name: String,
    pub path: String,
}

impl FacetField {
    pub fn new(name: &str) -> Self {
        Self::at(name, name)
    }

    pub fn at(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Field selectors and gateway routing for one list page.
///
/// This is the only per-page configuration a list controller needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    pub kind: ResourceKind,
    /// REST collection path, relative to the API base
    pub endpoint: String,
    /// Key the list payload keeps its records under
    pub items_key: String,
    pub searchable_fields: Vec<String>,
    pub facet_fields: Vec<FacetField>,
    pub sortable_fields: Vec<SortField>,
    /// Fields a create draft must carry (non-empty)
    pub required_fields: Vec<String>,
    pub default_sort: Option<(String, SortDirection)>,
}

impl ResourceProfile {
    pub fn new(kind: ResourceKind, endpoint: &str, items_key: &str) -> Self {
        Self {
            kind,
            endpoint: endpoint.to_string(),
            items_key: items_key.to_string(),
            searchable_fields: Vec::new(),
            facet_fields: Vec::new(),
            sortable_fields: Vec::new(),
            required_fields: Vec::new(),
            default_sort: None,
        }
    }

    pub fn searchable(mut self, fields: &[&str]) -> Self {
        self.searchable_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn facets(mut self, facets: Vec<FacetField>) -> Self {
        self.facet_fields = facets;
        self
    }

    pub fn sortable(mut self, fields: Vec<SortField>) -> Self {
        self.sortable_fields = fields;
        self
    }

    pub fn required(mut self, fields: &[&str]) -> Self {
        self.required_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn default_sort(mut self, key: &str, direction: SortDirection) -> Self {
        self.default_sort = Some((key.to_string(), direction));
        self
    }

    /// Field path a facet filters on. Unknown facets filter on a field of the same name.
    pub fn facet_path<'a>(&'a self, facet: &'a str) -> &'a str {
        self.facet_fields
            .iter()
            .find(|f| f.name == facet)
            .map(|f| f.path.as_str())
            .unwrap_or(facet)
    }

    pub fn sort_field(&self, key: &str) -> Option<&SortField> {
        self.sortable_fields.iter().find(|f| f.key == key)
    }

    /// Built-in profile for a dashboard page
    pub fn for_kind(kind: ResourceKind) -> Self {
        use SortKind::{Date, Numeric, Text};

        match kind {
            ResourceKind::Test => Self::new(kind, "/tests", "tests")
                .searchable(&["title", "subject", "topic"])
                .facets(vec![
                    FacetField::new("subject"),
                    FacetField::new("difficulty"),
                    FacetField::at("course", "course._id"),
                ])
                .sortable(vec![
                    SortField::new("title", Text),
                    SortField::new("duration", Numeric),
                    SortField::new("totalMarks", Numeric),
                    SortField::new("createdAt", Date),
                ])
                .required(&["title", "subject"])
                .default_sort("createdAt", SortDirection::Desc),
            ResourceKind::Question => Self::new(kind, "/questions", "questions")
                .searchable(&["question", "subject", "topic"])
                .facets(vec![
                    FacetField::new("subject"),
                    FacetField::new("topic"),
                    FacetField::new("difficulty"),
                ])
                .sortable(vec![
                    SortField::new("question", Text),
                    SortField::new("marks", Numeric),
                    SortField::new("createdAt", Date),
                ])
                .required(&["question", "subject"]),
            ResourceKind::TestSeries => Self::new(kind, "/test-series", "testSeries")
                .searchable(&["title", "description"])
                .facets(vec![
                    FacetField::at("course", "course._id"),
                    FacetField::new("status"),
                ])
                .sortable(vec![
                    SortField::new("title", Text),
                    SortField::new("price", Numeric),
                    SortField::new("createdAt", Date),
                ])
                .required(&["title"])
                .default_sort("createdAt", SortDirection::Desc),
            ResourceKind::Course => Self::new(kind, "/courses", "courses")
                .searchable(&["title", "description", "category"])
                .facets(vec![FacetField::new("category"), FacetField::new("status")])
                .sortable(vec![
                    SortField::new("title", Text),
                    SortField::new("price", Numeric),
                    SortField::new("createdAt", Date),
                ])
                .required(&["title", "category"]),
            ResourceKind::Student => Self::new(kind, "/students", "students")
                .searchable(&["name", "email", "phone"])
                .facets(vec![
                    FacetField::at("course", "courses"),
                    FacetField::new("batch"),
                ])
                .sortable(vec![
                    SortField::new("name", Text),
                    SortField::new("createdAt", Date),
                ])
                .required(&["name", "email"])
                .default_sort("name", SortDirection::Asc),
            ResourceKind::Video => Self::new(kind, "/videos", "videos")
                .searchable(&["title", "description", "course.title"])
                .facets(vec![FacetField::at("course", "course._id")])
                .sortable(vec![
                    SortField::new("title", Text),
                    SortField::new("duration", Numeric),
                    SortField::new("createdAt", Date),
                ])
                .required(&["title"]),
            ResourceKind::StudyMaterial => Self::new(kind, "/study-materials", "materials")
                .searchable(&["title", "subject", "description"])
                .facets(vec![FacetField::new("subject"), FacetField::new("type")])
                .sortable(vec![
                    SortField::new("title", Text),
                    SortField::new("createdAt", Date),
                ])
                .required(&["title", "subject"]),
            ResourceKind::Webinar => Self::new(kind, "/webinars", "webinars")
                .searchable(&["title", "description", "instructor"])
                .facets(vec![FacetField::new("status")])
                .sortable(vec![
                    SortField::new("title", Text),
                    SortField::new("scheduledAt", Date),
                ])
                .required(&["title", "scheduledAt"])
                .default_sort("scheduledAt", SortDirection::Asc),
        }
    }
}
