//! CCTray build feed: decoding and ordering

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::DeError;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// One build job's last-known status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    #[serde(rename = "@webUrl", default)]
    pub web_url: String,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@lastBuildLabel", default)]
    pub last_build_label: String,
    #[serde(rename = "@lastBuildTime", deserialize_with = "deserialize_build_time")]
    pub last_build_time: DateTime<Utc>,
    #[serde(rename = "@lastBuildStatus", default)]
    pub last_build_status: String,
    #[serde(rename = "@activity", default)]
    pub activity: String,
}

impl Project {
    /// Build time as `YYYY-MM-DD HH:MM`.
    pub fn build_time(&self) -> String {
        self.last_build_time.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn console_url(&self) -> String {
        format!("{}{}/console", self.web_url, self.last_build_label)
    }
}

/// Sort order applied to a project list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Most recent first, status breaks ties.
    Date,
    /// Status ascending, most recent first within a status.
    #[default]
    Status,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Date => "date",
            Order::Status => "status",
        }
    }

    /// Any value other than `date` selects status ordering.
    pub fn from_query(value: Option<&str>) -> Self {
        value.map(Order::from).unwrap_or_default()
    }
}

impl From<&str> for Order {
    fn from(value: &str) -> Self {
        match value {
            "date" => Order::Date,
            _ => Order::Status,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded feed plus the order actually applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectList {
    pub projects: Vec<Project>,
    pub order: Order,
}

impl ProjectList {
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn by_date(&self) -> bool {
        self.order == Order::Date
    }

    /// Reorders the list in place and records the order used.
    ///
    /// Status compares as raw strings, so "Failure" < "Success" < "Unknown"
    /// alphabetically rather than by severity. Times compare in whole seconds.
    /// The sort is stable, so entries equal on both keys keep their feed order.
    pub fn sort_by(&mut self, order: Order) {
        match order {
            Order::Date => self.projects.sort_by(|a, b| {
                b.last_build_time
                    .timestamp()
                    .cmp(&a.last_build_time.timestamp())
                    .then_with(|| a.last_build_status.cmp(&b.last_build_status))
            }),
            Order::Status => self.projects.sort_by(|a, b| {
                a.last_build_status
                    .cmp(&b.last_build_status)
                    .then_with(|| {
                        b.last_build_time
                            .timestamp()
                            .cmp(&a.last_build_time.timestamp())
                    })
            }),
        }
        self.order = order;
    }
}

#[derive(Debug, Deserialize)]
struct TrayFeed {
    #[serde(rename = "Project", default)]
    projects: Vec<Project>,
}

const ROOT_ELEMENT: &str = "Projects";

/// Name of the document's first element.
fn root_element(xml: &str) -> Result<String, DeError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Event::Eof => return Err(DeError::Custom("no root element".to_string())),
            _ => {}
        }
    }
}

/// Decodes a CCTray document. Truncated or malformed input, or a root other
/// than `<Projects>`, is an error.
pub fn read_tray_feed(xml: &str) -> Result<ProjectList, DeError> {
    let root = root_element(xml)?;
    if root != ROOT_ELEMENT {
        return Err(DeError::Custom(format!(
            "expected <{}> root element, found <{}>",
            ROOT_ELEMENT, root
        )));
    }
    let feed: TrayFeed = quick_xml::de::from_str(xml)?;
    Ok(ProjectList {
        projects: feed.projects,
        order: Order::default(),
    })
}

impl FromStr for ProjectList {
    type Err = DeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        read_tray_feed(s)
    }
}

/// Accepts RFC 3339, Jenkins' `+0000` offsets, and zone-less times as UTC.
pub fn parse_build_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_build_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_build_time(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid lastBuildTime '{}'", raw)))
}
