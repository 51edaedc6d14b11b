//! HTML pages for the landing, repository and status routes

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;
use crate::feed::ProjectList;
use crate::github::Repository;
use crate::stats::StatsSnapshot;

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html")),
    ("projects.html", include_str!("../templates/projects.html")),
    ("repositories.html", include_str!("../templates/repositories.html")),
    ("status.html", include_str!("../templates/status.html")),
];

#[derive(Serialize)]
struct Build {
    status: String,
    console_url: String,
    time: String,
    name: String,
    label: String,
}

#[derive(Serialize)]
struct ProjectsContext {
    by_date: bool,
    builds: Vec<Build>,
}

#[derive(Serialize)]
struct RepositoriesContext<'a> {
    repositories: Vec<&'a str>,
}

#[derive(Serialize)]
struct StatRow {
    key: &'static str,
    value: String,
}

#[derive(Serialize)]
struct StatusContext {
    rows: Vec<StatRow>,
}

/// Compiled page templates. `.html` templates are autoescaped.
pub struct Pages {
    tera: Tera,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        Ok(self.tera.render(name, &Context::from_serialize(context)?)?)
    }

    /// Landing page: build list with a link to the other ordering.
    pub fn projects(&self, list: &ProjectList) -> Result<String> {
        let builds = list
            .projects
            .iter()
            .map(|p| Build {
                status: p.last_build_status.clone(),
                console_url: p.console_url(),
                time: p.build_time(),
                name: p.name.clone(),
                label: p.last_build_label.clone(),
            })
            .collect();
        self.render(
            "projects.html",
            &ProjectsContext {
                by_date: list.by_date(),
                builds,
            },
        )
    }

    pub fn repositories(&self, repos: &[Repository]) -> Result<String> {
        let repositories = repos.iter().map(|r| r.full_name.as_str()).collect();
        self.render("repositories.html", &RepositoriesContext { repositories })
    }

    pub fn status(&self, stats: &StatsSnapshot) -> Result<String> {
        let row = |key, value: String| StatRow { key, value };
        let rows = vec![
            row("Started", stats.started_at.format("%Y-%m-%d %H:%M").to_string()),
            row("Uptime (s)", stats.uptime_seconds.to_string()),
            row("Version", stats.version.to_string()),
            row("# Workers", stats.workers.to_string()),
            row("# Tasks", stats.alive_tasks.to_string()),
            row("1XX", stats.status_1xx.to_string()),
            row("2XX", stats.status_2xx.to_string()),
            row("3XX", stats.status_3xx.to_string()),
            row("4XX", stats.status_4xx.to_string()),
            row("5XX", stats.status_5xx.to_string()),
        ];
        self.render("status.html", &StatusContext { rows })
    }
}
