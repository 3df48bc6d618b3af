//! Project commands.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Result, anyhow};
use tf_core::{NewProject, Project, ProjectId};
use tf_db::Database;

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    color: Option<String>,
) -> Result<()> {
    let project = db.create_project(NewProject {
        name: name.to_string(),
        color,
    })?;
    writeln!(writer, "Created project {} ({})", project.name, project.id)?;
    Ok(())
}

/// Renames a project or changes its color. `color` of `Some(None)` clears it.
pub fn edit<W: Write>(
    writer: &mut W,
    db: &mut Database,
    id: &ProjectId,
    name: Option<String>,
    color: Option<Option<String>>,
) -> Result<()> {
    let current = db
        .get_project(id)?
        .ok_or_else(|| anyhow!("project not found: {id}"))?;
    let project = db.update_project(
        id,
        NewProject {
            name: name.unwrap_or(current.name),
            color: color.unwrap_or(current.color),
        },
    )?;
    writeln!(writer, "Updated project {} ({})", project.name, project.id)?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: &ProjectId) -> Result<()> {
    if !db.delete_project(id)? {
        return Err(anyhow!("project not found: {id}"));
    }
    writeln!(writer, "Deleted project {id}")?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let projects = db.list_projects()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&projects)?)?;
    } else {
        write!(writer, "{}", format_projects(&projects))?;
    }
    Ok(())
}

/// Formats projects as an aligned table.
pub fn format_projects(projects: &[Project]) -> String {
    let mut output = String::new();
    if projects.is_empty() {
        output.push_str("No projects.\n");
        return output;
    }
    let _ = writeln!(output, "{:<36}  {:<20}  Color", "ID", "Name");
    for project in projects {
        let _ = writeln!(
            output,
            "{:<36}  {:<20}  {}",
            project.id,
            project.name,
            project.color.as_deref().unwrap_or("-")
        );
    }
    output
}
